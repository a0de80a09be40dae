use num_traits::Float;

/// 0 °C in kelvin
pub const KELVIN_OFFSET: f64 = 273.15;
/// Pa per kPa
pub const PA_PER_KPA: f64 = 1000.0;

// Magnus coefficients over water, vapor pressure in hPa
const MAGNUS_E0: f64 = 6.112;
const MAGNUS_A: f64 = 17.62;
const MAGNUS_B: f64 = 243.12;
const HPA_PER_KPA: f64 = 10.0;

/// Surface pressure from Pa to kPa
pub fn pa_to_kpa<T: Float>(pressure: T) -> T {
    pressure / T::from(PA_PER_KPA).unwrap_or_else(T::nan)
}

/// Temperature from K to °C
pub fn kelvin_to_celsius<T: Float>(temperature: T) -> T {
    temperature - T::from(KELVIN_OFFSET).unwrap_or_else(T::nan)
}

/// Actual vapor pressure (kPa) from dew-point temperature in °C.
///
/// Magnus form `6.112 * exp(17.62 T / (T + 243.12)) / 10`. The pole at
/// `T = -243.12` yields NaN.
pub fn vapor_pressure_kpa(dew_point_celsius: f64) -> f64 {
    let denominator = dew_point_celsius + MAGNUS_B;
    if denominator == 0.0 {
        return f64::NAN;
    }
    MAGNUS_E0 * (MAGNUS_A * dew_point_celsius / denominator).exp() / HPA_PER_KPA
}

/// Vapor pressure (kPa) straight from ERA5 `d2m` in kelvin
pub fn vapor_pressure_from_dewpoint_k(dew_point_kelvin: f64) -> f64 {
    vapor_pressure_kpa(kelvin_to_celsius(dew_point_kelvin))
}

/// Horizontal wind speed from its eastward and northward components
pub fn wind_speed<T: Float>(u: T, v: T) -> T {
    (u * u + v * v).sqrt()
}
