use super::{InputGroup, NormalizeError, Transform, UnitSpec};
use crate::config::Config;
use crate::data_io::common::{artifact_path, chirps_inputs, era5_inputs};
use std::fmt;
use std::str::FromStr;

/// A normalization unit as named on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    AtmospherePressure,
    Precipitation,
    Radiation,
    Temperature,
    VaporPressure,
    WindSpeed,
}

impl Unit {
    pub const ALL: [Unit; 6] = [
        Unit::AtmospherePressure,
        Unit::Precipitation,
        Unit::Radiation,
        Unit::Temperature,
        Unit::VaporPressure,
        Unit::WindSpeed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Unit::AtmospherePressure => "atmosphere_pressure",
            Unit::Precipitation => "precipitation",
            Unit::Radiation => "radiation",
            Unit::Temperature => "temperature",
            Unit::VaporPressure => "vapor_pressure",
            Unit::WindSpeed => "wind_speed",
        }
    }

    /// Passes making up this unit. Radiation yields two, one per band.
    pub fn specs(&self, config: &Config) -> Vec<UnitSpec> {
        match self {
            Unit::AtmospherePressure => vec![era5_spec(
                config,
                "atmosphere_pressure",
                &["sp"],
                Transform::PaToKpa,
                "sp",
            )],
            Unit::Precipitation => vec![UnitSpec {
                inputs: vec![InputGroup::new("precip", chirps_inputs(config))],
                transform: Transform::DailyToSubDaily,
                output: "precip".to_string(),
                output_path: artifact_path(config, "precip"),
                shift_time_zone: false,
                crop_margin: Some(config.precip_crop_margin),
                compress: false,
            }],
            Unit::Radiation => vec![
                era5_spec(config, "radiation", &["sdswrf"], Transform::Passthrough, "avg_sdswrf"),
                era5_spec(config, "radiation", &["sdlwrf"], Transform::Passthrough, "avg_sdlwrf"),
            ],
            Unit::Temperature => vec![era5_spec(
                config,
                "temperature",
                &["t2m"],
                Transform::KelvinToCelsius,
                "t2m",
            )],
            Unit::VaporPressure => vec![era5_spec(
                config,
                "temperature",
                &["d2m"],
                Transform::VaporPressure,
                "vp",
            )],
            Unit::WindSpeed => vec![era5_spec(
                config,
                "wind_speed",
                &["u10", "v10"],
                Transform::WindSpeed,
                "w10",
            )],
        }
    }
}

/// ERA5 pass: files are named by the short name, the variable inside keeps
/// the `avg_` prefix for the radiation means.
fn era5_spec(config: &Config, category: &str, files: &[&str], transform: Transform, output: &str) -> UnitSpec {
    let inputs = files
        .iter()
        .map(|short| {
            let variable = match *short {
                "sdswrf" | "sdlwrf" => format!("avg_{}", short),
                other => other.to_string(),
            };
            InputGroup::new(&variable, era5_inputs(config, category, short))
        })
        .collect();

    UnitSpec {
        inputs,
        transform,
        output: output.to_string(),
        output_path: artifact_path(config, output),
        shift_time_zone: true,
        crop_margin: None,
        compress: true,
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Unit {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Unit::ALL
            .into_iter()
            .find(|u| u.name() == s)
            .ok_or_else(|| NormalizeError::UnknownUnit(s.to_string()))
    }
}
