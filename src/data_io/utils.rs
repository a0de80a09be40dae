/// Utility functions for NetCDF variable metadata

/// Artifact variables in VIC forcing column order
pub const FORCING_VARS: &[&str] = &["precip", "t2m", "avg_sdswrf", "avg_sdlwrf", "sp", "vp", "w10"];

/// Units of a normalized artifact variable
pub fn get_variable_units(variable_name: &str) -> String {
    match variable_name {
        "precip" => "mm".to_string(),
        "t2m" => "degC".to_string(),
        "avg_sdswrf" | "avg_sdlwrf" => "W m-2".to_string(),
        "sp" | "vp" => "kPa".to_string(),
        "w10" => "m/s".to_string(),
        _ => "unknown".to_string(),
    }
}

/// Long name of a normalized artifact variable
pub fn get_long_name(variable_name: &str) -> String {
    match variable_name {
        "precip" => "6-hourly precipitation".to_string(),
        "t2m" => "2 metre temperature".to_string(),
        "avg_sdswrf" => "Mean surface downward short-wave radiation flux".to_string(),
        "avg_sdlwrf" => "Mean surface downward long-wave radiation flux".to_string(),
        "sp" => "Surface pressure".to_string(),
        "vp" => "Vapor pressure".to_string(),
        "w10" => "10m wind speed".to_string(),
        other => other.to_string(),
    }
}

/// Units a raw source variable is expected to carry
pub fn expected_source_units(variable_name: &str) -> Option<&'static str> {
    match variable_name {
        "sp" => Some("Pa"),
        "t2m" | "d2m" => Some("K"),
        "u10" | "v10" => Some("m s**-1"),
        "avg_sdswrf" | "avg_sdlwrf" => Some("W m**-2"),
        "precip" => Some("mm/day"),
        _ => None,
    }
}

/// Compare unit strings, ignoring the many spellings of the same unit
pub fn units_match(found: &str, expected: &str) -> bool {
    normalize_units(found) == normalize_units(expected)
}

fn normalize_units(units: &str) -> String {
    let compact: String = units
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '*' && *c != '^')
        .collect::<String>()
        .to_ascii_lowercase();
    match compact.as_str() {
        "kelvin" | "k" => "k".to_string(),
        "ms-1" | "m/s" => "m/s".to_string(),
        "wm-2" | "w/m2" => "w/m2".to_string(),
        "mm/day" | "mmday-1" | "mm/d" => "mm/day".to_string(),
        "pa" | "pascal" => "pa".to_string(),
        _ => compact,
    }
}

/// Check if a dimension name denotes time
pub fn is_time_dim(name: &str) -> bool {
    matches!(name, "time" | "valid_time" | "Time" | "t")
}

/// Check if a dimension name denotes latitude
pub fn is_lat_dim(name: &str) -> bool {
    matches!(name, "latitude" | "lat" | "y")
}

/// Check if a dimension name denotes longitude
pub fn is_lon_dim(name: &str) -> bool {
    matches!(name, "longitude" | "lon" | "x")
}

/// Validate the shape of a gridded variable.
/// Expected order: [time, latitude, longitude]
pub fn validate_grid_dimensions(names: &[String], shape: &[usize]) -> Result<(), String> {
    if shape.len() != 3 {
        return Err(format!(
            "Expected 3 dimensions (time, latitude, longitude), got {:?}",
            names
        ));
    }
    if !is_time_dim(&names[0]) || !is_lat_dim(&names[1]) || !is_lon_dim(&names[2]) {
        return Err(format!(
            "Expected dimensions ordered (time, latitude, longitude), got {:?}",
            names
        ));
    }
    if shape[1] == 0 || shape[2] == 0 {
        return Err("Spatial dimensions must be greater than 0".to_string());
    }
    Ok(())
}
