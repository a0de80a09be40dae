/// File naming shared by the normalization and extraction stages
use crate::config::{Config, Epoch};
use std::path::PathBuf;

/// ERA5 download for one variable and epoch, e.g. `era5_t2m_2004-2012.nc`
pub fn era5_filename(variable: &str, epoch: &Epoch) -> String {
    format!("era5_{}_{}.nc", variable, epoch.label())
}

/// CHIRPS v2.0 daily file for one year, e.g. `chirps-v2.0.2005.days_p05.nc`
pub fn chirps_filename(year: i32) -> String {
    format!("chirps-v2.0.{}.days_p05.nc", year)
}

/// All epoch files of an ERA5 variable under `download/<category>/`
pub fn era5_inputs(config: &Config, category: &str, variable: &str) -> Vec<PathBuf> {
    let dir = config.download_dir(category);
    config
        .era5_epochs
        .iter()
        .map(|epoch| dir.join(era5_filename(variable, epoch)))
        .collect()
}

/// One CHIRPS file per year of the configured date window
pub fn chirps_inputs(config: &Config) -> Vec<PathBuf> {
    use chrono::Datelike;
    let dir = config.download_dir("precipitation");
    (config.domain.start_date.year()..=config.domain.end_date.year())
        .map(|year| dir.join(chirps_filename(year)))
        .collect()
}

/// Normalized artifact file for an output variable under `preprocess/`.
/// Precipitation comes from CHIRPS, everything else from ERA5.
pub fn artifact_filename(config: &Config, variable: &str) -> String {
    let prefix = match variable {
        "precip" => "chirps2",
        _ => "era5",
    };
    let short = match variable {
        "avg_sdswrf" => "sdswrf",
        "avg_sdlwrf" => "sdlwrf",
        other => other,
    };
    format!("{}_{}_{}.nc", prefix, short, config.domain.year_span())
}

pub fn artifact_path(config: &Config, variable: &str) -> PathBuf {
    config
        .preprocess_dir()
        .join(artifact_filename(config, variable))
}

/// Merged multi-variable file under `vic_inp_netcdf/`
pub fn merged_path(config: &Config) -> PathBuf {
    config
        .netcdf_dir()
        .join(format!("vic_inp_{}.nc", config.domain.year_span()))
}
