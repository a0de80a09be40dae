use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Spatial and temporal domain shared by every processing unit.
///
/// Defaults cover the Mekong basin on a 0.0625° lattice, 2005 through 2020,
/// with timestamps moved from UTC to local time (UTC+7).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
    /// Lattice step in degrees, shared by both axes
    pub grid_step: f64,
    /// First day of the output window (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the output window (inclusive, whole day)
    pub end_date: NaiveDate,
    /// Offset added to source timestamps to obtain local time
    pub time_zone_offset_hours: i64,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            min_lat: 18.9189,
            max_lat: 33.7939,
            min_lon: 93.9069,
            max_lon: 102.0319,
            grid_step: 0.0625,
            start_date: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap_or_default(),
            time_zone_offset_hours: 7,
        }
    }
}

impl DomainConfig {
    /// Target latitudes, `min_lat + i * grid_step` up to and including `max_lat`
    pub fn target_latitudes(&self) -> Vec<f64> {
        lattice_axis(self.min_lat, self.max_lat, self.grid_step)
    }

    /// Target longitudes, `min_lon + i * grid_step` up to and including `max_lon`
    pub fn target_longitudes(&self) -> Vec<f64> {
        lattice_axis(self.min_lon, self.max_lon, self.grid_step)
    }

    /// First instant kept by the date window
    pub fn window_start(&self) -> NaiveDateTime {
        self.start_date.and_time(NaiveTime::MIN)
    }

    /// First instant past the date window; the window is `[window_start, window_end)`
    pub fn window_end(&self) -> NaiveDateTime {
        self.end_date
            .succ_opt()
            .unwrap_or(self.end_date)
            .and_time(NaiveTime::MIN)
    }

    /// Year span used in artifact file names, e.g. "2005-2020"
    pub fn year_span(&self) -> String {
        use chrono::Datelike;
        format!("{}-{}", self.start_date.year(), self.end_date.year())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.min_lat) || !(-90.0..=90.0).contains(&self.max_lat) {
            return Err(ConfigError::Invalid(
                "Latitude bounds must be between -90 and 90 degrees".to_string(),
            ));
        }
        if !(-180.0..=360.0).contains(&self.min_lon) || !(-180.0..=360.0).contains(&self.max_lon) {
            return Err(ConfigError::Invalid(
                "Longitude bounds must be between -180 and 360 degrees".to_string(),
            ));
        }
        if self.min_lat > self.max_lat || self.min_lon > self.max_lon {
            return Err(ConfigError::Invalid(format!(
                "Empty bounding box: lat [{}, {}], lon [{}, {}]",
                self.min_lat, self.max_lat, self.min_lon, self.max_lon
            )));
        }
        if self.grid_step.is_nan() || self.grid_step <= 0.0 {
            return Err(ConfigError::Invalid("Grid step must be positive".to_string()));
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::Invalid(format!(
                "Start date {} is after end date {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }
}

/// Build an inclusive lattice axis. The small epsilon keeps `max` on the axis
/// when `(max - min) / step` lands a hair below an integer.
pub fn lattice_axis(min: f64, max: f64, step: f64) -> Vec<f64> {
    let n = ((max - min) / step + 1e-9).floor() as usize;
    (0..=n).map(|i| min + i as f64 * step).collect()
}

/// One multi-year ERA5 download file, e.g. `era5_t2m_2004-2012.nc`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    pub first_year: i32,
    pub last_year: i32,
}

impl Epoch {
    pub fn new(first_year: i32, last_year: i32) -> Self {
        Self {
            first_year,
            last_year,
        }
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.first_year, self.last_year)
    }
}

/// Directory layout, relative to the working directory
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub download_dir: PathBuf,
    pub preprocess_dir: PathBuf,
    pub ascii_dir: PathBuf,
    pub netcdf_dir: PathBuf,
    pub point_list: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("download"),
            preprocess_dir: PathBuf::from("preprocess"),
            ascii_dir: PathBuf::from("vic_inp_ascii"),
            netcdf_dir: PathBuf::from("vic_inp_netcdf"),
            point_list: PathBuf::from("lon_lat.txt"),
        }
    }
}

/// Main configuration, loaded once per run and passed to every unit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub domain: DomainConfig,
    /// Root all layout paths are resolved against
    pub work_dir: PathBuf,
    pub layout: Layout,
    /// Multi-year split of the ERA5 downloads
    pub era5_epochs: Vec<Epoch>,
    /// Deflate level for compressed artifacts (0-9)
    pub compression_level: i32,
    /// Margin in degrees kept around the bounding box when cropping raw
    /// precipitation before expansion
    pub precip_crop_margin: f64,
    /// Largest offset between timestamps at the same index that still joins
    /// artifacts. Shifted ERA5 steps sit 1 h after the precipitation slots.
    pub time_tolerance_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domain: DomainConfig::default(),
            work_dir: PathBuf::from("."),
            layout: Layout::default(),
            era5_epochs: vec![Epoch::new(2004, 2012), Epoch::new(2013, 2020)],
            compression_level: 4,
            precip_crop_margin: 5.0,
            time_tolerance_hours: 3,
        }
    }
}

impl Config {
    /// Load overrides from a JSON file; missing keys keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Same configuration rooted at another working directory
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.domain.validate()?;
        if !(0..=9).contains(&self.compression_level) {
            return Err(ConfigError::Invalid(format!(
                "Compression level must be 0-9, got {}",
                self.compression_level
            )));
        }
        if self.era5_epochs.is_empty() {
            return Err(ConfigError::Invalid(
                "At least one ERA5 epoch is required".to_string(),
            ));
        }
        if self.precip_crop_margin < 0.0 {
            return Err(ConfigError::Invalid(
                "Precipitation crop margin must not be negative".to_string(),
            ));
        }
        if self.time_tolerance_hours < 0 {
            return Err(ConfigError::Invalid(
                "Time tolerance must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn time_tolerance(&self) -> Duration {
        Duration::hours(self.time_tolerance_hours)
    }

    pub fn download_dir(&self, category: &str) -> PathBuf {
        self.work_dir.join(&self.layout.download_dir).join(category)
    }

    pub fn preprocess_dir(&self) -> PathBuf {
        self.work_dir.join(&self.layout.preprocess_dir)
    }

    pub fn ascii_dir(&self) -> PathBuf {
        self.work_dir.join(&self.layout.ascii_dir)
    }

    pub fn netcdf_dir(&self) -> PathBuf {
        self.work_dir.join(&self.layout.netcdf_dir)
    }

    pub fn point_list(&self) -> PathBuf {
        self.work_dir.join(&self.layout.point_list)
    }
}
