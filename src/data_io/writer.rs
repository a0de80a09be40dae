use super::GriddedField;
use crate::time_utils::{TimeUnits, OUTPUT_TIME_UNITS};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("NetCDF error writing {path}: {source}")]
    Netcdf {
        path: String,
        #[source]
        source: netcdf::Error,
    },

    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error writing {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid data for {path}: {message}")]
    InvalidData { path: String, message: String },
}

/// NetCDF writer for gridded (time, latitude, longitude) artifacts.
///
/// Output goes to `<file>.part` first and is renamed into place only after
/// every variable was written, so a failed write leaves nothing behind.
pub struct NetCDFWriter {
    pub file_path: PathBuf,
    /// Deflate level; `None` writes uncompressed variables
    pub compression_level: Option<i32>,
    global_attributes: Vec<(String, String)>,
}

impl NetCDFWriter {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            compression_level: None,
            global_attributes: Vec::new(),
        }
    }

    pub fn with_compression(mut self, level: Option<i32>) -> Self {
        self.compression_level = level;
        self
    }

    pub fn with_global_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.global_attributes.push((name.to_string(), value.into()));
        self
    }

    fn path_str(&self) -> String {
        self.file_path.display().to_string()
    }

    fn partial_path(&self) -> PathBuf {
        let mut name = self.file_path.as_os_str().to_owned();
        name.push(".part");
        PathBuf::from(name)
    }

    /// Write one normalized artifact
    pub fn write_field(&self, field: &GriddedField) -> Result<(), WriteError> {
        self.write_fields(&[field])
    }

    /// Write several fields sharing one time axis and lattice into one file
    pub fn write_fields(&self, fields: &[&GriddedField]) -> Result<(), WriteError> {
        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| WriteError::Io {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let partial = self.partial_path();
        let result = self.write_to(&partial, fields);
        match result {
            Ok(()) => {
                fs::rename(&partial, &self.file_path).map_err(|source| WriteError::Io {
                    path: self.path_str(),
                    source,
                })?;
                debug!("Renamed {} into place", partial.display());
                Ok(())
            }
            Err(e) => {
                let _ = fs::remove_file(&partial);
                Err(e)
            }
        }
    }

    fn write_to(&self, path: &Path, fields: &[&GriddedField]) -> Result<(), WriteError> {
        let nc = |source| WriteError::Netcdf {
            path: self.path_str(),
            source,
        };
        let invalid = |message: String| WriteError::InvalidData {
            path: self.path_str(),
            message,
        };

        let first = fields
            .first()
            .ok_or_else(|| invalid("No fields to write".to_string()))?;
        let (nt, nj, ni) = first.shape();
        if nt == 0 {
            return Err(invalid(format!("'{}' has no time steps", first.name)));
        }
        for field in fields {
            if field.shape() != first.shape() {
                return Err(invalid(format!(
                    "'{}' has shape {:?}, expected {:?}",
                    field.name,
                    field.shape(),
                    first.shape()
                )));
            }
        }

        if path.exists() {
            fs::remove_file(path).map_err(|source| WriteError::Io {
                path: path.display().to_string(),
                source,
            })?;
        }
        let mut file = netcdf::create(path).map_err(nc)?;

        file.add_dimension("time", nt).map_err(nc)?;
        file.add_dimension("latitude", nj).map_err(nc)?;
        file.add_dimension("longitude", ni).map_err(nc)?;

        // Coordinate variables
        {
            let units = TimeUnits::parse(OUTPUT_TIME_UNITS).map_err(invalid)?;
            let encoded: Vec<f64> = first.times.iter().map(|t| units.encode(t)).collect();
            let mut var = file.add_variable::<f64>("time", &["time"]).map_err(nc)?;
            var.put_attribute("units", OUTPUT_TIME_UNITS).map_err(nc)?;
            var.put_attribute("standard_name", "time").map_err(nc)?;
            var.put_attribute("calendar", "proleptic_gregorian").map_err(nc)?;
            var.put_values(&encoded, ..).map_err(nc)?;
        }
        {
            let mut var = file.add_variable::<f64>("latitude", &["latitude"]).map_err(nc)?;
            var.put_attribute("units", "degrees_north").map_err(nc)?;
            var.put_attribute("standard_name", "latitude").map_err(nc)?;
            var.put_values(&first.latitudes, ..).map_err(nc)?;
        }
        {
            let mut var = file.add_variable::<f64>("longitude", &["longitude"]).map_err(nc)?;
            var.put_attribute("units", "degrees_east").map_err(nc)?;
            var.put_attribute("standard_name", "longitude").map_err(nc)?;
            var.put_values(&first.longitudes, ..).map_err(nc)?;
        }

        for field in fields {
            let mut var = file
                .add_variable::<f32>(&field.name, &["time", "latitude", "longitude"])
                .map_err(nc)?;
            if let Some(level) = self.compression_level {
                var.set_compression(level, true).map_err(nc)?;
            }
            var.set_fill_value(f32::NAN).map_err(nc)?;
            var.put_attribute("units", field.units.as_str()).map_err(nc)?;
            if let Some(long_name) = &field.long_name {
                var.put_attribute("long_name", long_name.as_str()).map_err(nc)?;
            }

            let data = field.data.as_standard_layout();
            let values = data
                .as_slice()
                .ok_or_else(|| invalid(format!("'{}' is not contiguous", field.name)))?;
            var.put_values(values, ..).map_err(nc)?;
            debug!("Wrote variable '{}' {:?}", field.name, field.shape());
        }

        file.add_attribute("Conventions", "CF-1.8").map_err(nc)?;
        file.add_attribute("source", "vic_forcing").map_err(nc)?;
        for (name, value) in &self.global_attributes {
            file.add_attribute(name, value.as_str()).map_err(nc)?;
        }
        let creation_time = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        file.add_attribute("history", format!("Created on {}", creation_time).as_str())
            .map_err(nc)?;

        Ok(())
    }
}
