use super::utils::{expected_source_units, units_match, validate_grid_dimensions};
use super::GriddedField;
use crate::time_utils::{first_non_increasing, TimeUnits};
use ndarray::{concatenate, Array3, Axis};
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("NetCDF error in {path}: {source}")]
    Netcdf {
        path: String,
        #[source]
        source: netcdf::Error,
    },

    #[error("Variable '{variable}' not found in {path}")]
    MissingVariable { path: String, variable: String },

    #[error("Coordinate variable '{coordinate}' not found in {path}")]
    MissingCoordinate { path: String, coordinate: String },

    #[error("Invalid time units in {path}: {message}")]
    TimeUnits { path: String, message: String },

    #[error("Unexpected shape for '{variable}' in {path}: {message}")]
    Shape {
        path: String,
        variable: String,
        message: String,
    },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Cannot concatenate {path}: {message}")]
    Concat { path: String, message: String },

    #[error("No input files given for '{0}'")]
    NoInputs(String),
}

/// Inclusive latitude/longitude bounds in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Same box widened by `margin` degrees on every side
    pub fn widened(&self, margin: f64) -> Self {
        Self::new(
            self.min_lat - margin,
            self.max_lat + margin,
            self.min_lon - margin,
            self.max_lon + margin,
        )
    }
}

/// NetCDF reader for one gridded variable on a (time, latitude, longitude) grid
pub struct NetCDFReader {
    pub file_path: PathBuf,
    /// Warn when a raw variable's `units` differ from the expected source units
    pub check_source_units: bool,
    /// Read only the hyperslab covering this box
    pub bbox: Option<BoundingBox>,
}

impl NetCDFReader {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            check_source_units: false,
            bbox: None,
        }
    }

    pub fn with_source_unit_check(mut self) -> Self {
        self.check_source_units = true;
        self
    }

    pub fn with_bbox(mut self, bbox: Option<BoundingBox>) -> Self {
        self.bbox = bbox;
        self
    }

    fn path_str(&self) -> String {
        self.file_path.display().to_string()
    }

    fn nc_err(&self) -> impl Fn(netcdf::Error) -> ReaderError + '_ {
        move |source| ReaderError::Netcdf {
            path: self.path_str(),
            source,
        }
    }

    /// Check if file exists and is a regular file
    pub fn validate_file(&self) -> Result<(), ReaderError> {
        if !self.file_path.is_file() {
            return Err(ReaderError::FileNotFound(self.path_str()));
        }
        Ok(())
    }

    /// Read `variable_name` with its coordinates. Fill values become NaN and
    /// packed values are unpacked with `scale_factor`/`add_offset`.
    pub fn read_field(&self, variable_name: &str) -> Result<GriddedField, ReaderError> {
        self.validate_file()?;
        let file = netcdf::open(&self.file_path).map_err(self.nc_err())?;

        let var = file
            .variable(variable_name)
            .ok_or_else(|| ReaderError::MissingVariable {
                path: self.path_str(),
                variable: variable_name.to_string(),
            })?;

        let dim_names: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        validate_grid_dimensions(&dim_names, &shape).map_err(|message| ReaderError::Shape {
            path: self.path_str(),
            variable: variable_name.to_string(),
            message,
        })?;

        let times = self.read_time_axis(&file, &dim_names[0])?;
        let mut latitudes = self.read_axis(&file, &dim_names[1])?;
        let mut longitudes = self.read_axis(&file, &dim_names[2])?;

        let (lat_range, lon_range) = match &self.bbox {
            Some(bbox) => (
                covering_range(&latitudes, bbox.min_lat, bbox.max_lat),
                covering_range(&longitudes, bbox.min_lon, bbox.max_lon),
            ),
            None => (0..shape[1], 0..shape[2]),
        };
        if lat_range.is_empty() || lon_range.is_empty() {
            return Err(ReaderError::Shape {
                path: self.path_str(),
                variable: variable_name.to_string(),
                message: format!("no grid cells inside {:?}", self.bbox),
            });
        }
        latitudes = latitudes[lat_range.clone()].to_vec();
        longitudes = longitudes[lon_range.clone()].to_vec();
        let shape = [shape[0], lat_range.len(), lon_range.len()];

        let raw: Vec<f32> = var
            .get_values::<f32, _>((0..shape[0], lat_range, lon_range))
            .map_err(self.nc_err())?;
        let fill = attr_f64(&var, "_FillValue").or_else(|| attr_f64(&var, "missing_value"));
        let scale = attr_f64(&var, "scale_factor").unwrap_or(1.0);
        let offset = attr_f64(&var, "add_offset").unwrap_or(0.0);
        let packed = scale != 1.0 || offset != 0.0;

        let values: Vec<f32> = raw
            .into_iter()
            .map(|v| {
                if v.is_nan() || fill.is_some_and(|f| v == f as f32) {
                    f32::NAN
                } else if packed {
                    (v as f64 * scale + offset) as f32
                } else {
                    v
                }
            })
            .collect();

        let data = Array3::from_shape_vec((shape[0], shape[1], shape[2]), values).map_err(|e| {
            ReaderError::Shape {
                path: self.path_str(),
                variable: variable_name.to_string(),
                message: e.to_string(),
            }
        })?;

        let units = attr_string(&var, "units").unwrap_or_default();
        if let Some(expected) = expected_source_units(variable_name).filter(|_| self.check_source_units) {
            if !units.is_empty() && !units_match(&units, expected) {
                warn!(
                    "{}: '{}' has units '{}', expected '{}'; using values as stated",
                    self.path_str(),
                    variable_name,
                    units,
                    expected
                );
            }
        }

        debug!(
            "Read '{}' from {} with shape {:?}",
            variable_name,
            self.path_str(),
            shape
        );

        Ok(GriddedField {
            name: variable_name.to_string(),
            units,
            long_name: attr_string(&var, "long_name"),
            times,
            latitudes,
            longitudes,
            data,
        })
    }

    fn read_axis(&self, file: &netcdf::File, name: &str) -> Result<Vec<f64>, ReaderError> {
        let var = file
            .variable(name)
            .ok_or_else(|| ReaderError::MissingCoordinate {
                path: self.path_str(),
                coordinate: name.to_string(),
            })?;
        var.get_values::<f64, _>(..).map_err(self.nc_err())
    }

    fn read_time_axis(
        &self,
        file: &netcdf::File,
        name: &str,
    ) -> Result<Vec<chrono::NaiveDateTime>, ReaderError> {
        let var = file
            .variable(name)
            .ok_or_else(|| ReaderError::MissingCoordinate {
                path: self.path_str(),
                coordinate: name.to_string(),
            })?;
        let units_attr = attr_string(&var, "units").ok_or_else(|| ReaderError::TimeUnits {
            path: self.path_str(),
            message: format!("'{}' has no units attribute", name),
        })?;
        let units = TimeUnits::parse(&units_attr).map_err(|message| ReaderError::TimeUnits {
            path: self.path_str(),
            message,
        })?;
        let raw: Vec<f64> = var.get_values::<f64, _>(..).map_err(self.nc_err())?;
        raw.into_iter()
            .enumerate()
            .map(|(i, v)| {
                units.decode(v).ok_or_else(|| ReaderError::TimeUnits {
                    path: self.path_str(),
                    message: format!("'{}'[{}] = {} is not a valid time in {}", name, i, v, units),
                })
            })
            .collect()
    }
}

/// Smallest contiguous index range holding every value in `[min, max]`.
/// Works for ascending and descending axes.
fn covering_range(axis: &[f64], min: f64, max: f64) -> Range<usize> {
    let inside = |v: &f64| *v >= min && *v <= max;
    match (axis.iter().position(inside), axis.iter().rposition(inside)) {
        (Some(first), Some(last)) => first..last + 1,
        _ => 0..0,
    }
}

fn attr_f64(var: &netcdf::Variable, name: &str) -> Option<f64> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Double(d) => Some(d),
            netcdf::AttributeValue::Float(f) => Some(f as f64),
            netcdf::AttributeValue::Short(s) => Some(s as f64),
            netcdf::AttributeValue::Int(i) => Some(i as f64),
            netcdf::AttributeValue::Longlong(i) => Some(i as f64),
            _ => None,
        })
}

fn attr_string(var: &netcdf::Variable, name: &str) -> Option<String> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}

/// Read `variable_name` from every file and join the pieces along time, in
/// the order given. With `bbox` each file is cut to the box as it is read.
/// All pieces must share one lattice and the joined time axis must be
/// strictly increasing.
pub fn read_concatenated(
    files: &[PathBuf],
    variable_name: &str,
    bbox: Option<BoundingBox>,
) -> Result<GriddedField, ReaderError> {
    if files.is_empty() {
        return Err(ReaderError::NoInputs(variable_name.to_string()));
    }
    let mut pieces = Vec::with_capacity(files.len());
    for path in files {
        pieces.push(
            NetCDFReader::new(path)
                .with_source_unit_check()
                .with_bbox(bbox)
                .read_field(variable_name)?,
        );
    }
    concat_time(pieces, files)
}

fn concat_time(pieces: Vec<GriddedField>, files: &[PathBuf]) -> Result<GriddedField, ReaderError> {
    let mut iter = pieces.into_iter().zip(files);
    let (mut first, first_path) = iter
        .next()
        .ok_or_else(|| ReaderError::NoInputs(String::from("time concatenation")))?;

    let mut times = std::mem::take(&mut first.times);
    let mut arrays = vec![std::mem::replace(&mut first.data, Array3::zeros((0, 0, 0)))];

    for (piece, path) in iter {
        if piece.latitudes != first.latitudes || piece.longitudes != first.longitudes {
            return Err(ReaderError::Concat {
                path: path.display().to_string(),
                message: format!(
                    "lattice differs from {} ({}x{} vs {}x{})",
                    first_path.display(),
                    piece.latitudes.len(),
                    piece.longitudes.len(),
                    first.latitudes.len(),
                    first.longitudes.len()
                ),
            });
        }
        times.extend_from_slice(&piece.times);
        arrays.push(piece.data);
    }

    if let Some(i) = first_non_increasing(&times) {
        return Err(ReaderError::Concat {
            path: first_path.display().to_string(),
            message: format!(
                "time axis not strictly increasing at step {} ({} after {})",
                i,
                times[i],
                times[i - 1]
            ),
        });
    }

    let views: Vec<_> = arrays.iter().map(|a| a.view()).collect();
    let data = concatenate(Axis(0), &views).map_err(|e| ReaderError::Concat {
        path: first_path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(GriddedField {
        times,
        data,
        ..first
    })
}
