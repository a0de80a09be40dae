//! Per-variable normalization: read raw downloads, harmonize time, convert
//! units, regrid onto the target lattice and write one artifact per variable.

pub mod expand;
pub mod units;

pub use expand::daily_to_sub_daily;
pub use units::Unit;

use crate::align::{check_lattice, check_time_axes, AlignmentError};
use crate::config::Config;
use crate::data_io::utils::{get_long_name, get_variable_units};
use crate::data_io::{read_concatenated, BoundingBox, GriddedField, NetCDFWriter};
use crate::error::PrepError;
use crate::math::{kelvin_to_celsius, pa_to_kpa, regrid_nearest, vapor_pressure_from_dewpoint_k, wind_speed};
use crate::time_utils::{shift_hours, window_indices};
use chrono::{Duration, NaiveDate};
use ndarray::Zip;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("No time steps of '{variable}' fall inside the date window")]
    EmptyWindow { variable: String },

    #[error("'{variable}' has more than one daily value on {date}")]
    DuplicateDay { variable: String, date: NaiveDate },

    #[error("Transform {transform:?} takes {expected} input(s), got {found}")]
    InputCount {
        transform: Transform,
        expected: usize,
        found: usize,
    },

    #[error("Unknown unit '{0}'")]
    UnknownUnit(String),
}

/// One raw variable and the files holding it, in time order
#[derive(Debug, Clone)]
pub struct InputGroup {
    pub variable: String,
    pub files: Vec<PathBuf>,
}

impl InputGroup {
    pub fn new(variable: &str, files: Vec<PathBuf>) -> Self {
        Self {
            variable: variable.to_string(),
            files,
        }
    }
}

/// Conversion from raw input group(s) to the output variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Passthrough,
    /// Pa to kPa
    PaToKpa,
    /// K to °C
    KelvinToCelsius,
    /// Dew point (K) to actual vapor pressure (kPa)
    VaporPressure,
    /// Two groups, eastward and northward components
    WindSpeed,
    /// Daily totals onto a 6-hourly axis
    DailyToSubDaily,
}

impl Transform {
    pub fn input_count(&self) -> usize {
        match self {
            Transform::WindSpeed => 2,
            _ => 1,
        }
    }
}

/// Everything one normalization pass needs to know
#[derive(Debug, Clone)]
pub struct UnitSpec {
    pub inputs: Vec<InputGroup>,
    pub transform: Transform,
    /// Output variable name
    pub output: String,
    pub output_path: PathBuf,
    /// Move source timestamps to local time before slicing
    pub shift_time_zone: bool,
    /// Read raw data only inside the target box widened by this many degrees
    pub crop_margin: Option<f64>,
    pub compress: bool,
}

/// Run every pass of `unit`; failures carry the unit name
pub fn run(config: &Config, unit: Unit) -> Result<Vec<PathBuf>, PrepError> {
    info!("Normalizing {}", unit);
    unit.specs(config)
        .iter()
        .map(|spec| run_unit(config, spec))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.in_unit(unit.name()))
}

/// Run one normalization pass and return the artifact path.
///
/// Nothing is written unless every step succeeds.
pub fn run_unit(config: &Config, spec: &UnitSpec) -> Result<PathBuf, PrepError> {
    let started = Instant::now();
    let transform = spec.transform;
    if spec.inputs.len() != transform.input_count() {
        return Err(NormalizeError::InputCount {
            transform,
            expected: transform.input_count(),
            found: spec.inputs.len(),
        }
        .into());
    }

    let domain = &config.domain;
    let bbox = spec.crop_margin.map(|margin| {
        BoundingBox::new(domain.min_lat, domain.max_lat, domain.min_lon, domain.max_lon).widened(margin)
    });

    let mut fields = Vec::with_capacity(spec.inputs.len());
    for group in &spec.inputs {
        info!("Reading '{}' from {} file(s)", group.variable, group.files.len());
        let raw = read_concatenated(&group.files, &group.variable, bbox)?;
        fields.push(prepare(config, spec, raw)?);
    }

    let mut field = apply_transform(transform, &spec.output, fields)?;
    field.name = spec.output.clone();
    field.units = get_variable_units(&spec.output);
    field.long_name = Some(get_long_name(&spec.output));

    let lats = config.domain.target_latitudes();
    let lons = config.domain.target_longitudes();
    debug!(
        "Regridding '{}' from {}x{} onto {}x{}",
        field.name,
        field.latitudes.len(),
        field.longitudes.len(),
        lats.len(),
        lons.len()
    );
    let regridded = regrid_nearest(&field, &lats, &lons);
    drop(field);

    NetCDFWriter::new(&spec.output_path)
        .with_compression(spec.compress.then_some(config.compression_level))
        .write_field(&regridded)?;

    info!(
        "Wrote {} ({} time steps) in {:.1?}",
        spec.output_path.display(),
        regridded.times.len(),
        started.elapsed()
    );
    Ok(spec.output_path.clone())
}

/// Sort, shift and slice a raw field
fn prepare(config: &Config, spec: &UnitSpec, raw: GriddedField) -> Result<GriddedField, NormalizeError> {
    let domain = &config.domain;
    let mut field = raw.sort_spatial();

    if spec.shift_time_zone {
        field.times = shift_hours(&field.times, domain.time_zone_offset_hours);
    }

    let keep = window_indices(&field.times, domain.window_start(), domain.window_end());
    if keep.is_empty() {
        return Err(NormalizeError::EmptyWindow {
            variable: field.name,
        });
    }
    debug!("'{}': keeping {} of {} time steps", field.name, keep.len(), field.times.len());
    Ok(field.select_times(&keep))
}

fn apply_transform(
    transform: Transform,
    output: &str,
    mut fields: Vec<GriddedField>,
) -> Result<GriddedField, PrepError> {
    if transform == Transform::WindSpeed {
        let v = fields.pop();
        let u = fields.pop();
        let (Some(mut u), Some(v)) = (u, v) else {
            return Err(NormalizeError::InputCount {
                transform,
                expected: 2,
                found: 0,
            }
            .into());
        };
        check_time_axes(&u, &v, Duration::zero())
            .and_then(|_| check_lattice(&u, &v))
            .map_err(|e| AlignmentError::Component {
                derived: output.to_string(),
                source: Box::new(e),
            })?;
        Zip::from(&mut u.data)
            .and(&v.data)
            .par_for_each(|a, &b| *a = wind_speed(*a as f64, b as f64) as f32);
        return Ok(u);
    }

    let Some(mut field) = fields.pop() else {
        return Err(NormalizeError::InputCount {
            transform,
            expected: 1,
            found: 0,
        }
        .into());
    };

    match transform {
        Transform::Passthrough | Transform::WindSpeed => {}
        Transform::PaToKpa => map_f64(&mut field, pa_to_kpa),
        Transform::KelvinToCelsius => map_f64(&mut field, kelvin_to_celsius),
        Transform::VaporPressure => map_f64(&mut field, vapor_pressure_from_dewpoint_k),
        Transform::DailyToSubDaily => field = daily_to_sub_daily(field)?,
    }
    Ok(field)
}

/// Element-wise conversion evaluated in f64
fn map_f64(field: &mut GriddedField, f: fn(f64) -> f64) {
    field.data.par_mapv_inplace(|v| f(v as f64) as f32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use ndarray::Array3;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2005, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn field(name: &str, value: f32, steps: usize) -> GriddedField {
        GriddedField {
            name: name.to_string(),
            units: String::new(),
            long_name: None,
            times: (0..steps).map(|i| t0() + Duration::hours(6 * i as i64)).collect(),
            latitudes: vec![18.0, 18.5],
            longitudes: vec![100.0, 100.5],
            data: Array3::from_elem((steps, 2, 2), value),
        }
    }

    #[test]
    fn test_scalar_transforms() {
        let out = apply_transform(Transform::PaToKpa, "sp", vec![field("sp", 101325.0, 2)]).unwrap();
        assert!(out.data.iter().all(|v| (*v - 101.325).abs() < 1e-4));

        let out = apply_transform(Transform::KelvinToCelsius, "t2m", vec![field("t2m", 300.0, 2)]).unwrap();
        assert!(out.data.iter().all(|v| (*v - 26.85).abs() < 1e-4));

        let out = apply_transform(Transform::Passthrough, "avg_sdswrf", vec![field("avg_sdswrf", 250.0, 2)]).unwrap();
        assert!(out.data.iter().all(|v| *v == 250.0));
    }

    #[test]
    fn test_nan_propagates() {
        let mut input = field("d2m", 290.0, 1);
        input.data[[0, 1, 1]] = f32::NAN;
        let out = apply_transform(Transform::VaporPressure, "vp", vec![input]).unwrap();
        assert!(out.data[[0, 1, 1]].is_nan());
        assert!(out.data[[0, 0, 0]] > 1.0 && out.data[[0, 0, 0]] < 2.5);
    }

    #[test]
    fn test_wind_speed_from_components() {
        let out = apply_transform(
            Transform::WindSpeed,
            "w10",
            vec![field("u10", 3.0, 3), field("v10", -4.0, 3)],
        )
        .unwrap();
        assert!(out.data.iter().all(|v| *v == 5.0));
    }

    #[test]
    fn test_wind_components_must_align() {
        let err = apply_transform(
            Transform::WindSpeed,
            "w10",
            vec![field("u10", 3.0, 3), field("v10", 4.0, 2)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PrepError::Alignment(AlignmentError::Component { .. })
        ));
    }

    #[test]
    fn test_prepare_shifts_then_slices() {
        let mut config = Config::default();
        config.domain.start_date = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap();
        config.domain.end_date = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap();

        let mut raw = field("t2m", 1.0, 6);
        // Raw axis starts the evening before, in UTC
        raw.times = shift_hours(&raw.times, -12);
        let spec = UnitSpec {
            inputs: vec![],
            transform: Transform::Passthrough,
            output: "t2m".to_string(),
            output_path: PathBuf::new(),
            shift_time_zone: true,
            crop_margin: None,
            compress: true,
        };
        let out = prepare(&config, &spec, raw).unwrap();
        // 12:00Z Dec 31 + 7 h = 19:00 local, outside; then 01:00, 07:00, ...
        assert_eq!(out.times.first().copied(), Some(t0() + Duration::hours(1)));
        assert_eq!(out.times.len(), 4);
    }

    #[test]
    fn test_prepare_rejects_empty_window() {
        let config = Config::default();
        let mut raw = field("sp", 1.0, 2);
        raw.times = shift_hours(&raw.times, -24 * 400);
        let spec = UnitSpec {
            inputs: vec![],
            transform: Transform::PaToKpa,
            output: "sp".to_string(),
            output_path: PathBuf::new(),
            shift_time_zone: false,
            crop_margin: Some(5.0),
            compress: true,
        };
        assert!(matches!(
            prepare(&config, &spec, raw),
            Err(NormalizeError::EmptyWindow { .. })
        ));
    }
}
