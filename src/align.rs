//! Axis compatibility checks between gridded fields.
//!
//! Point extraction and the grid merge join variables by time index. These
//! checks make sure the index means the same instant in every input.

use crate::data_io::GriddedField;
use chrono::{Duration, NaiveDateTime};
use thiserror::Error;

/// Largest coordinate difference (degrees) still treated as the same node
pub const LATTICE_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug)]
pub enum AlignmentError {
    #[error("time axis of '{artifact}' has {found} steps, expected {expected} as in '{reference}'")]
    TimeLength {
        artifact: String,
        reference: String,
        expected: usize,
        found: usize,
    },

    #[error("time axis of '{artifact}' differs from '{reference}' at step {index}: {found} vs {expected} (tolerance {tolerance_hours} h)")]
    TimeValue {
        artifact: String,
        reference: String,
        index: usize,
        expected: NaiveDateTime,
        found: NaiveDateTime,
        tolerance_hours: i64,
    },

    #[error("{axis} axis of '{artifact}' differs from '{reference}': {message}")]
    Lattice {
        artifact: String,
        reference: String,
        axis: &'static str,
        message: String,
    },

    #[error("components of '{derived}' are not aligned: {source}")]
    Component {
        derived: String,
        #[source]
        source: Box<AlignmentError>,
    },
}

/// Require `other` to have the time axis of `reference`: same length, and
/// timestamps at the same index at most `tolerance` apart
pub fn check_time_axes(
    reference: &GriddedField,
    other: &GriddedField,
    tolerance: Duration,
) -> Result<(), AlignmentError> {
    if reference.times.len() != other.times.len() {
        return Err(AlignmentError::TimeLength {
            artifact: other.name.clone(),
            reference: reference.name.clone(),
            expected: reference.times.len(),
            found: other.times.len(),
        });
    }
    if let Some(index) = reference
        .times
        .iter()
        .zip(&other.times)
        .position(|(a, b)| (*a - *b).abs() > tolerance)
    {
        return Err(AlignmentError::TimeValue {
            artifact: other.name.clone(),
            reference: reference.name.clone(),
            index,
            expected: reference.times[index],
            found: other.times[index],
            tolerance_hours: tolerance.num_hours(),
        });
    }
    Ok(())
}

/// Require `other` to sit on the lattice of `reference`
pub fn check_lattice(reference: &GriddedField, other: &GriddedField) -> Result<(), AlignmentError> {
    check_axis("latitude", &reference.latitudes, &other.latitudes)
        .and_then(|_| check_axis("longitude", &reference.longitudes, &other.longitudes))
        .map_err(|(axis, message)| AlignmentError::Lattice {
            artifact: other.name.clone(),
            reference: reference.name.clone(),
            axis,
            message,
        })
}

fn check_axis(axis: &'static str, expected: &[f64], found: &[f64]) -> Result<(), (&'static str, String)> {
    if expected.len() != found.len() {
        return Err((axis, format!("{} points vs {}", found.len(), expected.len())));
    }
    if let Some(i) = expected
        .iter()
        .zip(found)
        .position(|(a, b)| (a - b).abs() > LATTICE_TOLERANCE)
    {
        return Err((axis, format!("point {} is {} vs {}", i, found[i], expected[i])));
    }
    Ok(())
}

/// Check every field against the first one
pub fn check_all(
    fields: &[GriddedField],
    tolerance: Duration,
    with_lattice: bool,
) -> Result<(), AlignmentError> {
    if let Some((reference, rest)) = fields.split_first() {
        for other in rest {
            check_time_axes(reference, other, tolerance)?;
            if with_lattice {
                check_lattice(reference, other)?;
            }
        }
    }
    Ok(())
}
