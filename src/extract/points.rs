use super::load_artifacts;
use crate::align::check_all;
use crate::config::Config;
use crate::data_io::ascii_writer::{AsciiForcingWriter, PointLocation};
use crate::data_io::GriddedField;
use crate::error::PrepError;
use crate::math::{nearest_index, TieBreak};
use chrono::Duration;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PointListError {
    #[error("Point list {path} not found")]
    NotFound { path: String },

    #[error("Failed to read point list {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path}:{line}: expected '<lon>\\t<lat>', got '{content}'")]
    Malformed {
        path: String,
        line: u64,
        content: String,
    },
}

/// Read `lon<TAB>lat` lines. Blank lines are skipped.
pub fn read_point_list(path: &Path) -> Result<Vec<PointLocation>, PointListError> {
    let path_str = path.display().to_string();
    if !path.is_file() {
        return Err(PointListError::NotFound { path: path_str });
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| PointListError::Csv {
            path: path_str.clone(),
            source,
        })?;

    let mut points = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| PointListError::Csv {
            path: path_str.clone(),
            source,
        })?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let malformed = || PointListError::Malformed {
            path: path_str.clone(),
            line,
            content: record.iter().collect::<Vec<_>>().join("\t"),
        };

        if record.len() != 2 {
            return Err(malformed());
        }
        let lon: f64 = record[0].parse().map_err(|_| malformed())?;
        let lat: f64 = record[1].parse().map_err(|_| malformed())?;
        if !lon.is_finite() || !lat.is_finite() {
            return Err(malformed());
        }
        points.push(PointLocation::new(lon, lat));
    }
    Ok(points)
}

/// Nearest node series of every field at `point`, in field order.
///
/// Each field is searched on its own axes. Half-way points go to the node with
/// the larger index and points off the grid clamp to the edge.
pub fn point_columns(fields: &[GriddedField], point: &PointLocation) -> Vec<Vec<f32>> {
    fields
        .iter()
        .map(|field| {
            let j = nearest_index(&field.latitudes, point.lat, TieBreak::Upper);
            let i = nearest_index(&field.longitudes, point.lon, TieBreak::Upper);
            field.cell_series(j, i)
        })
        .collect()
}

/// Write one forcing file per point into `output_dir`. Rows are joined by
/// time index, so the time axes must agree within `tolerance`.
pub fn write_points(
    fields: &[GriddedField],
    points: &[PointLocation],
    output_dir: &Path,
    tolerance: Duration,
) -> Result<Vec<PathBuf>, PrepError> {
    check_all(fields, tolerance, false)?;

    let writer = AsciiForcingWriter::new(output_dir)?;
    let mut written = Vec::with_capacity(points.len());
    for point in points {
        let columns = point_columns(fields, point);
        let path = writer.write_point(point, &columns)?;
        debug!("lat: {}, lon: {} -> {}", point.lat, point.lon, path.display());
        written.push(path);
    }
    Ok(written)
}

/// Extract VIC ASCII forcing for every point of the configured point list
pub fn extract_points(config: &Config) -> Result<Vec<PathBuf>, PrepError> {
    let points = read_point_list(&config.point_list())?;
    info!("Extracting {} point(s)", points.len());

    let fields = load_artifacts(config)?;
    let written = write_points(&fields, &points, &config.ascii_dir(), config.time_tolerance())?;

    info!(
        "Wrote {} file(s) to {}",
        written.len(),
        config.ascii_dir().display()
    );
    Ok(written)
}
