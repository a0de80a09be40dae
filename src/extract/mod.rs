//! Second stage: combine the seven normalized artifacts, either sampled at
//! point locations or merged into one gridded file.

pub mod merge;
pub mod points;

pub use merge::{merge_artifacts, merge_fields};
pub use points::{extract_points, read_point_list, write_points, PointListError};

use crate::config::Config;
use crate::data_io::common::artifact_path;
use crate::data_io::utils::FORCING_VARS;
use crate::data_io::{GriddedField, NetCDFReader};
use crate::error::PrepError;
use tracing::info;

/// Read every artifact in forcing column order
pub fn load_artifacts(config: &Config) -> Result<Vec<GriddedField>, PrepError> {
    let mut fields = Vec::with_capacity(FORCING_VARS.len());
    for variable in FORCING_VARS {
        let path = artifact_path(config, variable);
        info!("Loading '{}' from {}", variable, path.display());
        fields.push(NetCDFReader::new(&path).read_field(variable)?);
    }
    Ok(fields)
}
