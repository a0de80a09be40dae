use super::load_artifacts;
use crate::align::check_all;
use crate::config::Config;
use crate::data_io::common::merged_path;
use crate::data_io::{GriddedField, NetCDFWriter};
use crate::error::PrepError;
use chrono::Duration;
use std::path::{Path, PathBuf};
use tracing::info;

/// Merge all artifacts into `vic_inp_netcdf/vic_inp_<span>.nc`
pub fn merge_artifacts(config: &Config) -> Result<PathBuf, PrepError> {
    let fields = load_artifacts(config)?;
    let output = merged_path(config);
    merge_fields(&fields, &output, config.compression_level, config.time_tolerance())?;
    info!("Merged {} variables into {}", fields.len(), output.display());
    Ok(output)
}

/// Write fields sharing one time axis and lattice into a single file. The
/// time coordinate is taken from the first field. Any axis mismatch fails
/// before the output is touched.
pub fn merge_fields(
    fields: &[GriddedField],
    output: &Path,
    compression_level: i32,
    tolerance: Duration,
) -> Result<(), PrepError> {
    check_all(fields, tolerance, true)?;

    let refs: Vec<&GriddedField> = fields.iter().collect();
    NetCDFWriter::new(output)
        .with_compression(Some(compression_level))
        .with_global_attribute("title", "VIC forcing input")
        .write_fields(&refs)?;
    Ok(())
}
