use crate::data_io::WriteError;
use std::fs;
use std::path::{Path, PathBuf};

/// Site where a forcing time series is extracted, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLocation {
    pub lon: f64,
    pub lat: f64,
}

impl PointLocation {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// VIC forcing file name, `gf_<lon>_<lat>` with 4 decimals and no extension
    pub fn file_name(&self) -> String {
        format!("gf_{:.4}_{:.4}", self.lon, self.lat)
    }
}

/// Writer for per-point VIC ASCII forcing files: tab separated, one row per
/// time step, no header, fixed 6-decimal values.
pub struct AsciiForcingWriter {
    output_dir: PathBuf,
}

impl AsciiForcingWriter {
    pub fn new(output_dir: &Path) -> Result<Self, WriteError> {
        fs::create_dir_all(output_dir).map_err(|source| WriteError::Io {
            path: output_dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn output_path(&self, point: &PointLocation) -> PathBuf {
        self.output_dir.join(point.file_name())
    }

    /// Write one file for `point`; `columns` are equal-length series in output
    /// column order
    pub fn write_point(&self, point: &PointLocation, columns: &[Vec<f32>]) -> Result<PathBuf, WriteError> {
        let path = self.output_path(point);
        let path_str = path.display().to_string();

        let n_rows = columns.first().map(|c| c.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().position(|c| c.len() != n_rows) {
            return Err(WriteError::InvalidData {
                path: path_str,
                message: format!(
                    "column {} has {} rows, expected {}",
                    bad,
                    columns[bad].len(),
                    n_rows
                ),
            });
        }

        let csv_err = |source| WriteError::Csv {
            path: path_str.clone(),
            source,
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(&path)
            .map_err(csv_err)?;

        let mut row: Vec<String> = Vec::with_capacity(columns.len());
        for t in 0..n_rows {
            row.clear();
            row.extend(columns.iter().map(|c| format_value(c[t])));
            writer.write_record(&row).map_err(csv_err)?;
        }
        writer.flush().map_err(|source| WriteError::Io {
            path: path_str.clone(),
            source,
        })?;

        Ok(path)
    }
}

/// `%.6f` formatting; missing values are written as `nan`
pub fn format_value(value: f32) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.6}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_file_name() {
        let point = PointLocation::new(100.03126, 20.5);
        assert_eq!(point.file_name(), "gf_100.0313_20.5000");
        let point = PointLocation::new(93.9069, 18.9189);
        assert_eq!(point.file_name(), "gf_93.9069_18.9189");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(26.85), "26.850000");
        assert_eq!(format_value(0.0), "0.000000");
        assert_eq!(format_value(f32::NAN), "nan");
    }

    #[test]
    fn test_write_point_rows() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AsciiForcingWriter::new(dir.path()).unwrap();
        let point = PointLocation::new(100.0, 20.0);
        let columns = vec![vec![1.0, 2.0], vec![3.5, 4.25]];

        let path = writer.write_point(&point, &columns).unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "1.000000\t3.500000\n2.000000\t4.250000\n");
    }

    #[test]
    fn test_write_point_rejects_ragged_columns() {
        let dir = tempfile::tempdir().unwrap();
        let writer = AsciiForcingWriter::new(dir.path()).unwrap();
        let point = PointLocation::new(100.0, 20.0);
        let result = writer.write_point(&point, &[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(result, Err(WriteError::InvalidData { .. })));
    }
}
