use crate::align::AlignmentError;
use crate::config::ConfigError;
use crate::data_io::{ReaderError, WriteError};
use crate::extract::PointListError;
use crate::normalize::NormalizeError;
use thiserror::Error;

/// Any failure of a processing unit
#[derive(Error, Debug)]
pub enum PrepError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Read(#[from] ReaderError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    PointList(#[from] PointListError),

    #[error("{unit}: {source}")]
    Unit {
        unit: String,
        #[source]
        source: Box<PrepError>,
    },
}

impl PrepError {
    /// Attach the name of the unit that failed
    pub fn in_unit(self, unit: &str) -> Self {
        PrepError::Unit {
            unit: unit.to_string(),
            source: Box::new(self),
        }
    }
}
