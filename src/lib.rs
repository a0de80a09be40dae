pub mod align;
pub mod config;
pub mod data_io;
pub mod error;
pub mod extract;
pub mod math;
pub mod normalize;
pub mod time_utils;

pub use error::PrepError;
pub use time_utils::*;
