pub mod ascii_writer;
pub mod common;
pub mod reader;
pub mod utils;
pub mod writer;

pub use reader::*;
pub use writer::*;

use chrono::NaiveDateTime;
use ndarray::{Array3, Axis};

/// Gridded field on a regular (time, latitude, longitude) grid
#[derive(Debug, Clone)]
pub struct GriddedField {
    /// Variable name (e.g., "t2m", "vp", "precip")
    pub name: String,
    /// Physical units
    pub units: String,
    /// Descriptive name written as `long_name`
    pub long_name: Option<String>,
    /// Time coordinates, strictly increasing
    pub times: Vec<NaiveDateTime>,
    /// Latitude coordinates (degrees north)
    pub latitudes: Vec<f64>,
    /// Longitude coordinates (degrees east)
    pub longitudes: Vec<f64>,
    /// Data with layout [time, lat, lon]; missing cells are NaN
    pub data: Array3<f32>,
}

impl GriddedField {
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Keep only the given time steps, in the given order
    pub fn select_times(self, indices: &[usize]) -> Self {
        let data = self.data.select(Axis(0), indices);
        let times = indices.iter().map(|&i| self.times[i]).collect();
        Self {
            times,
            data,
            ..self
        }
    }

    /// Sort latitude and longitude ascending, carrying the data along
    pub fn sort_spatial(self) -> Self {
        let lat_order = ascending_order(&self.latitudes);
        let lon_order = ascending_order(&self.longitudes);

        if is_identity(&lat_order) && is_identity(&lon_order) {
            return self;
        }

        let data = self
            .data
            .select(Axis(1), &lat_order)
            .select(Axis(2), &lon_order);
        let latitudes = lat_order.iter().map(|&i| self.latitudes[i]).collect();
        let longitudes = lon_order.iter().map(|&i| self.longitudes[i]).collect();

        Self {
            latitudes,
            longitudes,
            data,
            ..self
        }
    }

    /// Time series of a single grid cell
    pub fn cell_series(&self, lat_idx: usize, lon_idx: usize) -> Vec<f32> {
        self.data
            .index_axis(Axis(2), lon_idx)
            .index_axis(Axis(1), lat_idx)
            .to_vec()
    }
}

fn ascending_order(axis: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..axis.len()).collect();
    order.sort_by(|&a, &b| axis[a].total_cmp(&axis[b]));
    order
}

fn is_identity(order: &[usize]) -> bool {
    order.iter().enumerate().all(|(i, &j)| i == j)
}
