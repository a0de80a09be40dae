use crate::data_io::GriddedField;
use ndarray::{Array3, Axis};
use num_traits::Float;
use rayon::prelude::*;

/// How an exact half-way target is resolved between two source nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Prefer the node with the smaller index
    Lower,
    /// Prefer the node with the larger index
    Upper,
}

/// Nearest index on an ascending axis for a target inside the axis range.
/// Targets outside `[axis[0], axis[last]]` give `None`.
///
/// Used for regridding: the boundary between two nodes is their midpoint and
/// a target sitting on it goes to the lower node.
pub fn nearest_index_within<T: Float>(axis: &[T], target: T) -> Option<usize> {
    let last = axis.len().checked_sub(1)?;
    if target.is_nan() || target < axis[0] || target > axis[last] {
        return None;
    }
    Some(nearest_index(axis, target, TieBreak::Lower))
}

/// Nearest index on an ascending axis. Targets beyond either end clamp to
/// the edge node.
pub fn nearest_index<T: Float>(axis: &[T], target: T, tie: TieBreak) -> usize {
    if axis.len() < 2 {
        return 0;
    }
    // First node not below the target
    let upper = axis.partition_point(|v| *v < target);
    if upper == 0 {
        return 0;
    }
    if upper == axis.len() {
        return axis.len() - 1;
    }
    let lower = upper - 1;
    let d_lower = target - axis[lower];
    let d_upper = axis[upper] - target;
    if d_lower < d_upper {
        lower
    } else if d_upper < d_lower {
        upper
    } else {
        match tie {
            TieBreak::Lower => lower,
            TieBreak::Upper => upper,
        }
    }
}

/// Source index for every target coordinate; `None` marks out-of-range targets
pub fn nearest_indices(source: &[f64], targets: &[f64]) -> Vec<Option<usize>> {
    targets
        .iter()
        .map(|&t| nearest_index_within(source, t))
        .collect()
}

/// Nearest-neighbour regrid of a field onto a new lattice, axis by axis.
/// Target cells outside the source extent are NaN. The time axis is kept.
pub fn regrid_nearest(field: &GriddedField, latitudes: &[f64], longitudes: &[f64]) -> GriddedField {
    let lat_idx = nearest_indices(&field.latitudes, latitudes);
    let lon_idx = nearest_indices(&field.longitudes, longitudes);
    let (nt, _, _) = field.shape();

    let mut data = Array3::<f32>::from_elem((nt, latitudes.len(), longitudes.len()), f32::NAN);

    data.axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(field.data.axis_iter(Axis(0)).into_par_iter())
        .for_each(|(mut out, src)| {
            for (j, lj) in lat_idx.iter().enumerate() {
                let Some(sj) = lj else { continue };
                for (i, li) in lon_idx.iter().enumerate() {
                    if let Some(si) = li {
                        out[[j, i]] = src[[*sj, *si]];
                    }
                }
            }
        });

    GriddedField {
        name: field.name.clone(),
        units: field.units.clone(),
        long_name: field.long_name.clone(),
        times: field.times.clone(),
        latitudes: latitudes.to_vec(),
        longitudes: longitudes.to_vec(),
        data,
    }
}
