#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::path::Path;
use vic_forcing::config::{Config, DomainConfig, Epoch};

pub fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

/// 6-hourly timestamps from `start` to `end` inclusive
pub fn six_hourly(start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
    let mut times = Vec::new();
    let mut t = start;
    while t <= end {
        times.push(t);
        t += Duration::hours(6);
    }
    times
}

/// Small domain: 3x3 lattice at 0.125°, two ERA5 epochs
pub fn test_config(work_dir: &Path, start: NaiveDate, end: NaiveDate) -> Config {
    Config {
        domain: DomainConfig {
            min_lat: 20.0,
            max_lat: 20.25,
            min_lon: 100.0,
            max_lon: 100.25,
            grid_step: 0.125,
            start_date: start,
            end_date: end,
            time_zone_offset_hours: 7,
        },
        era5_epochs: vec![Epoch::new(2004, 2005), Epoch::new(2005, 2006)],
        ..Config::default()
    }
    .with_work_dir(work_dir)
}

/// ERA5-like source lattice: latitudes descending, 0.25° spacing
pub fn era5_latitudes() -> Vec<f64> {
    vec![20.5, 20.25, 20.0, 19.75]
}

pub fn era5_longitudes() -> Vec<f64> {
    vec![99.75, 100.0, 100.25, 100.5]
}

/// Write one gridded variable the way ERA5 downloads look: `valid_time` in
/// seconds since 1970, then latitude and longitude
pub fn write_era5(
    path: &Path,
    variable: &str,
    units: &str,
    times: &[NaiveDateTime],
    value: impl Fn(usize, f64, f64) -> f32,
) {
    write_grid(
        path,
        ("valid_time", "seconds since 1970-01-01", 1.0),
        variable,
        units,
        times,
        &era5_latitudes(),
        &era5_longitudes(),
        value,
    );
}

/// Write one CHIRPS-like daily file: latitudes ascending at 0.05°
pub fn write_chirps(path: &Path, times: &[NaiveDateTime], value: impl Fn(usize, f64, f64) -> f32) {
    let lats: Vec<f64> = (0..8).map(|i| 19.95 + 0.05 * i as f64).collect();
    let lons: Vec<f64> = (0..8).map(|i| 99.95 + 0.05 * i as f64).collect();
    write_grid(
        path,
        ("time", "days since 1980-01-01 00:00:00", 86400.0),
        "precip",
        "mm/day",
        times,
        &lats,
        &lons,
        value,
    );
}

#[allow(clippy::too_many_arguments)]
fn write_grid(
    path: &Path,
    time: (&str, &str, f64),
    variable: &str,
    units: &str,
    times: &[NaiveDateTime],
    lats: &[f64],
    lons: &[f64],
    value: impl Fn(usize, f64, f64) -> f32,
) {
    let (time_name, time_units, seconds_per_step) = time;
    let reference = if time_units.contains("1980") {
        dt(1980, 1, 1, 0)
    } else {
        dt(1970, 1, 1, 0)
    };

    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut file = netcdf::create(path).unwrap();
    file.add_dimension(time_name, times.len()).unwrap();
    file.add_dimension("latitude", lats.len()).unwrap();
    file.add_dimension("longitude", lons.len()).unwrap();

    let encoded: Vec<f64> = times
        .iter()
        .map(|t| (*t - reference).num_seconds() as f64 / seconds_per_step)
        .collect();
    let mut var = file.add_variable::<f64>(time_name, &[time_name]).unwrap();
    var.put_attribute("units", time_units).unwrap();
    var.put_values(&encoded, ..).unwrap();

    let mut var = file.add_variable::<f64>("latitude", &["latitude"]).unwrap();
    var.put_values(lats, ..).unwrap();
    let mut var = file.add_variable::<f64>("longitude", &["longitude"]).unwrap();
    var.put_values(lons, ..).unwrap();

    let mut data = Vec::with_capacity(times.len() * lats.len() * lons.len());
    for t in 0..times.len() {
        for lat in lats {
            for lon in lons {
                data.push(value(t, *lat, *lon));
            }
        }
    }
    let mut var = file
        .add_variable::<f32>(variable, &[time_name, "latitude", "longitude"])
        .unwrap();
    var.put_attribute("units", units).unwrap();
    var.put_values(&data, ..).unwrap();
}
