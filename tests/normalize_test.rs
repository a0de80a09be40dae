mod common;

use chrono::{Duration, NaiveDate, Timelike};
use common::*;
use tempfile::TempDir;
use vic_forcing::data_io::common::{artifact_path, era5_filename};
use vic_forcing::data_io::NetCDFReader;
use vic_forcing::normalize::{self, Unit};
use vic_forcing::PrepError;

fn year_2005() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2005, 12, 31).unwrap(),
    )
}

fn day_one() -> (NaiveDate, NaiveDate) {
    let d = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap();
    (d, d)
}

#[test]
fn test_temperature_two_half_years() {
    let dir = TempDir::new().unwrap();
    let (start, end) = year_2005();
    let config = test_config(dir.path(), start, end);
    let raw_dir = config.download_dir("temperature");

    let first = six_hourly(dt(2004, 12, 31, 0), dt(2005, 6, 30, 18));
    let second = six_hourly(dt(2005, 7, 1, 0), dt(2005, 12, 31, 18));
    write_era5(&raw_dir.join(era5_filename("t2m", &config.era5_epochs[0])), "t2m", "K", &first, |_, _, _| 300.0);
    write_era5(&raw_dir.join(era5_filename("t2m", &config.era5_epochs[1])), "t2m", "K", &second, |_, _, _| 300.0);

    let written = normalize::run(&config, Unit::Temperature).unwrap();
    assert_eq!(written, vec![artifact_path(&config, "t2m")]);

    let t2m = NetCDFReader::new(&written[0]).read_field("t2m").unwrap();
    assert_eq!(t2m.units, "degC");
    assert_eq!(t2m.latitudes, vec![20.0, 20.125, 20.25]);
    assert_eq!(t2m.longitudes, vec![100.0, 100.125, 100.25]);

    // 18:00 UTC on Dec 31 is the first step inside the local window
    assert_eq!(t2m.times.first().copied(), Some(dt(2005, 1, 1, 1)));
    assert_eq!(t2m.times.last().copied(), Some(dt(2005, 12, 31, 19)));
    assert_eq!(t2m.times.len(), 1460);
    assert!(t2m.times.windows(2).all(|w| w[1] - w[0] == Duration::hours(6)));
    assert!(t2m.data.iter().all(|v| (*v - 26.85).abs() < 1e-4));
}

#[test]
fn test_wind_speed_from_components() {
    let dir = TempDir::new().unwrap();
    let (start, end) = day_one();
    let config = test_config(dir.path(), start, end);
    let raw_dir = config.download_dir("wind_speed");

    let first = six_hourly(dt(2004, 12, 31, 0), dt(2004, 12, 31, 18));
    let second = six_hourly(dt(2005, 1, 1, 0), dt(2005, 1, 2, 18));
    for (epoch, times) in config.era5_epochs.iter().zip([&first, &second]) {
        write_era5(&raw_dir.join(era5_filename("u10", epoch)), "u10", "m s**-1", times, |_, _, _| 3.0);
        write_era5(&raw_dir.join(era5_filename("v10", epoch)), "v10", "m s**-1", times, |_, _, _| 4.0);
    }

    let written = normalize::run(&config, Unit::WindSpeed).unwrap();
    let w10 = NetCDFReader::new(&written[0]).read_field("w10").unwrap();
    assert_eq!(w10.times.len(), 4);
    assert!(w10.times.iter().all(|t| t.hour() % 6 == 1));
    assert!(w10.data.iter().all(|v| *v == 5.0));
}

#[test]
fn test_descending_latitudes_are_sorted_and_regridded() {
    let dir = TempDir::new().unwrap();
    let (start, end) = day_one();
    let config = test_config(dir.path(), start, end);
    let raw_dir = config.download_dir("radiation");

    let first = six_hourly(dt(2004, 12, 31, 0), dt(2004, 12, 31, 18));
    let second = six_hourly(dt(2005, 1, 1, 0), dt(2005, 1, 1, 18));
    for (epoch, times) in config.era5_epochs.iter().zip([&first, &second]) {
        for (short, name) in [("sdswrf", "avg_sdswrf"), ("sdlwrf", "avg_sdlwrf")] {
            write_era5(&raw_dir.join(era5_filename(short, epoch)), name, "W m**-2", times, |_, lat, lon| {
                (lat * 10.0 + (lon - 100.0)) as f32
            });
        }
    }

    let written = normalize::run(&config, Unit::Radiation).unwrap();
    assert_eq!(written.len(), 2);

    let sw = NetCDFReader::new(&written[0]).read_field("avg_sdswrf").unwrap();
    assert!(sw.latitudes.windows(2).all(|w| w[0] <= w[1]));
    // Half way between 20.0 and 20.25 goes to the lower node
    for (j, expected) in [200.0, 200.0, 202.5].into_iter().enumerate() {
        assert!((sw.data[[0, j, 0]] - expected).abs() < 1e-4, "row {}", j);
    }
    assert!((sw.data[[0, 2, 2]] - 202.75).abs() < 1e-4);
}

#[test]
fn test_precipitation_expanded_to_six_hourly() {
    let dir = TempDir::new().unwrap();
    let start = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2005, 1, 3).unwrap();
    let config = test_config(dir.path(), start, end);

    let days: Vec<_> = (1..=5).map(|d| dt(2005, 1, d, 0)).collect();
    write_chirps(
        &config.download_dir("precipitation").join("chirps-v2.0.2005.days_p05.nc"),
        &days,
        |t, _, _| (t as f32 + 1.0) * 1.5,
    );

    let written = normalize::run(&config, Unit::Precipitation).unwrap();
    let precip = NetCDFReader::new(&written[0]).read_field("precip").unwrap();

    assert_eq!(precip.times.first().copied(), Some(dt(2005, 1, 1, 0)));
    assert_eq!(precip.times.last().copied(), Some(dt(2005, 1, 3, 18)));
    assert_eq!(precip.times.len(), 12);
    for (k, t) in precip.times.iter().enumerate() {
        let expected = if t.hour() == 18 { (k / 4) as f32 * 1.5 + 1.5 } else { 0.0 };
        assert!(precip.data.index_axis(ndarray::Axis(0), k).iter().all(|v| *v == expected), "step {}", t);
    }
}

#[test]
fn test_missing_input_leaves_no_artifact() {
    let dir = TempDir::new().unwrap();
    let (start, end) = day_one();
    let config = test_config(dir.path(), start, end);

    let err = normalize::run(&config, Unit::AtmospherePressure).unwrap_err();
    assert!(matches!(err, PrepError::Unit { ref unit, .. } if unit == "atmosphere_pressure"));
    assert!(err.to_string().contains("era5_sp_2004-2005.nc"), "{}", err);
    assert!(!artifact_path(&config, "sp").exists());
}
