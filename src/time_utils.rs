use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Reference used when writing artifacts
pub const OUTPUT_TIME_UNITS: &str = "hours since 1970-01-01 00:00:00";

/// Unit part of a CF time encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeStep {
    fn seconds(self) -> f64 {
        match self {
            TimeStep::Seconds => 1.0,
            TimeStep::Minutes => 60.0,
            TimeStep::Hours => 3600.0,
            TimeStep::Days => 86400.0,
        }
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeStep::Seconds => "seconds",
            TimeStep::Minutes => "minutes",
            TimeStep::Hours => "hours",
            TimeStep::Days => "days",
        };
        write!(f, "{}", name)
    }
}

/// CF-style time encoding, `<step> since <reference>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    pub step: TimeStep,
    pub reference: NaiveDateTime,
}

impl TimeUnits {
    /// Parse strings such as `hours since 1900-01-01 00:00:00.0`,
    /// `seconds since 1970-01-01` or `days since 1980-1-1 0:0:0`
    pub fn parse(units: &str) -> Result<Self, String> {
        let mut parts = units.trim().splitn(3, ' ');
        let step = match parts.next().map(|s| s.to_ascii_lowercase()).as_deref() {
            Some("second" | "seconds" | "s" | "sec" | "secs") => TimeStep::Seconds,
            Some("minute" | "minutes" | "min" | "mins") => TimeStep::Minutes,
            Some("hour" | "hours" | "h" | "hr" | "hrs") => TimeStep::Hours,
            Some("day" | "days" | "d") => TimeStep::Days,
            _ => return Err(format!("Unsupported time step in units '{}'", units)),
        };
        if parts.next().map(|s| s.to_ascii_lowercase()).as_deref() != Some("since") {
            return Err(format!("Expected '<step> since <date>', got '{}'", units));
        }
        let reference = parts
            .next()
            .ok_or_else(|| format!("Missing reference date in units '{}'", units))?;
        let reference = parse_reference(reference)
            .ok_or_else(|| format!("Invalid reference date in units '{}'", units))?;
        Ok(Self { step, reference })
    }

    /// Decode one raw coordinate value. Sub-second parts are rounded to
    /// whole seconds. `None` for non-finite or out-of-range values.
    pub fn decode(&self, value: f64) -> Option<NaiveDateTime> {
        let seconds = (value * self.step.seconds()).round();
        if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
            return None;
        }
        let delta = Duration::try_seconds(seconds as i64)?;
        self.reference.checked_add_signed(delta)
    }

    pub fn encode(&self, datetime: &NaiveDateTime) -> f64 {
        let seconds = (*datetime - self.reference).num_seconds() as f64;
        seconds / self.step.seconds()
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} since {}",
            self.step,
            self.reference.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

fn parse_reference(text: &str) -> Option<NaiveDateTime> {
    // Drop a trailing zone designator; sources here are all UTC
    let text = text
        .trim()
        .trim_end_matches(" UTC")
        .trim_end_matches('Z')
        .replace('T', " ");
    let mut pieces = text.split_whitespace();
    let date = pieces.next()?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let time = match pieces.next() {
        None => NaiveTime::MIN,
        Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
            .ok()?,
    };
    Some(date.and_time(time))
}

/// Move every timestamp by a fixed number of hours
pub fn shift_hours(times: &[NaiveDateTime], hours: i64) -> Vec<NaiveDateTime> {
    let offset = Duration::hours(hours);
    times.iter().map(|t| *t + offset).collect()
}

/// Indices of timestamps inside `[start, end)`
pub fn window_indices(
    times: &[NaiveDateTime],
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Vec<usize> {
    times
        .iter()
        .enumerate()
        .filter(|(_, t)| **t >= start && **t < end)
        .map(|(i, _)| i)
        .collect()
}

/// Midnight of the day a timestamp falls on
pub fn floor_day(datetime: &NaiveDateTime) -> NaiveDateTime {
    datetime.date().and_time(NaiveTime::MIN)
}

/// Regular axis from `start` to `end` inclusive
pub fn regular_axis(start: NaiveDateTime, end: NaiveDateTime, step: Duration) -> Vec<NaiveDateTime> {
    let mut axis = Vec::new();
    let mut t = start;
    while t <= end {
        axis.push(t);
        t += step;
    }
    axis
}

/// Position of the first pair that is not strictly increasing, if any
pub fn first_non_increasing(times: &[NaiveDateTime]) -> Option<usize> {
    times.windows(2).position(|w| w[0] >= w[1]).map(|i| i + 1)
}
