//! Resampling of hourly demand to coarser granularities.
//!
//! Buckets are calendar-aligned: daily buckets run midnight-to-midnight,
//! weekly buckets Monday-to-Monday, monthly buckets start at the first of
//! the month and yearly buckets at January 1st. Buckets with no
//! contributing points are omitted rather than zero-filled.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};

use crate::error::{DemandError, Result};
use crate::granularity::Granularity;
use crate::series::DemandSeries;

/// Aggregation function used to reduce each bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregator {
    /// Energy-additive reduction (MWh-style totals)
    Sum,
    /// Rate-like reduction (average MW)
    Mean,
    Max,
    Min,
}

impl Aggregator {
    /// Parse an aggregator name (case-insensitive).
    ///
    /// # Returns
    /// The aggregator, or `InvalidAggregator` for anything outside
    /// {sum, mean, max, min}
    pub fn from_name(name: &str) -> Result<Aggregator> {
        match name.to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregator::Sum),
            "mean" => Ok(Aggregator::Mean),
            "max" => Ok(Aggregator::Max),
            "min" => Ok(Aggregator::Min),
            other => Err(DemandError::InvalidAggregator(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Aggregator::Sum => "sum",
            Aggregator::Mean => "mean",
            Aggregator::Max => "max",
            Aggregator::Min => "min",
        }
    }

    /// Reduce a non-empty bucket of values.
    pub(crate) fn reduce(&self, values: &[f64]) -> f64 {
        match self {
            Aggregator::Sum => values.iter().sum(),
            Aggregator::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Aggregator::Max => values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            Aggregator::Min => values.iter().cloned().fold(f64::INFINITY, f64::min),
        }
    }
}

/// Truncate a datetime to midnight of the same day.
fn start_of_day(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_hour(0)
        .unwrap_or(dt)
        .with_minute(0)
        .unwrap_or(dt)
        .with_second(0)
        .unwrap_or(dt)
        .with_nanosecond(0)
        .unwrap_or(dt)
}

/// Get the Monday midnight on or before the given datetime.
fn start_of_week(dt: NaiveDateTime) -> NaiveDateTime {
    let day = start_of_day(dt);
    day - Duration::days(dt.weekday().num_days_from_monday() as i64)
}

/// Get the start of month for a given datetime (first day at midnight).
fn start_of_month(dt: NaiveDateTime) -> NaiveDateTime {
    start_of_day(dt.with_day(1).unwrap_or(dt))
}

/// Get the start of year for a given datetime (January 1st at midnight).
fn start_of_year(dt: NaiveDateTime) -> NaiveDateTime {
    start_of_month(dt.with_month(1).unwrap_or(dt))
}

/// Calendar-aligned bucket start for a timestamp at the given granularity.
pub(crate) fn bucket_start(dt: NaiveDateTime, granularity: Granularity) -> NaiveDateTime {
    match granularity {
        Granularity::Hourly => dt
            .with_minute(0)
            .unwrap_or(dt)
            .with_second(0)
            .unwrap_or(dt)
            .with_nanosecond(0)
            .unwrap_or(dt),
        Granularity::Daily => start_of_day(dt),
        Granularity::Weekly => start_of_week(dt),
        Granularity::Monthly => start_of_month(dt),
        Granularity::Yearly => start_of_year(dt),
    }
}

/// Resample an hourly series to a target granularity.
///
/// Hourly input is assumed sorted (a `DemandSeries` invariant), so buckets
/// are contiguous runs. The hourly target is an identity copy.
///
/// # Arguments
/// * `series` - Hourly demand series
/// * `granularity` - Target granularity
/// * `aggregator` - Reduction applied to each bucket
///
/// # Returns
/// A new series with one point per non-empty calendar bucket
pub fn resample(
    series: &DemandSeries,
    granularity: Granularity,
    aggregator: Aggregator,
) -> Result<DemandSeries> {
    if granularity == Granularity::Hourly {
        return Ok(series.clone());
    }

    let mut out_ts: Vec<NaiveDateTime> = Vec::new();
    let mut out_vals: Vec<f64> = Vec::new();
    let mut current: Option<NaiveDateTime> = None;
    let mut bucket: Vec<f64> = Vec::new();

    for (ts, value) in series.iter() {
        let start = bucket_start(ts, granularity);
        match current {
            Some(cur) if cur == start => bucket.push(value),
            Some(cur) => {
                out_ts.push(cur);
                out_vals.push(aggregator.reduce(&bucket));
                bucket.clear();
                bucket.push(value);
                current = Some(start);
                debug_assert!(cur < start, "input series must be sorted");
            }
            None => {
                current = Some(start);
                bucket.push(value);
            }
        }
    }
    if let Some(cur) = current {
        out_ts.push(cur);
        out_vals.push(aggregator.reduce(&bucket));
    }

    DemandSeries::new(out_ts, out_vals)
}
