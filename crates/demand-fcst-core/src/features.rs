//! Granularity-specific feature engineering.
//!
//! Each granularity has its own recipe of calendar, lag and rolling-window
//! features:
//!
//! | Granularity | Calendar                            | Lags                   | Rolling                    |
//! |-------------|-------------------------------------|------------------------|----------------------------|
//! | Hourly      | hour, dow, month                    | lag_1, lag_24, lag_168 | roll_24_mean               |
//! | Daily       | dow, month, day_of_year, is_weekend | lag_1, lag_7           | roll_7_mean, roll_30_mean  |
//! | Weekly      | week_of_year, month, quarter        | lag_1, lag_4, lag_52   | roll_4_mean                |
//! | Monthly     | month, quarter                      | lag_1, lag_12          | roll_3_mean, roll_12_mean  |
//! | Yearly      | (none)                              | lag_1                  | roll_2_mean                |
//!
//! Rolling windows are shifted by one period before being applied, so a
//! feature at row *t* only ever sees demand strictly before *t*. Rows that
//! lack the full lag/window history are dropped.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::Result;
use crate::granularity::Granularity;
use crate::series::DemandSeries;

/// A feature table: a demand series extended with derived columns.
///
/// Columns are stored column-major and aligned with `timestamps`; only
/// rows with every feature defined survive construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    timestamps: Vec<NaiveDateTime>,
    target: Vec<f64>,
    feature_names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    /// Target (demand) values, one per row.
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Column-major feature matrix, one inner vector per feature.
    pub fn columns(&self) -> &[Vec<f64>] {
        &self.columns
    }

    /// Values of a single named feature column.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// New table keeping only rows whose timestamp satisfies the predicate.
    pub(crate) fn filter_rows<F: Fn(NaiveDateTime) -> bool>(&self, keep: F) -> FeatureTable {
        let idx: Vec<usize> = (0..self.len())
            .filter(|&i| keep(self.timestamps[i]))
            .collect();
        FeatureTable {
            timestamps: idx.iter().map(|&i| self.timestamps[i]).collect(),
            target: idx.iter().map(|&i| self.target[i]).collect(),
            feature_names: self.feature_names.clone(),
            columns: self
                .columns
                .iter()
                .map(|col| idx.iter().map(|&i| col[i]).collect())
                .collect(),
        }
    }
}

/// A derived column under construction; `None` marks unavailable history.
struct PendingColumn {
    name: String,
    values: Vec<Option<f64>>,
}

impl PendingColumn {
    fn calendar<F: Fn(NaiveDateTime) -> f64>(
        name: &str,
        timestamps: &[NaiveDateTime],
        f: F,
    ) -> Self {
        Self {
            name: name.to_string(),
            values: timestamps.iter().map(|&ts| Some(f(ts))).collect(),
        }
    }
}

/// Target shifted back by `periods`; the first `periods` rows have no history.
fn lag_column(target: &[f64], periods: usize) -> PendingColumn {
    let values = (0..target.len())
        .map(|i| i.checked_sub(periods).map(|j| target[j]))
        .collect();
    PendingColumn {
        name: format!("lag_{periods}"),
        values,
    }
}

/// Trailing-window mean over the target, shifted by one period first.
///
/// The value at row *i* is the mean of `target[i-window .. i]`, so the
/// window never includes the current or any future period.
fn rolling_mean_column(target: &[f64], window: usize) -> PendingColumn {
    let values = (0..target.len())
        .map(|i| {
            i.checked_sub(window)
                .map(|start| target[start..i].iter().sum::<f64>() / window as f64)
        })
        .collect();
    PendingColumn {
        name: format!("roll_{window}_mean"),
        values,
    }
}

fn quarter_of(ts: NaiveDateTime) -> f64 {
    ((ts.month() - 1) / 3 + 1) as f64
}

fn hourly_columns(timestamps: &[NaiveDateTime], target: &[f64]) -> Vec<PendingColumn> {
    vec![
        PendingColumn::calendar("hour", timestamps, |ts| ts.hour() as f64),
        PendingColumn::calendar("dow", timestamps, |ts| {
            ts.weekday().num_days_from_monday() as f64
        }),
        PendingColumn::calendar("month", timestamps, |ts| ts.month() as f64),
        lag_column(target, 1),
        lag_column(target, 24),
        lag_column(target, 168), // 1 week
        rolling_mean_column(target, 24),
    ]
}

fn daily_columns(timestamps: &[NaiveDateTime], target: &[f64]) -> Vec<PendingColumn> {
    vec![
        PendingColumn::calendar("dow", timestamps, |ts| {
            ts.weekday().num_days_from_monday() as f64
        }),
        PendingColumn::calendar("month", timestamps, |ts| ts.month() as f64),
        PendingColumn::calendar("day_of_year", timestamps, |ts| ts.ordinal() as f64),
        PendingColumn::calendar("is_weekend", timestamps, |ts| {
            if ts.weekday().num_days_from_monday() >= 5 {
                1.0
            } else {
                0.0
            }
        }),
        lag_column(target, 1),
        lag_column(target, 7),
        rolling_mean_column(target, 7),
        rolling_mean_column(target, 30),
    ]
}

fn weekly_columns(timestamps: &[NaiveDateTime], target: &[f64]) -> Vec<PendingColumn> {
    let mut cols = vec![
        PendingColumn::calendar("week_of_year", timestamps, |ts| {
            ts.iso_week().week() as f64
        }),
        PendingColumn::calendar("month", timestamps, |ts| ts.month() as f64),
        PendingColumn::calendar("quarter", timestamps, quarter_of),
        lag_column(target, 1),
        lag_column(target, 4),
    ];

    // lag_52 needs more than a year of weeks; otherwise fall back to the
    // largest feasible lag, but only when it beats the lag_4 already present
    if target.len() > 52 {
        cols.push(lag_column(target, 52));
    } else {
        let max_lag = target.len().saturating_sub(1).min(52);
        if max_lag > 4 {
            cols.push(lag_column(target, max_lag));
        }
    }

    cols.push(rolling_mean_column(target, 4));
    cols
}

fn monthly_columns(timestamps: &[NaiveDateTime], target: &[f64]) -> Vec<PendingColumn> {
    let mut cols = vec![
        PendingColumn::calendar("month", timestamps, |ts| ts.month() as f64),
        PendingColumn::calendar("quarter", timestamps, quarter_of),
        lag_column(target, 1),
    ];

    if target.len() > 12 {
        cols.push(lag_column(target, 12));
    } else {
        let max_lag = target.len().saturating_sub(1).min(12);
        if max_lag > 1 {
            cols.push(lag_column(target, max_lag));
        }
    }

    cols.push(rolling_mean_column(target, 3));
    if target.len() > 12 {
        cols.push(rolling_mean_column(target, 12));
    }
    cols
}

fn yearly_columns(_timestamps: &[NaiveDateTime], target: &[f64]) -> Vec<PendingColumn> {
    // Minimal features: yearly series are short
    let mut cols = vec![lag_column(target, 1)];
    if target.len() > 2 {
        cols.push(rolling_mean_column(target, 2));
    }
    cols
}

/// Build the feature table for a series at the given granularity.
///
/// Calendar features come first, then lags, then rolling means; rows with
/// any undefined feature are dropped at the end. With too little history
/// for the longest lag the result is an empty table, not an error.
pub fn build_features(series: &DemandSeries, granularity: Granularity) -> Result<FeatureTable> {
    let timestamps = series.timestamps();
    let target = series.values();

    let pending = match granularity {
        Granularity::Hourly => hourly_columns(timestamps, target),
        Granularity::Daily => daily_columns(timestamps, target),
        Granularity::Weekly => weekly_columns(timestamps, target),
        Granularity::Monthly => monthly_columns(timestamps, target),
        Granularity::Yearly => yearly_columns(timestamps, target),
    };

    // Keep only rows with every feature defined
    let keep: Vec<usize> = (0..series.len())
        .filter(|&i| pending.iter().all(|col| col.values[i].is_some()))
        .collect();

    let feature_names = pending.iter().map(|c| c.name.clone()).collect();
    let columns = pending
        .iter()
        .map(|col| {
            keep.iter()
                .map(|&i| col.values[i].unwrap_or_default())
                .collect()
        })
        .collect();

    Ok(FeatureTable {
        timestamps: keep.iter().map(|&i| timestamps[i]).collect(),
        target: keep.iter().map(|&i| target[i]).collect(),
        feature_names,
        columns,
    })
}

/// Canonical feature column names expected for a granularity.
///
/// Short-history fallback lags (e.g. `lag_30` standing in for `lag_52`)
/// are not listed here; they appear only in the built table.
pub fn feature_columns(granularity: Granularity) -> Vec<&'static str> {
    match granularity {
        Granularity::Hourly => vec![
            "hour",
            "dow",
            "month",
            "lag_1",
            "lag_24",
            "lag_168",
            "roll_24_mean",
        ],
        Granularity::Daily => vec![
            "dow",
            "month",
            "day_of_year",
            "is_weekend",
            "lag_1",
            "lag_7",
            "roll_7_mean",
            "roll_30_mean",
        ],
        Granularity::Weekly => vec![
            "week_of_year",
            "month",
            "quarter",
            "lag_1",
            "lag_4",
            "lag_52",
            "roll_4_mean",
        ],
        Granularity::Monthly => vec![
            "month",
            "quarter",
            "lag_1",
            "lag_12",
            "roll_3_mean",
            "roll_12_mean",
        ],
        Granularity::Yearly => vec!["lag_1", "roll_2_mean"],
    }
}
