//! Time-indexed demand series.

use chrono::NaiveDateTime;

use crate::error::{DemandError, Result};

/// An ordered hourly (or resampled) demand series.
///
/// Timestamps are strictly increasing and parallel to values. Demand is in
/// MW at hourly granularity, or aggregated energy for coarser ones.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandSeries {
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl DemandSeries {
    /// Build a series from parallel timestamp/value vectors.
    ///
    /// # Returns
    /// The series, or `InvalidInput` if lengths differ or timestamps are
    /// not strictly increasing
    pub fn new(timestamps: Vec<NaiveDateTime>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(DemandError::InvalidInput(format!(
                "timestamps ({}) and values ({}) must have the same length",
                timestamps.len(),
                values.len()
            )));
        }
        if timestamps.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DemandError::InvalidInput(
                "timestamps must be strictly increasing".to_string(),
            ));
        }
        Ok(Self { timestamps, values })
    }

    /// An empty series.
    pub fn empty() -> Self {
        Self {
            timestamps: vec![],
            values: vec![],
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Most recent timestamp, if any.
    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }

    /// Keep only the most recent `n` points.
    pub fn tail(&self, n: usize) -> DemandSeries {
        let skip = self.len().saturating_sub(n);
        DemandSeries {
            timestamps: self.timestamps[skip..].to_vec(),
            values: self.values[skip..].to_vec(),
        }
    }

    /// Iterate over (timestamp, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}
