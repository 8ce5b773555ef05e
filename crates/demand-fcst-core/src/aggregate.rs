//! On-the-fly aggregation of stored hourly predictions.
//!
//! Gives a quick coarse-granularity view of an hourly prediction series
//! without retraining at the target granularity. Buckets follow the same
//! calendar rules as the resampler.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{DemandError, Result};
use crate::granularity::Granularity;
use crate::metrics::round2;
use crate::resample::{bucket_start, Aggregator};
use crate::store::{format_timestamp, PredictionRecord, PredictionsDocument};

/// Result of aggregating an hourly predictions artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedDocument {
    pub model: String,
    pub source_granularity: String,
    pub source_horizon: u32,
    pub target_granularity: String,
    pub target_granularity_name: String,
    pub aggregation: String,
    pub note: String,
    pub series: Vec<PredictionRecord>,
}

/// Aggregate an hourly predictions document to a coarser granularity.
///
/// Only `sum` and `mean` reducers are supported here; natively trained
/// models at the target granularity remain the accurate option.
///
/// # Errors
/// `InvalidInput` for an hourly target, `InvalidAggregator` for an
/// unsupported reducer, `NoDataAvailable` for an empty series
pub fn aggregate_predictions(
    doc: &PredictionsDocument,
    target: Granularity,
    aggregator: Aggregator,
) -> Result<AggregatedDocument> {
    if target == Granularity::Hourly {
        return Err(DemandError::InvalidInput(
            "target granularity must be coarser than hourly (D, W, M, Y)".to_string(),
        ));
    }
    if !matches!(aggregator, Aggregator::Sum | Aggregator::Mean) {
        return Err(DemandError::InvalidAggregator(format!(
            "{} (aggregation-on-read supports sum and mean)",
            aggregator.name()
        )));
    }
    if doc.series.is_empty() {
        return Err(DemandError::NoDataAvailable(
            "no prediction data found".to_string(),
        ));
    }

    let mut rows: Vec<(NaiveDateTime, f64, f64)> = doc
        .series
        .iter()
        .map(|r| Ok((r.timestamp()?, r.actual, r.predicted)))
        .collect::<Result<_>>()?;
    rows.sort_by_key(|(ts, _, _)| *ts);

    let mut series = Vec::new();
    let mut current: Option<NaiveDateTime> = None;
    let mut actuals: Vec<f64> = Vec::new();
    let mut predicted: Vec<f64> = Vec::new();
    let flush =
        |bucket: NaiveDateTime, actuals: &mut Vec<f64>, predicted: &mut Vec<f64>, out: &mut Vec<PredictionRecord>| {
            if !actuals.is_empty() {
                out.push(PredictionRecord {
                    t: format_timestamp(bucket),
                    actual: round2(aggregator.reduce(actuals)),
                    predicted: round2(aggregator.reduce(predicted)),
                });
                actuals.clear();
                predicted.clear();
            }
        };

    for (ts, actual, pred) in rows {
        let bucket = bucket_start(ts, target);
        if current != Some(bucket) {
            if let Some(prev) = current {
                flush(prev, &mut actuals, &mut predicted, &mut series);
            }
            current = Some(bucket);
        }
        actuals.push(actual);
        predicted.push(pred);
    }
    if let Some(prev) = current {
        flush(prev, &mut actuals, &mut predicted, &mut series);
    }

    let target_config = target.config();
    Ok(AggregatedDocument {
        model: doc.model.clone(),
        source_granularity: doc.granularity.clone(),
        source_horizon: doc.horizon,
        target_granularity: target_config.code.to_string(),
        target_granularity_name: target_config.name.to_string(),
        aggregation: aggregator.name().to_string(),
        note: "On-the-fly aggregation of hourly predictions. For better accuracy, \
               use natively trained models."
            .to_string(),
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn hourly_doc(hours: usize) -> PredictionsDocument {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let series = (0..hours)
            .map(|h| {
                PredictionRecord::new(
                    start + Duration::hours(h as i64),
                    100.0,
                    110.0,
                )
            })
            .collect();
        PredictionsDocument {
            model: "linear".to_string(),
            granularity: "H".to_string(),
            granularity_name: "hourly".to_string(),
            horizon: 24,
            series,
        }
    }

    #[test]
    fn test_daily_sum() {
        let doc = hourly_doc(48);
        let agg = aggregate_predictions(&doc, Granularity::Daily, Aggregator::Sum).unwrap();
        assert_eq!(agg.series.len(), 2);
        assert_relative_eq!(agg.series[0].actual, 2400.0);
        assert_relative_eq!(agg.series[0].predicted, 2640.0);
        assert_eq!(agg.series[0].t, "2026-01-01T00:00:00Z");
        assert_eq!(agg.target_granularity, "D");
        assert_eq!(agg.target_granularity_name, "daily");
        assert_eq!(agg.source_granularity, "H");
    }

    #[test]
    fn test_daily_mean() {
        let doc = hourly_doc(48);
        let agg = aggregate_predictions(&doc, Granularity::Daily, Aggregator::Mean).unwrap();
        assert_relative_eq!(agg.series[0].actual, 100.0);
        assert_relative_eq!(agg.series[1].predicted, 110.0);
        assert_eq!(agg.aggregation, "mean");
    }

    #[test]
    fn test_hourly_target_rejected() {
        let doc = hourly_doc(24);
        assert!(matches!(
            aggregate_predictions(&doc, Granularity::Hourly, Aggregator::Sum).unwrap_err(),
            DemandError::InvalidInput(_)
        ));
    }

    #[test]
    fn test_max_min_rejected() {
        let doc = hourly_doc(24);
        assert!(matches!(
            aggregate_predictions(&doc, Granularity::Daily, Aggregator::Max).unwrap_err(),
            DemandError::InvalidAggregator(_)
        ));
    }

    #[test]
    fn test_empty_series() {
        let mut doc = hourly_doc(0);
        doc.series.clear();
        assert!(matches!(
            aggregate_predictions(&doc, Granularity::Weekly, Aggregator::Sum).unwrap_err(),
            DemandError::NoDataAvailable(_)
        ));
    }
}
