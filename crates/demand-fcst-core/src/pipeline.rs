//! One sequential training/evaluation run:
//! source → resample → features → split → fit → metrics → store.

use std::path::PathBuf;

use tracing::info;

use crate::error::{DemandError, Result};
use crate::features::build_features;
use crate::granularity::Granularity;
use crate::metrics::{compute_all, MetricsResult};
use crate::model::Regressor;
use crate::resample::{resample, Aggregator};
use crate::source::{hourly_demand, SourceKind, SourceOptions, SourceUsed};
use crate::split::split_temporal;
use crate::store::{OutputStore, PredictionRecord};

/// Options for one training run. Unset fields use granularity defaults.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub granularity: Granularity,
    /// Forecast horizon in periods (default: granularity-specific)
    pub horizon: Option<u32>,
    /// Days of hourly history (default: granularity-specific recommendation)
    pub days: Option<u32>,
    /// Test window in periods (default: granularity-specific)
    pub test_periods: Option<u32>,
    pub seed: u64,
    pub aggregator: Aggregator,
    pub source: SourceKind,
    /// Years to load for real data
    pub years: Option<Vec<i32>>,
    /// Directory holding settlement CSVs
    pub data_dir: Option<PathBuf>,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::Hourly,
            horizon: None,
            days: None,
            test_periods: None,
            seed: 42,
            aggregator: Aggregator::Sum,
            source: SourceKind::Auto,
            years: None,
            data_dir: None,
        }
    }
}

/// Summary of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub granularity: Granularity,
    pub model: String,
    pub horizon: u32,
    pub metrics: MetricsResult,
    pub source_used: SourceUsed,
    pub feature_names: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub metrics_path: PathBuf,
    pub preds_path: PathBuf,
}

/// Run the full pipeline for one (model, granularity, horizon) key and
/// persist its outputs.
pub fn run_training(
    opts: &TrainOptions,
    regressor: &mut dyn Regressor,
    store: &OutputStore,
) -> Result<TrainReport> {
    let config = opts.granularity.config();
    let horizon = opts.horizon.unwrap_or(config.default_horizon);
    let n_days = opts.days.unwrap_or_else(|| opts.granularity.recommended_days());
    let test_periods = opts.test_periods.unwrap_or(config.default_test_periods);

    info!(
        granularity = config.name,
        model = regressor.name(),
        horizon,
        n_days,
        "starting training run"
    );

    let source_opts = SourceOptions {
        kind: opts.source,
        n_days: Some(n_days),
        years: opts.years.clone(),
        seed: opts.seed,
        data_dir: opts.data_dir.clone(),
    };
    let (hourly, source_used) = hourly_demand(&source_opts)?;

    let series = resample(&hourly, opts.granularity, opts.aggregator)?;
    let table = build_features(&series, opts.granularity)?;
    if table.is_empty() {
        return Err(DemandError::NoDataAvailable(format!(
            "no rows left after feature engineering at {} granularity ({} input points)",
            config.name,
            series.len()
        )));
    }

    let (train, test) = split_temporal(&table, test_periods, opts.granularity)?;
    if train.is_empty() || test.is_empty() {
        return Err(DemandError::NoDataAvailable(format!(
            "degenerate split: {} train rows, {} test rows",
            train.len(),
            test.len()
        )));
    }
    info!(train_rows = train.len(), test_rows = test.len(), "split complete");

    regressor.fit(train.columns(), train.target())?;
    let predicted = regressor.predict(test.columns())?;
    let metrics = compute_all(test.target(), &predicted)?;

    let predictions: Vec<PredictionRecord> = test
        .timestamps()
        .iter()
        .zip(test.target().iter().zip(predicted.iter()))
        .map(|(&ts, (&actual, &pred))| PredictionRecord::new(ts, actual, pred))
        .collect();

    let (metrics_path, preds_path) = store.save(
        opts.granularity,
        regressor.name(),
        horizon,
        &metrics,
        &predictions,
    )?;
    info!(mae = metrics.mae, rmse = metrics.rmse, "training run complete");

    Ok(TrainReport {
        granularity: opts.granularity,
        model: regressor.name().to_string(),
        horizon,
        metrics,
        source_used,
        feature_names: table.feature_names().to_vec(),
        train_rows: train.len(),
        test_rows: test.len(),
        metrics_path,
        preds_path,
    })
}
