//! Core library for multi-granularity electricity demand forecasting.
//!
//! This crate implements the training-side pipeline: hourly demand
//! sourcing (synthetic or real settlement data), lossless resampling to
//! five granularities, granularity-specific feature engineering,
//! leakage-free temporal splitting, evaluation metrics and the persisted
//! output store consumed by the query layer.

pub mod aggregate;
pub mod error;
pub mod features;
pub mod granularity;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod resample;
pub mod series;
pub mod source;
pub mod split;
pub mod store;

// Re-exports for convenience
pub use aggregate::{aggregate_predictions, AggregatedDocument};
pub use error::{DemandError, Result};
pub use features::{build_features, feature_columns, FeatureTable};
pub use granularity::{Granularity, GranularityConfig};
pub use metrics::{compute_all, mae, mape, rmse, smape, MetricsResult};
pub use model::{LinearRegressor, Regressor};
pub use pipeline::{run_training, TrainOptions, TrainReport};
pub use resample::{resample, Aggregator};
pub use series::DemandSeries;
pub use source::{
    hourly_demand, load_real_demand, synthetic_hourly_demand, SourceKind, SourceOptions,
    SourceUsed,
};
pub use split::split_temporal;
pub use store::{
    AvailableModel, FileType, MetricsDocument, OutputStore, PredictionRecord,
    PredictionsDocument,
};
