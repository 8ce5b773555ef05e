//! Filesystem-backed output store for metrics and prediction artifacts.
//!
//! One metrics file and one predictions file per (granularity, model,
//! horizon) key:
//!
//! ```text
//! outputs/
//! ├── hourly/
//! │   ├── metrics_linear_24.json
//! │   └── preds_linear_24.json
//! ├── daily/
//! │   ├── metrics_linear_7.json
//! │   └── preds_linear_7.json
//! └── metrics_linear_24.json      (legacy flat layout, hourly only)
//! ```
//!
//! Saves are wholesale: a second save with the same key replaces the
//! prior content. Missing keys load as `None`, never as an error; the
//! legacy flat namespace is a secondary lookup strategy for hourly data.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{DemandError, Result};
use crate::granularity::Granularity;
use crate::metrics::{round2, MetricsResult};

/// Format a timestamp as ISO-8601 UTC with a trailing `Z`.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Parse an ISO-8601 UTC timestamp as written by [`format_timestamp`].
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f"))
        .map_err(|e| DemandError::InvalidInput(format!("bad timestamp '{raw}': {e}")))
}

/// One test-set row in a predictions artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// ISO-8601 UTC timestamp
    pub t: String,
    pub actual: f64,
    pub predicted: f64,
}

impl PredictionRecord {
    pub fn new(ts: NaiveDateTime, actual: f64, predicted: f64) -> Self {
        Self {
            t: format_timestamp(ts),
            actual: round2(actual),
            predicted: round2(predicted),
        }
    }

    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        parse_timestamp(&self.t)
    }
}

/// Persisted metrics artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsDocument {
    pub model: String,
    pub granularity: String,
    pub granularity_name: String,
    pub horizon: u32,
    pub mae: f64,
    pub rmse: f64,
    pub smape: f64,
    pub mape: f64,
}

/// Persisted predictions artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionsDocument {
    pub model: String,
    pub granularity: String,
    pub granularity_name: String,
    pub horizon: u32,
    pub series: Vec<PredictionRecord>,
}

/// Kind of persisted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Metrics,
    Preds,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Metrics => "metrics",
            FileType::Preds => "preds",
        }
    }
}

/// An available (model, horizon) combination discovered by listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableModel {
    pub model: String,
    pub horizon: u32,
    /// True when the entry only exists in the legacy flat layout
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub legacy: bool,
}

/// Store rooted at an outputs directory.
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn folder(&self, granularity: Granularity) -> PathBuf {
        self.root.join(granularity.config().folder_name)
    }

    fn file_name(file_type: FileType, model: &str, horizon: u32) -> String {
        format!("{}_{model}_{horizon}.json", file_type.as_str())
    }

    /// Path of an artifact in the granularity-organized layout.
    pub fn output_path(
        &self,
        granularity: Granularity,
        file_type: FileType,
        model: &str,
        horizon: u32,
    ) -> PathBuf {
        self.folder(granularity)
            .join(Self::file_name(file_type, model, horizon))
    }

    /// Persist metrics and predictions for one training run.
    ///
    /// Overwrites any prior artifacts under the same (granularity, model,
    /// horizon) key.
    ///
    /// # Returns
    /// `(metrics_path, preds_path)`
    pub fn save(
        &self,
        granularity: Granularity,
        model: &str,
        horizon: u32,
        metrics: &MetricsResult,
        predictions: &[PredictionRecord],
    ) -> Result<(PathBuf, PathBuf)> {
        let config = granularity.config();
        let folder = self.folder(granularity);
        fs::create_dir_all(&folder)?;

        let metrics_doc = MetricsDocument {
            model: model.to_string(),
            granularity: config.code.to_string(),
            granularity_name: config.name.to_string(),
            horizon,
            mae: metrics.mae,
            rmse: metrics.rmse,
            smape: metrics.smape,
            mape: metrics.mape,
        };
        let preds_doc = PredictionsDocument {
            model: model.to_string(),
            granularity: config.code.to_string(),
            granularity_name: config.name.to_string(),
            horizon,
            series: predictions.to_vec(),
        };

        let metrics_path = folder.join(Self::file_name(FileType::Metrics, model, horizon));
        let preds_path = folder.join(Self::file_name(FileType::Preds, model, horizon));
        fs::write(&metrics_path, serde_json::to_string_pretty(&metrics_doc)?)?;
        fs::write(&preds_path, serde_json::to_string_pretty(&preds_doc)?)?;
        Ok((metrics_path, preds_path))
    }

    fn read_json(path: &Path) -> Result<Option<serde_json::Value>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Load an artifact from the granularity-organized layout.
    ///
    /// A missing key is `Ok(None)`, never an error.
    pub fn load(
        &self,
        granularity: Granularity,
        file_type: FileType,
        model: &str,
        horizon: u32,
    ) -> Result<Option<serde_json::Value>> {
        Self::read_json(&self.output_path(granularity, file_type, model, horizon))
    }

    /// Load an artifact from the legacy flat layout under the outputs root.
    pub fn load_legacy(
        &self,
        file_type: FileType,
        model: &str,
        horizon: u32,
    ) -> Result<Option<serde_json::Value>> {
        Self::read_json(&self.root.join(Self::file_name(file_type, model, horizon)))
    }

    /// Typed load of a predictions artifact.
    pub fn load_predictions(
        &self,
        granularity: Granularity,
        model: &str,
        horizon: u32,
    ) -> Result<Option<PredictionsDocument>> {
        match self.load(granularity, FileType::Preds, model, horizon)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Typed load of a metrics artifact.
    pub fn load_metrics(
        &self,
        granularity: Granularity,
        model: &str,
        horizon: u32,
    ) -> Result<Option<MetricsDocument>> {
        match self.load(granularity, FileType::Metrics, model, horizon)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Read an artifact for the query layer, applying the legacy fallback.
    ///
    /// Looks in the granularity folder first; for hourly data a miss falls
    /// back to the legacy flat layout, injecting the granularity fields the
    /// legacy files predate. A full miss is `NotFound`; a bad code is
    /// `UnknownGranularity`.
    pub fn read_output(
        &self,
        granularity_code: &str,
        file_type: FileType,
        model: &str,
        horizon: u32,
    ) -> Result<serde_json::Value> {
        let granularity = Granularity::from_code(granularity_code)?;

        if let Some(value) = self.load(granularity, file_type, model, horizon)? {
            return Ok(value);
        }

        if granularity == Granularity::Hourly {
            if let Some(mut value) = self.load_legacy(file_type, model, horizon)? {
                if let Some(obj) = value.as_object_mut() {
                    obj.insert("granularity".to_string(), "H".into());
                    obj.insert("granularity_name".to_string(), "hourly".into());
                }
                return Ok(value);
            }
        }

        Err(DemandError::NotFound(format!(
            "no {} found for model={model}, granularity={granularity_code}, horizon={horizon}",
            file_type.as_str()
        )))
    }

    /// Parse `metrics_<model>_<horizon>` from a file stem.
    fn parse_metrics_stem(stem: &str) -> Option<(String, u32)> {
        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() < 3 || parts[0] != "metrics" {
            return None;
        }
        let horizon = parts[2].parse::<u32>().ok()?;
        Some((parts[1].to_string(), horizon))
    }

    fn scan_metrics_files(dir: &Path) -> Vec<(String, u32)> {
        let mut found = Vec::new();
        let Ok(entries) = fs::read_dir(dir) else {
            return found;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if let Some(parsed) = Self::parse_metrics_stem(stem) {
                    found.push(parsed);
                }
            }
        }
        found.sort();
        found
    }

    /// List all trained (model, horizon) combinations per granularity code.
    ///
    /// Scans persisted `metrics_*.json` filenames; legacy flat-layout
    /// entries are merged into the hourly list when not already present.
    pub fn list_available(&self) -> BTreeMap<String, Vec<AvailableModel>> {
        let mut available = BTreeMap::new();
        for granularity in Granularity::all() {
            let models: Vec<AvailableModel> = Self::scan_metrics_files(&self.folder(granularity))
                .into_iter()
                .map(|(model, horizon)| AvailableModel {
                    model,
                    horizon,
                    legacy: false,
                })
                .collect();
            available.insert(granularity.code().to_string(), models);
        }

        // Legacy flat files count as hourly
        let legacy = Self::scan_metrics_files(&self.root);
        if !legacy.is_empty() {
            let hourly = available.entry("H".to_string()).or_default();
            for (model, horizon) in legacy {
                let exists = hourly
                    .iter()
                    .any(|m| m.model == model && m.horizon == horizon);
                if !exists {
                    hourly.push(AvailableModel {
                        model,
                        horizon,
                        legacy: true,
                    });
                }
            }
        }

        available
    }
}
