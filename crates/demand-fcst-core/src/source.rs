//! Demand sources: seeded synthetic generation and real half-hourly
//! settlement data.
//!
//! Real data follows the National Grid ESO/NESO historic demand layout:
//! one CSV per year (`demanddata_<year>.csv`) with half-hourly settlement
//! periods 1-48. Consecutive half-hours are averaged into one hourly
//! point.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{DemandError, Result};
use crate::granularity::Granularity;
use crate::resample::bucket_start;
use crate::series::DemandSeries;

/// Base demand level for the synthetic generator, in MW.
const SYNTHETIC_BASE: f64 = 30_000.0;
/// Amplitude of the diurnal sinusoid.
const SYNTHETIC_DAILY_AMPLITUDE: f64 = 2_500.0;
/// Demand reduction applied on Saturdays and Sundays.
const SYNTHETIC_WEEKEND_OFFSET: f64 = -6_000.0;
/// Standard deviation of the Gaussian noise term.
const SYNTHETIC_NOISE_STD: f64 = 2_500.0;

/// Fixed epoch for synthetic series.
fn synthetic_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Generate synthetic hourly electricity demand.
///
/// The series models a base level, a daily sinusoid peaking around midday,
/// a weekend reduction and Gaussian noise from the seeded generator.
/// Identical `(n_days, seed)` arguments always yield bit-identical output.
///
/// # Arguments
/// * `n_days` - Number of days to generate (24 points per day)
/// * `seed` - Seed for the noise generator
pub fn synthetic_hourly_demand(n_days: u32, seed: u64) -> Result<DemandSeries> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, SYNTHETIC_NOISE_STD)
        .map_err(|e| DemandError::Computation(format!("noise distribution: {e}")))?;

    let epoch = synthetic_epoch();
    let hours = n_days as usize * 24;
    let mut timestamps = Vec::with_capacity(hours);
    let mut values = Vec::with_capacity(hours);

    for h in 0..hours {
        let ts = epoch + Duration::hours(h as i64);
        let hour_of_day = (h % 24) as f64;
        let daily = SYNTHETIC_DAILY_AMPLITUDE
            * (std::f64::consts::PI * (hour_of_day - 6.0) / 12.0).sin();
        let weekend = if ts.weekday().num_days_from_monday() >= 5 {
            SYNTHETIC_WEEKEND_OFFSET
        } else {
            0.0
        };
        timestamps.push(ts);
        values.push(SYNTHETIC_BASE + daily + weekend + noise.sample(&mut rng));
    }

    DemandSeries::new(timestamps, values)
}

/// One half-hourly settlement row as it appears in the source CSV.
#[derive(Debug, Deserialize)]
struct SettlementRow {
    #[serde(rename = "SETTLEMENT_DATE")]
    settlement_date: String,
    #[serde(rename = "SETTLEMENT_PERIOD")]
    settlement_period: u32,
    /// National Demand in MW; missing or zero values are placeholder rows
    #[serde(rename = "ND")]
    national_demand: Option<f64>,
}

/// Date formats seen across historic demand file vintages.
const SETTLEMENT_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%b-%Y", "%d/%m/%Y"];

fn parse_settlement_date(raw: &str) -> Option<NaiveDate> {
    SETTLEMENT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw.trim(), fmt).ok())
}

/// Timestamp of a settlement period: period 1 = 00:00-00:30, 2 = 00:30-01:00, ...
fn settlement_timestamp(date: NaiveDate, period: u32) -> Option<NaiveDateTime> {
    if !(1..=48).contains(&period) {
        return None;
    }
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt + Duration::minutes((period as i64 - 1) * 30))
}

/// Path of the per-year settlement file.
fn year_file(data_dir: &Path, year: i32) -> PathBuf {
    data_dir.join(format!("demanddata_{year}.csv"))
}

/// Discover years with a settlement file present in `data_dir`.
fn available_years(data_dir: &Path) -> Vec<i32> {
    let mut years = Vec::new();
    let Ok(entries) = std::fs::read_dir(data_dir) else {
        return years;
    };
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if let Some(stem) = name
            .strip_prefix("demanddata_")
            .and_then(|s| s.strip_suffix(".csv"))
        {
            if let Ok(year) = stem.parse::<i32>() {
                years.push(year);
            }
        }
    }
    years.sort_unstable();
    years
}

/// Load real hourly demand from half-hourly settlement CSVs.
///
/// Rows are keyed by (settlement date, settlement period 1-48). Years are
/// concatenated, sorted, deduplicated (keep first), averaged per hour and
/// rows with missing or non-positive demand dropped.
///
/// # Arguments
/// * `data_dir` - Directory holding `demanddata_<year>.csv` files
/// * `years` - Years to load; `None` loads every year found
///
/// # Returns
/// The hourly series, or `NoDataAvailable` if no valid rows exist
pub fn load_real_demand(data_dir: &Path, years: Option<&[i32]>) -> Result<DemandSeries> {
    let years: Vec<i32> = match years {
        Some(ys) => ys.to_vec(),
        None => available_years(data_dir),
    };
    if years.is_empty() {
        return Err(DemandError::NoDataAvailable(format!(
            "no demand data files found in {}",
            data_dir.display()
        )));
    }

    let mut points: Vec<(NaiveDateTime, f64)> = Vec::new();
    for &year in &years {
        let path = year_file(data_dir, year);
        if !path.exists() {
            warn!(year, path = %path.display(), "settlement file not found, skipping year");
            continue;
        }
        let mut reader = csv::Reader::from_path(&path)?;
        for row in reader.deserialize::<SettlementRow>() {
            let Ok(row) = row else { continue };
            let Some(date) = parse_settlement_date(&row.settlement_date) else {
                continue;
            };
            let Some(ts) = settlement_timestamp(date, row.settlement_period) else {
                continue;
            };
            if let Some(demand) = row.national_demand {
                if demand.is_finite() {
                    points.push((ts, demand));
                }
            }
        }
    }

    if points.is_empty() {
        return Err(DemandError::NoDataAvailable(format!(
            "no valid demand rows found for years {years:?}"
        )));
    }

    // Sort and drop duplicate timestamps, keeping the first occurrence
    points.sort_by_key(|(ts, _)| *ts);
    points.dedup_by_key(|(ts, _)| *ts);

    // Average the half-hourly points within each hour, then drop
    // non-positive hours (missing/placeholder artifacts)
    let mut timestamps = Vec::new();
    let mut values = Vec::new();
    let mut current: Option<NaiveDateTime> = None;
    let mut bucket: Vec<f64> = Vec::new();
    let flush = |hour: NaiveDateTime,
                 bucket: &mut Vec<f64>,
                 timestamps: &mut Vec<NaiveDateTime>,
                 values: &mut Vec<f64>| {
        if !bucket.is_empty() {
            let mean = bucket.iter().sum::<f64>() / bucket.len() as f64;
            if mean > 0.0 {
                timestamps.push(hour);
                values.push(mean);
            }
            bucket.clear();
        }
    };
    for (ts, demand) in points {
        let hour = bucket_start(ts, Granularity::Hourly);
        if current != Some(hour) {
            if let Some(prev) = current {
                flush(prev, &mut bucket, &mut timestamps, &mut values);
            }
            current = Some(hour);
        }
        bucket.push(demand);
    }
    if let Some(prev) = current {
        flush(prev, &mut bucket, &mut timestamps, &mut values);
    }

    if timestamps.is_empty() {
        return Err(DemandError::NoDataAvailable(format!(
            "all demand rows for years {years:?} were missing or non-positive"
        )));
    }

    DemandSeries::new(timestamps, values)
}

/// Which producer to use for hourly demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Always load settlement CSVs
    Real,
    /// Always generate synthetic data
    Synthetic,
    /// Try real data first, fall back to synthetic
    #[default]
    Auto,
}

/// Which producer actually supplied the series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceUsed {
    Real,
    Synthetic,
}

/// Options for [`hourly_demand`].
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub kind: SourceKind,
    /// Day limit: synthetic length, or truncation of real data to the
    /// most recent `n_days * 24` hourly points
    pub n_days: Option<u32>,
    /// Years to load for real data (`None` = all available)
    pub years: Option<Vec<i32>>,
    /// Seed for the synthetic generator
    pub seed: u64,
    /// Directory holding settlement CSVs
    pub data_dir: Option<PathBuf>,
}

const DEFAULT_SYNTHETIC_DAYS: u32 = 90;

fn synthetic_from(opts: &SourceOptions) -> Result<(DemandSeries, SourceUsed)> {
    let n_days = opts.n_days.unwrap_or(DEFAULT_SYNTHETIC_DAYS);
    let series = synthetic_hourly_demand(n_days, opts.seed)?;
    Ok((series, SourceUsed::Synthetic))
}

fn real_from(opts: &SourceOptions) -> Result<(DemandSeries, SourceUsed)> {
    let data_dir = opts.data_dir.as_deref().ok_or_else(|| {
        DemandError::NoDataAvailable("no data directory configured for real demand".to_string())
    })?;
    let mut series = load_real_demand(data_dir, opts.years.as_deref())?;
    if let Some(n_days) = opts.n_days {
        series = series.tail(n_days as usize * 24);
    }
    Ok((series, SourceUsed::Real))
}

/// Produce an hourly demand series according to the selection policy.
///
/// `Auto` prefers real data and falls back to synthetic when none is
/// available; the fallback is the one sanctioned local recovery, and the
/// source actually used is reported back to the caller.
pub fn hourly_demand(opts: &SourceOptions) -> Result<(DemandSeries, SourceUsed)> {
    match opts.kind {
        SourceKind::Synthetic => synthetic_from(opts),
        SourceKind::Real => real_from(opts),
        SourceKind::Auto => match real_from(opts) {
            Ok((series, used)) => {
                info!(hours = series.len(), "using real demand data");
                Ok((series, used))
            }
            Err(DemandError::NoDataAvailable(_)) | Err(DemandError::Io(_)) => {
                info!("real demand data not found, using synthetic data");
                synthetic_from(opts)
            }
            Err(e) => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_synthetic_deterministic() {
        let a = synthetic_hourly_demand(10, 42).unwrap();
        let b = synthetic_hourly_demand(10, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 240);
        assert_eq!(a.timestamps()[0], synthetic_epoch());
    }

    #[test]
    fn test_synthetic_seed_changes_output() {
        let a = synthetic_hourly_demand(5, 1).unwrap();
        let b = synthetic_hourly_demand(5, 2).unwrap();
        assert_ne!(a.values(), b.values());
        // Timestamps are seed-independent
        assert_eq!(a.timestamps(), b.timestamps());
    }

    #[test]
    fn test_synthetic_weekend_reduction() {
        // Average out noise over many weeks: weekend hours sit well below weekdays
        let s = synthetic_hourly_demand(70, 7).unwrap();
        let (mut weekend_sum, mut weekend_n) = (0.0, 0);
        let (mut weekday_sum, mut weekday_n) = (0.0, 0);
        for (ts, v) in s.iter() {
            if ts.weekday().num_days_from_monday() >= 5 {
                weekend_sum += v;
                weekend_n += 1;
            } else {
                weekday_sum += v;
                weekday_n += 1;
            }
        }
        let gap = weekday_sum / weekday_n as f64 - weekend_sum / weekend_n as f64;
        assert!(gap > 4_000.0, "weekend gap too small: {gap}");
    }

    #[test]
    fn test_settlement_timestamp() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            settlement_timestamp(date, 1).unwrap(),
            date.and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(
            settlement_timestamp(date, 3).unwrap(),
            date.and_hms_opt(1, 0, 0).unwrap()
        );
        assert_eq!(
            settlement_timestamp(date, 48).unwrap(),
            date.and_hms_opt(23, 30, 0).unwrap()
        );
        assert!(settlement_timestamp(date, 0).is_none());
        assert!(settlement_timestamp(date, 49).is_none());
    }

    #[test]
    fn test_parse_settlement_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert_eq!(parse_settlement_date("2024-01-02"), Some(expected));
        assert_eq!(parse_settlement_date("02-Jan-2024"), Some(expected));
        assert_eq!(parse_settlement_date("02/01/2024"), Some(expected));
        assert_eq!(parse_settlement_date("garbage"), None);
    }

    fn write_settlement_csv(dir: &Path, year: i32, rows: &[(&str, u32, &str)]) {
        let mut f = std::fs::File::create(year_file(dir, year)).unwrap();
        writeln!(f, "SETTLEMENT_DATE,SETTLEMENT_PERIOD,ND").unwrap();
        for (date, period, nd) in rows {
            writeln!(f, "{date},{period},{nd}").unwrap();
        }
    }

    #[test]
    fn test_load_real_demand_hourly_mean() {
        let dir = tempfile::tempdir().unwrap();
        write_settlement_csv(
            dir.path(),
            2024,
            &[
                ("2024-01-01", 1, "30000"),
                ("2024-01-01", 2, "31000"),
                ("2024-01-01", 3, "28000"),
                ("2024-01-01", 4, "30000"),
            ],
        );
        let s = load_real_demand(dir.path(), Some(&[2024])).unwrap();
        assert_eq!(s.len(), 2);
        assert_relative_eq!(s.values()[0], 30_500.0);
        assert_relative_eq!(s.values()[1], 29_000.0);
    }

    #[test]
    fn test_load_real_demand_drops_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        write_settlement_csv(
            dir.path(),
            2024,
            &[
                ("2024-01-01", 1, "0"),    // placeholder
                ("2024-01-01", 2, "0"),    // placeholder
                ("2024-01-01", 3, "29000"),
                ("2024-01-01", 3, "99999"), // duplicate, dropped (keep first)
                ("2024-01-01", 4, "31000"),
            ],
        );
        let s = load_real_demand(dir.path(), Some(&[2024])).unwrap();
        assert_eq!(s.len(), 1);
        assert_relative_eq!(s.values()[0], 30_000.0);
    }

    #[test]
    fn test_load_real_demand_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_real_demand(dir.path(), None).unwrap_err();
        assert!(matches!(err, DemandError::NoDataAvailable(_)));
    }

    #[test]
    fn test_auto_falls_back_to_synthetic() {
        let dir = tempfile::tempdir().unwrap();
        let opts = SourceOptions {
            kind: SourceKind::Auto,
            n_days: Some(3),
            seed: 42,
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let (series, used) = hourly_demand(&opts).unwrap();
        assert_eq!(used, SourceUsed::Synthetic);
        assert_eq!(series.len(), 72);
    }

    #[test]
    fn test_real_source_selected() {
        let dir = tempfile::tempdir().unwrap();
        // 4 hourly points across two days
        write_settlement_csv(
            dir.path(),
            2024,
            &[
                ("2024-01-01", 1, "30000"),
                ("2024-01-01", 3, "30000"),
                ("2024-01-02", 1, "31000"),
                ("2024-01-02", 3, "31000"),
            ],
        );
        let opts = SourceOptions {
            kind: SourceKind::Real,
            n_days: None,
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let (series, used) = hourly_demand(&opts).unwrap();
        assert_eq!(used, SourceUsed::Real);
        assert_eq!(series.len(), 4);
    }
}
