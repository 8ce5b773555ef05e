//! Leakage-free temporal train/test splitting.

use chrono::{Duration, Months, NaiveDateTime};

use crate::error::{DemandError, Result};
use crate::features::FeatureTable;
use crate::granularity::Granularity;

/// Split boundary: the maximum timestamp minus `test_periods` expressed in
/// the granularity's native duration. Months and years use calendar
/// arithmetic, not a fixed day count.
fn split_boundary(
    max_ts: NaiveDateTime,
    test_periods: u32,
    granularity: Granularity,
) -> Result<NaiveDateTime> {
    let boundary = match granularity {
        Granularity::Hourly => Some(max_ts - Duration::hours(test_periods as i64)),
        Granularity::Daily => Some(max_ts - Duration::days(test_periods as i64)),
        Granularity::Weekly => Some(max_ts - Duration::weeks(test_periods as i64)),
        Granularity::Monthly => max_ts.checked_sub_months(Months::new(test_periods)),
        Granularity::Yearly => max_ts.checked_sub_months(Months::new(test_periods * 12)),
    };
    boundary.ok_or_else(|| {
        DemandError::InvalidInput(format!(
            "cannot step back {test_periods} {} periods from {max_ts}",
            granularity.config().name
        ))
    })
}

/// Partition a feature table into train and test sets by time.
///
/// The most recent `test_periods` periods become the test set; everything
/// at or before the boundary is training data. No shuffling is involved,
/// so the split can never leak future rows into training.
///
/// # Returns
/// `(train, test)` with `train: ts <= boundary` and `test: ts > boundary`
pub fn split_temporal(
    table: &FeatureTable,
    test_periods: u32,
    granularity: Granularity,
) -> Result<(FeatureTable, FeatureTable)> {
    let Some(max_ts) = table.timestamps().last().copied() else {
        return Err(DemandError::InvalidInput(
            "cannot split an empty feature table".to_string(),
        ));
    };
    let boundary = split_boundary(max_ts, test_periods, granularity)?;

    let train = table.filter_rows(|ts| ts <= boundary);
    let test = table.filter_rows(|ts| ts > boundary);
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::build_features;
    use crate::series::DemandSeries;
    use chrono::NaiveDate;

    fn jan1() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn daily_table(n: usize) -> FeatureTable {
        let timestamps: Vec<NaiveDateTime> =
            (0..n).map(|i| jan1() + Duration::days(i as i64)).collect();
        let values: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        let series = DemandSeries::new(timestamps, values).unwrap();
        build_features(&series, Granularity::Daily).unwrap()
    }

    #[test]
    fn test_daily_split_sizes() {
        // 60 daily rows pre-drop; 30 survive the 30-day rolling window.
        // test_periods=7 keeps the 7 most recent days in test.
        let table = daily_table(60);
        assert_eq!(table.len(), 30);
        let (train, test) = split_temporal(&table, 7, Granularity::Daily).unwrap();
        assert_eq!(train.len(), 23);
        assert_eq!(test.len(), 7);
    }

    #[test]
    fn test_split_invariant() {
        let table = daily_table(60);
        let (train, test) = split_temporal(&table, 7, Granularity::Daily).unwrap();
        let boundary = *table.timestamps().last().unwrap() - Duration::days(7);

        assert!(train.timestamps().iter().all(|&ts| ts <= boundary));
        assert!(test.timestamps().iter().all(|&ts| ts > boundary));
        assert_eq!(train.len() + test.len(), table.len());

        // Union covers the input exactly once, in order
        let mut all: Vec<NaiveDateTime> = train.timestamps().to_vec();
        all.extend_from_slice(test.timestamps());
        assert_eq!(all, table.timestamps());
    }

    #[test]
    fn test_hourly_split() {
        let timestamps: Vec<NaiveDateTime> =
            (0..400).map(|i| jan1() + Duration::hours(i)).collect();
        let values: Vec<f64> = (0..400).map(|i| i as f64).collect();
        let series = DemandSeries::new(timestamps, values).unwrap();
        let table = build_features(&series, Granularity::Hourly).unwrap();
        let (train, test) = split_temporal(&table, 24, Granularity::Hourly).unwrap();
        assert_eq!(test.len(), 24);
        assert_eq!(train.len(), table.len() - 24);
    }

    #[test]
    fn test_monthly_split_uses_calendar_months() {
        // Month-starts have uneven day counts; calendar arithmetic must
        // land exactly on an earlier month start
        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        let (mut y, mut m) = (2020, 1);
        for i in 0..30 {
            timestamps.push(
                NaiveDate::from_ymd_opt(y, m, 1)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
            );
            values.push(100.0 + i as f64);
            m += 1;
            if m > 12 {
                m = 1;
                y += 1;
            }
        }
        let series = DemandSeries::new(timestamps, values).unwrap();
        let table = build_features(&series, Granularity::Monthly).unwrap();
        let (train, test) = split_temporal(&table, 3, Granularity::Monthly).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), table.len() - 3);
        // Test rows are exactly the 3 most recent month starts
        assert_eq!(
            test.timestamps()[0],
            NaiveDate::from_ymd_opt(2022, 4, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_empty_table_errors() {
        let table = daily_table(5); // too short for the 30-day window
        assert!(table.is_empty());
        let err = split_temporal(&table, 7, Granularity::Daily).unwrap_err();
        assert!(matches!(err, DemandError::InvalidInput(_)));
    }
}
