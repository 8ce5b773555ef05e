//! Granularity registry: the five supported forecast time resolutions.
//!
//! Each granularity maps to a fixed configuration (code, display name,
//! default horizon, default test window, output folder). The table is
//! immutable after initialization and safe for concurrent readers.

use crate::error::{DemandError, Result};

/// Supported forecast granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Granularity {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Configuration for a specific granularity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GranularityConfig {
    /// Short code (H, D, W, M, Y)
    pub code: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// Default forecast horizon in periods
    pub default_horizon: u32,
    /// Default test set size in periods
    pub default_test_periods: u32,
    /// Output folder name
    pub folder_name: &'static str,
}

static HOURLY: GranularityConfig = GranularityConfig {
    code: "H",
    name: "hourly",
    default_horizon: 24,
    default_test_periods: 168, // 7 days * 24 hours
    folder_name: "hourly",
};

static DAILY: GranularityConfig = GranularityConfig {
    code: "D",
    name: "daily",
    default_horizon: 7,
    default_test_periods: 7,
    folder_name: "daily",
};

static WEEKLY: GranularityConfig = GranularityConfig {
    code: "W",
    name: "weekly",
    default_horizon: 4,
    default_test_periods: 4,
    folder_name: "weekly",
};

static MONTHLY: GranularityConfig = GranularityConfig {
    code: "M",
    name: "monthly",
    default_horizon: 3,
    default_test_periods: 3,
    folder_name: "monthly",
};

static YEARLY: GranularityConfig = GranularityConfig {
    code: "Y",
    name: "yearly",
    default_horizon: 1,
    default_test_periods: 1,
    folder_name: "yearly",
};

impl Granularity {
    /// All granularities in canonical order (H, D, W, M, Y).
    pub fn all() -> [Granularity; 5] {
        [
            Granularity::Hourly,
            Granularity::Daily,
            Granularity::Weekly,
            Granularity::Monthly,
            Granularity::Yearly,
        ]
    }

    /// Parse a granularity from its short code (case-insensitive).
    ///
    /// # Arguments
    /// * `code` - One of "H", "D", "W", "M", "Y"
    ///
    /// # Returns
    /// The matching granularity, or `UnknownGranularity` for any other code
    pub fn from_code(code: &str) -> Result<Granularity> {
        match code.to_ascii_uppercase().as_str() {
            "H" => Ok(Granularity::Hourly),
            "D" => Ok(Granularity::Daily),
            "W" => Ok(Granularity::Weekly),
            "M" => Ok(Granularity::Monthly),
            "Y" => Ok(Granularity::Yearly),
            other => Err(DemandError::UnknownGranularity(other.to_string())),
        }
    }

    /// Configuration for this granularity.
    pub fn config(&self) -> &'static GranularityConfig {
        match self {
            Granularity::Hourly => &HOURLY,
            Granularity::Daily => &DAILY,
            Granularity::Weekly => &WEEKLY,
            Granularity::Monthly => &MONTHLY,
            Granularity::Yearly => &YEARLY,
        }
    }

    /// Short code for this granularity.
    pub fn code(&self) -> &'static str {
        self.config().code
    }

    /// Minimum days of hourly history needed to train at this granularity.
    ///
    /// Covers the test window, the longest lag/rolling features, and some
    /// training data on top.
    pub fn minimum_days(&self) -> u32 {
        match self {
            Granularity::Hourly => 30,
            Granularity::Daily => 60,
            Granularity::Weekly => 120,
            Granularity::Monthly => 365,
            Granularity::Yearly => 1825,
        }
    }

    /// Recommended days of hourly history for good model training.
    pub fn recommended_days(&self) -> u32 {
        match self {
            Granularity::Hourly => 90,    // ~3 months
            Granularity::Daily => 365,    // 1 year
            Granularity::Weekly => 730,   // 2 years
            Granularity::Monthly => 1095, // 3 years
            Granularity::Yearly => 3650,  // 10 years
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.config().name)
    }
}
