use crate::store::models::{CountryCode, Period, PeriodRange};
use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors returned by the analytics engine and its loaders.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("window {0} selects no periods")]
    EmptyWindow(PeriodRange),

    #[error("year {year} is outside the multiplier table coverage")]
    UnknownYear { year: i32 },

    #[error("at least 2 periods are required, found {found}")]
    InsufficientData { found: usize },

    #[error("{country} has {found} monthly values, expected 12")]
    IncompleteMonthData { country: CountryCode, found: usize },

    #[error("invalid series: {0}")]
    InvalidSeries(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("alert threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f64),

    #[error("no impact_per_tourist configured for {0}")]
    MissingImpactConstant(CountryCode),

    #[error("no monthly series was supplied")]
    MonthlyDataUnavailable,

    #[error("GDP missing for period {0}")]
    MissingGdp(Period),

    #[error(transparent)]
    Polars(#[from] PolarsError),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),
}

impl EngineError {
    pub fn invalid_series(msg: impl Into<String>) -> Self {
        Self::InvalidSeries(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
