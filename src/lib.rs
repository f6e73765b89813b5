//! Tourism impact analytics for Guam source markets.
//!
//! Pure transformations from yearly/monthly visitor and GDP series into
//! rankings, correlation statistics, year projections, seasonal profiles
//! and surge/decline alerts. Data loading lives in [`adapters`]; everything
//! under [`core_logic`] works on in-memory snapshots only.

pub mod adapters;
pub mod api;
pub mod config;
pub mod core_logic;
pub mod error;
pub mod store;

pub use config::{EngineConfig, YearMultiplierTable};
pub use core_logic::engine::TourismEngine;
pub use error::{EngineError, Result};
pub use store::models::{CountryCode, Period, PeriodRange, PeriodRecord, TimeSeriesStore};
