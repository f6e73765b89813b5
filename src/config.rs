use crate::error::{EngineError, Result};
use crate::store::models::{CountryCode, PeriodRange};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::fs;
use std::path::Path;

pub const CONFIG_PATH_VAR: &str = "TOURISM_ENGINE_CONFIG";

/// Average spend of one visitor in USD before market weighting.
const BASE_IMPACT_PER_TOURIST: f64 = 1200.0;

/// Per-(country, year) scale factors applied when a single year is selected.
///
/// The covered range is the span between the smallest and largest configured
/// year. Inside that span a missing entry reads as 1.0.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct YearMultiplierTable {
    years: BTreeMap<i32, BTreeMap<CountryCode, f64>>,
}

impl YearMultiplierTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(
        mut self,
        year: i32,
        entries: impl IntoIterator<Item = (CountryCode, f64)>,
    ) -> Self {
        self.years.entry(year).or_default().extend(entries);
        self
    }

    pub fn coverage(&self) -> Option<(i32, i32)> {
        let first = *self.years.keys().next()?;
        let last = *self.years.keys().next_back()?;
        Some((first, last))
    }

    pub fn covers(&self, year: i32) -> bool {
        self.coverage()
            .map_or(false, |(first, last)| (first..=last).contains(&year))
    }

    pub fn multiplier(&self, country: CountryCode, year: i32) -> Result<f64> {
        if !self.covers(year) {
            return Err(EngineError::UnknownYear { year });
        }
        Ok(self
            .years
            .get(&year)
            .and_then(|entries| entries.get(&country))
            .copied()
            .unwrap_or(1.0))
    }

    pub fn validate(&self) -> Result<()> {
        for (year, entries) in &self.years {
            for (country, factor) in entries {
                if !factor.is_finite() || *factor <= 0.0 {
                    return Err(EngineError::invalid_config(format!(
                        "multiplier for {} in {} must be positive, got {}",
                        country, year, factor
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Static inputs supplied by the data-provider collaborator.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub countries: Vec<CountryCode>,
    pub impact_per_tourist: BTreeMap<CountryCode, f64>,
    pub year_multipliers: YearMultiplierTable,
    pub alert_threshold_pct: f64,
    pub trend_epsilon_pct: f64,
    pub gdp_per_thousand_visitors: f64, // billions of GDP per 1,000 visitors
    pub seasonality_window: PeriodRange,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let market_weights = [
            (CountryCode::Japan, 1.3),
            (CountryCode::Korea, 1.1),
            (CountryCode::Usa, 1.5),
            (CountryCode::China, 0.9),
            (CountryCode::Philippines, 0.8),
            (CountryCode::Taiwan, 1.0),
        ];

        Self {
            countries: CountryCode::ALL.to_vec(),
            impact_per_tourist: market_weights
                .iter()
                .map(|(country, weight)| (*country, BASE_IMPACT_PER_TOURIST * weight))
                .collect(),
            year_multipliers: default_year_multipliers(),
            alert_threshold_pct: 10.0,
            trend_epsilon_pct: 0.5,
            gdp_per_thousand_visitors: 0.01,
            // pre-pandemic baseline
            seasonality_window: PeriodRange::before(2020),
        }
    }
}

impl EngineConfig {
    /// Loads `.env`, then the JSON file named by `TOURISM_ENGINE_CONFIG`
    /// when set. Falls back to the built-in defaults otherwise.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        match env::var(CONFIG_PATH_VAR) {
            Ok(path) => {
                info!("Loading engine configuration from {}", path);
                Self::from_path(path)
            }
            Err(_) => {
                debug!("{} not set, using default configuration", CONFIG_PATH_VAR);
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.countries.is_empty() {
            return Err(EngineError::invalid_config("country list is empty"));
        }
        let unique: BTreeSet<_> = self.countries.iter().collect();
        if unique.len() != self.countries.len() {
            return Err(EngineError::invalid_config(
                "country list contains duplicates",
            ));
        }

        for country in &self.countries {
            let impact = self.impact_per_tourist(*country)?;
            if !impact.is_finite() || impact < 0.0 {
                return Err(EngineError::invalid_config(format!(
                    "impact_per_tourist for {} must be non-negative, got {}",
                    country, impact
                )));
            }
        }

        if !self.alert_threshold_pct.is_finite() || self.alert_threshold_pct < 0.0 {
            return Err(EngineError::InvalidThreshold(self.alert_threshold_pct));
        }
        if !self.trend_epsilon_pct.is_finite() || self.trend_epsilon_pct < 0.0 {
            return Err(EngineError::invalid_config(format!(
                "trend_epsilon_pct must be non-negative, got {}",
                self.trend_epsilon_pct
            )));
        }
        if !self.gdp_per_thousand_visitors.is_finite() {
            return Err(EngineError::invalid_config(
                "gdp_per_thousand_visitors must be finite",
            ));
        }

        self.year_multipliers.validate()
    }

    pub fn impact_per_tourist(&self, country: CountryCode) -> Result<f64> {
        self.impact_per_tourist
            .get(&country)
            .copied()
            .ok_or(EngineError::MissingImpactConstant(country))
    }
}

fn default_year_multipliers() -> YearMultiplierTable {
    use CountryCode::*;

    // columns: japan, korea, usa, china, philippines, taiwan
    let rows: [(i32, [f64; 6]); 11] = [
        (2014, [0.8, 0.8, 0.6, 0.5, 0.7, 0.8]),
        (2015, [0.9, 0.9, 0.7, 0.6, 0.8, 0.9]),
        (2016, [1.0, 1.0, 0.8, 0.7, 0.9, 1.0]),
        (2017, [1.1, 1.2, 0.9, 0.8, 1.0, 1.1]),
        (2018, [1.2, 1.3, 1.0, 0.9, 1.1, 1.2]),
        (2019, [1.3, 1.4, 1.1, 1.0, 1.2, 1.3]),
        (2020, [0.4, 0.3, 0.5, 0.1, 0.6, 0.4]),
        (2021, [0.3, 0.4, 0.6, 0.2, 0.8, 0.3]),
        (2022, [0.8, 0.9, 0.8, 0.5, 1.0, 0.8]),
        (2023, [1.0, 1.2, 0.9, 0.7, 1.3, 1.0]),
        (2024, [1.1, 1.3, 1.0, 0.8, 1.4, 1.1]),
    ];
    let order = [Japan, Korea, Usa, China, Philippines, Taiwan];

    rows.iter().fold(YearMultiplierTable::new(), |table, (year, factors)| {
        table.with_year(*year, order.iter().copied().zip(factors.iter().copied()))
    })
}
