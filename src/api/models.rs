use crate::store::models::{CountryCode, Period, PeriodRange};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Why a correlation could not be computed.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedCorrelation {
    TooFewPeriods,
    ZeroVariance,
    GdpUnavailable,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CountryRanking {
    pub country: CountryCode,
    pub avg_visitors: f64,
    pub correlation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_undefined: Option<UndefinedCorrelation>,
    pub impact_per_tourist: f64,
    pub total_economic_impact: f64, // millions
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct RankingSummary {
    pub total_annual_average: f64,
    pub total_cumulative: u64,
    pub periods_count: usize,
    pub total_economic_impact: f64,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

/// What the per-country correlations were measured against.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Yearly visitors against GDP over the full series.
    Yearly,
    /// Monthly visitors of one year against that year's monthly total.
    Monthly,
    /// Yearly visitors against GDP over the years around a selected year.
    Range,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CorrelationReport {
    pub analysis_type: AnalysisType,
    pub window: PeriodRange,
    pub per_country: BTreeMap<CountryCode, Option<f64>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub undefined: BTreeMap<CountryCode, UndefinedCorrelation>,
    pub top_country: CountryCode,
    pub top_by_volume: CountryCode,
    pub top_by_correlation: Option<CountryCode>,
    pub trend: Trend,
    pub trend_change_pct: Option<f64>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SeasonalProfile {
    pub peak_months: BTreeSet<u32>,
    pub low_months: BTreeSet<u32>,
    pub mean: f64,
    pub variation_pct: f64,
}

/// Busiest and quietest calendar months across all markets combined.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MarketSeason {
    pub monthly_totals: Vec<f64>, // index 0 is January
    pub peak_months: Vec<u32>,
    pub low_months: Vec<u32>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increase,
    Decrease,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Alert {
    pub country: CountryCode,
    pub period_a: Period,
    pub period_b: Period,
    pub percent_change: f64,
    pub direction: Direction,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct YearlyCountryStats {
    pub total: u64,
    pub average: f64,
    pub peak_month: u32,
    pub low_month: u32,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GdpImpactPrediction {
    pub baseline_period: Period,
    pub baseline_visitors: BTreeMap<CountryCode, f64>,
    pub predicted_visitors: BTreeMap<CountryCode, f64>,
    pub visitor_change: f64,
    pub gdp_impact: f64,
    pub current_gdp: f64,
    pub predicted_gdp: f64,
    pub impact_percentage: f64,
}

/// Everything the dashboard renders in one pass.
#[derive(Serialize, Debug, Clone)]
pub struct DashboardReport {
    pub window: String,
    pub rankings: Vec<CountryRanking>,
    pub summary: RankingSummary,
    pub correlations: CorrelationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonality: Option<BTreeMap<CountryCode, SeasonalProfile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_season: Option<MarketSeason>,
    pub alerts: Vec<Alert>,
}
