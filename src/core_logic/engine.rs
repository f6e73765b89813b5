use crate::api::lib::RankingRequest;
use crate::api::models::{
    Alert, CorrelationReport, CountryRanking, DashboardReport, GdpImpactPrediction,
    MarketSeason, RankingSummary, SeasonalProfile, YearlyCountryStats,
};
use crate::config::EngineConfig;
use crate::core_logic::{
    alerts, correlation, data_processing, prediction, ranking, seasonality, year_adjuster,
};
use crate::error::{EngineError, Result};
use crate::store::models::{CountryCode, Granularity, PeriodRange, TimeSeriesStore};
use log::{debug, info};
use std::collections::BTreeMap;

/// Entry point for presentation layers.
///
/// Holds an immutable snapshot of the yearly series, the optional monthly
/// series and the static configuration. Every call is a pure function of
/// that snapshot, so one engine can be shared across threads.
#[derive(Debug, Clone)]
pub struct TourismEngine {
    config: EngineConfig,
    yearly: TimeSeriesStore,
    monthly: Option<TimeSeriesStore>,
}

impl TourismEngine {
    pub fn new(
        config: EngineConfig,
        yearly: TimeSeriesStore,
        monthly: Option<TimeSeriesStore>,
    ) -> Result<Self> {
        config.validate()?;
        if yearly.granularity() != Granularity::Yearly {
            return Err(EngineError::invalid_series(
                "the primary series must be yearly",
            ));
        }
        if let Some(monthly) = &monthly {
            if monthly.granularity() != Granularity::Monthly {
                return Err(EngineError::invalid_series(
                    "the secondary series must be monthly",
                ));
            }
        }

        info!(
            "Engine ready: {} yearly periods {:?}, {} monthly periods, {} countries",
            yearly.len(),
            yearly.year_range(),
            monthly.as_ref().map_or(0, |m| m.len()),
            config.countries.len()
        );

        Ok(Self {
            config,
            yearly,
            monthly,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn yearly(&self) -> &TimeSeriesStore {
        &self.yearly
    }

    pub fn monthly(&self) -> Option<&TimeSeriesStore> {
        self.monthly.as_ref()
    }

    pub fn get_rankings(&self, window: &PeriodRange) -> Result<Vec<CountryRanking>> {
        debug!("Ranking countries over window {}", window);
        ranking::rank(&self.yearly, window, &self.config)
    }

    pub fn get_ranking_summary(&self, window: &PeriodRange) -> Result<RankingSummary> {
        let rankings = self.get_rankings(window)?;
        ranking::summarize(&self.yearly, window, &rankings, &self.config)
    }

    /// Full-range baseline projected onto `year` through the multiplier table.
    pub fn get_rankings_for_year(&self, year: i32) -> Result<Vec<CountryRanking>> {
        debug!("Projecting rankings onto {}", year);
        if !self.config.year_multipliers.covers(year) {
            return Err(EngineError::UnknownYear { year });
        }
        let baseline = ranking::rank(&self.yearly, &PeriodRange::all(), &self.config)?;
        year_adjuster::adjust(&baseline, year, &self.config.year_multipliers)
    }

    pub fn get_correlations(&self) -> Result<CorrelationReport> {
        correlation::analyze(&self.yearly, &self.config)
    }

    /// Correlations scoped to one year: the monthly pattern of that year when
    /// at least two of its months are loaded, otherwise GDP correlation over
    /// the surrounding years.
    pub fn get_correlations_for_year(&self, year: i32) -> Result<CorrelationReport> {
        if let Some(monthly) = &self.monthly {
            let months = monthly
                .records()
                .iter()
                .filter(|r| r.period.year() == year)
                .count();
            if months >= 2 {
                debug!("Correlating the {} months of {}", months, year);
                return correlation::analyze_monthly_pattern(monthly, year, &self.config);
            }
        }
        debug!("No monthly pattern for {}, correlating surrounding years", year);
        correlation::analyze_around(&self.yearly, year, &self.config)
    }

    pub fn get_seasonality(&self) -> Result<BTreeMap<CountryCode, SeasonalProfile>> {
        seasonality::seasonality(&self.monthly_profiles()?)
    }

    /// `(most variable, most stable)` market across the seasonal profiles.
    pub fn get_variation_extremes(&self) -> Result<Option<(CountryCode, CountryCode)>> {
        Ok(seasonality::variation_extremes(&self.get_seasonality()?))
    }

    pub fn get_market_season(&self) -> Result<MarketSeason> {
        seasonality::market_season(&self.monthly_profiles()?, seasonality::MARKET_SEASON_MONTHS)
    }

    pub fn get_yearly_stats(
        &self,
    ) -> Result<BTreeMap<i32, BTreeMap<CountryCode, YearlyCountryStats>>> {
        seasonality::yearly_stats(self.require_monthly()?, &self.config.countries)
    }

    /// Alerts between the two latest years. `None` uses the configured threshold.
    pub fn get_alerts(&self, threshold_pct: Option<f64>) -> Result<Vec<Alert>> {
        let threshold = threshold_pct.unwrap_or(self.config.alert_threshold_pct);
        alerts::evaluate(&self.yearly, threshold, &self.config.countries)
    }

    /// Alerts between the two latest months.
    pub fn get_monthly_alerts(&self, threshold_pct: Option<f64>) -> Result<Vec<Alert>> {
        let threshold = threshold_pct.unwrap_or(self.config.alert_threshold_pct);
        alerts::evaluate(self.require_monthly()?, threshold, &self.config.countries)
    }

    pub fn predict_gdp_impact(
        &self,
        changes_pct: &BTreeMap<CountryCode, f64>,
    ) -> Result<GdpImpactPrediction> {
        prediction::predict_gdp_impact(
            &self.yearly,
            changes_pct,
            &self.config.countries,
            self.config.gdp_per_thousand_visitors,
        )
    }

    /// Rankings, summary, correlations, seasonality and alerts in one report.
    /// Seasonality is left out when no monthly series was supplied. A year
    /// request with no data around that year reports full-series correlations.
    pub fn dashboard(&self, request: RankingRequest) -> Result<DashboardReport> {
        let (window, rankings, summary, correlations) = match request {
            RankingRequest::Window(window) => {
                let rankings = self.get_rankings(&window)?;
                let summary = ranking::summarize(&self.yearly, &window, &rankings, &self.config)?;
                (window.to_string(), rankings, summary, self.get_correlations()?)
            }
            RankingRequest::Year(year) => {
                let rankings = self.get_rankings_for_year(year)?;
                let summary = ranking::summarize_projection(&rankings);
                let correlations = match self.get_correlations_for_year(year) {
                    Ok(report) => report,
                    Err(EngineError::EmptyWindow(_)) | Err(EngineError::InsufficientData { .. }) => {
                        debug!("Too little data around {}, using the full series", year);
                        self.get_correlations()?
                    }
                    Err(err) => return Err(err),
                };
                (year.to_string(), rankings, summary, correlations)
            }
        };

        let (seasonality, market_season) = match self.monthly_profiles() {
            Ok(profiles) => (
                Some(seasonality::seasonality(&profiles)?),
                Some(seasonality::market_season(
                    &profiles,
                    seasonality::MARKET_SEASON_MONTHS,
                )?),
            ),
            Err(EngineError::MonthlyDataUnavailable) => (None, None),
            Err(err) => return Err(err),
        };

        Ok(DashboardReport {
            window,
            rankings,
            summary,
            correlations,
            seasonality,
            market_season,
            alerts: self.get_alerts(None)?,
        })
    }

    fn monthly_profiles(&self) -> Result<BTreeMap<CountryCode, Vec<f64>>> {
        data_processing::monthly_profiles(
            self.require_monthly()?,
            &self.config.seasonality_window,
            &self.config.countries,
        )
    }

    fn require_monthly(&self) -> Result<&TimeSeriesStore> {
        self.monthly
            .as_ref()
            .ok_or(EngineError::MonthlyDataUnavailable)
    }
}
