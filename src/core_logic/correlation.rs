use crate::api::models::{AnalysisType, CorrelationReport, Trend, UndefinedCorrelation};
use crate::config::EngineConfig;
use crate::core_logic::data_processing::{correlate_with_gdp, pearson};
use crate::error::{EngineError, Result};
use crate::store::models::{CountryCode, PeriodRange, TimeSeriesStore};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Years on each side of the selected year when a year has no monthly data.
pub const RANGE_RADIUS_YEARS: i32 = 2;

/// Correlation of every configured country against GDP over the full series,
/// together with the volume leader and the latest total-visitor trend.
pub fn analyze(series: &TimeSeriesStore, config: &EngineConfig) -> Result<CorrelationReport> {
    if series.len() < 2 {
        return Err(EngineError::InsufficientData {
            found: series.len(),
        });
    }

    let gdp = series.gdp_series();
    let correlations = config
        .countries
        .iter()
        .map(|country| correlate_with_gdp(&series.visitor_series(*country), gdp.as_deref()))
        .collect();
    build_report(series, correlations, AnalysisType::Yearly, PeriodRange::all(), config)
}

/// Monthly arrivals of `year` correlated with that year's monthly total
/// across the configured countries.
pub fn analyze_monthly_pattern(
    monthly: &TimeSeriesStore,
    year: i32,
    config: &EngineConfig,
) -> Result<CorrelationReport> {
    let window = PeriodRange::year(year);
    let selected = monthly.select(&window)?;
    if selected.len() < 2 {
        return Err(EngineError::InsufficientData {
            found: selected.len(),
        });
    }

    let totals: Vec<f64> = selected
        .records()
        .iter()
        .map(|r| r.total_visitors(&config.countries) as f64)
        .collect();
    let correlations = config
        .countries
        .iter()
        .map(|country| match pearson(&selected.visitor_series(*country), &totals) {
            Ok(coefficient) => (Some(coefficient), None),
            Err(reason) => (None, Some(reason)),
        })
        .collect();
    build_report(&selected, correlations, AnalysisType::Monthly, window, config)
}

/// GDP correlation over the years within `RANGE_RADIUS_YEARS` of `year`,
/// clamped to the years the series actually holds.
pub fn analyze_around(
    yearly: &TimeSeriesStore,
    year: i32,
    config: &EngineConfig,
) -> Result<CorrelationReport> {
    let requested = PeriodRange::years(year - RANGE_RADIUS_YEARS, year + RANGE_RADIUS_YEARS);
    let selected = yearly.select(&requested)?;
    let window = selected
        .year_range()
        .map_or(requested, |(first, last)| PeriodRange::years(first, last));

    let mut report = analyze(&selected, config)?;
    report.analysis_type = AnalysisType::Range;
    report.window = window;
    Ok(report)
}

fn build_report(
    series: &TimeSeriesStore,
    correlations: Vec<(Option<f64>, Option<UndefinedCorrelation>)>,
    analysis_type: AnalysisType,
    window: PeriodRange,
    config: &EngineConfig,
) -> Result<CorrelationReport> {
    let mut per_country = BTreeMap::new();
    let mut undefined = BTreeMap::new();
    let mut averages = Vec::with_capacity(config.countries.len());

    for (country, (correlation, reason)) in config.countries.iter().zip(correlations) {
        per_country.insert(*country, correlation);
        if let Some(reason) = reason {
            undefined.insert(*country, reason);
        }
        let visitors = series.visitor_series(*country);
        averages.push((*country, visitors.iter().sum::<f64>() / visitors.len() as f64));
    }

    let top_by_volume = top_by(&averages).ok_or_else(|| {
        EngineError::invalid_config("country list is empty")
    })?;
    let defined: Vec<(CountryCode, f64)> = per_country
        .iter()
        .filter_map(|(country, correlation)| correlation.map(|c| (*country, c)))
        .collect();
    let (trend, trend_change_pct) = trend(series, config)?;

    Ok(CorrelationReport {
        analysis_type,
        window,
        per_country,
        undefined,
        top_country: top_by_volume,
        top_by_volume,
        top_by_correlation: top_by(&defined),
        trend,
        trend_change_pct,
    })
}

/// Highest value wins; equal values go to the earlier country in canonical order.
fn top_by(values: &[(CountryCode, f64)]) -> Option<CountryCode> {
    values
        .iter()
        .max_by(|(ca, a), (cb, b)| {
            a.partial_cmp(b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| cb.cmp(ca))
        })
        .map(|(country, _)| *country)
}

/// Direction of total visitors between the two latest periods, with the
/// percentage change when the earlier total is non-zero.
pub fn trend(series: &TimeSeriesStore, config: &EngineConfig) -> Result<(Trend, Option<f64>)> {
    let (previous, latest) = series.latest_two()?;
    let previous = previous.total_visitors(&config.countries) as f64;
    let latest = latest.total_visitors(&config.countries) as f64;

    if previous == 0.0 {
        let trend = if latest > 0.0 { Trend::Up } else { Trend::Flat };
        return Ok((trend, None));
    }

    let change_pct = (latest - previous) / previous * 100.0;
    let trend = if change_pct > config.trend_epsilon_pct {
        Trend::Up
    } else if change_pct < -config.trend_epsilon_pct {
        Trend::Down
    } else {
        Trend::Flat
    };
    Ok((trend, Some(change_pct)))
}
