use crate::api::models::{CountryRanking, RankingSummary};
use crate::config::EngineConfig;
use crate::core_logic::data_processing::{correlate_with_gdp, round_to};
use crate::error::Result;
use crate::store::models::{CountryCode, PeriodRange, TimeSeriesStore};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Economic impact in millions, rounded to one decimal.
pub fn economic_impact(avg_visitors: f64, impact_per_tourist: f64) -> f64 {
    round_to(avg_visitors * impact_per_tourist / 1_000_000.0, 1)
}

/// Descending impact, then descending average visitors, then canonical
/// country order.
pub fn ranking_order(a: &CountryRanking, b: &CountryRanking) -> Ordering {
    b.total_economic_impact
        .partial_cmp(&a.total_economic_impact)
        .unwrap_or(Ordering::Equal)
        .then_with(|| {
            b.avg_visitors
                .partial_cmp(&a.avg_visitors)
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.country.cmp(&b.country))
}

pub fn sort_rankings(rankings: &mut [CountryRanking]) {
    rankings.sort_by(ranking_order);
}

/// Ranks every configured country over `window`.
pub fn rank(
    series: &TimeSeriesStore,
    window: &PeriodRange,
    config: &EngineConfig,
) -> Result<Vec<CountryRanking>> {
    let selected = series.select(window)?;
    let gdp = selected.gdp_series();

    let mut rankings: Vec<CountryRanking> = config
        .countries
        .par_iter()
        .map(|country| rank_country(&selected, gdp.as_deref(), *country, config))
        .collect::<Result<Vec<_>>>()?;

    sort_rankings(&mut rankings);
    Ok(rankings)
}

fn rank_country(
    selected: &TimeSeriesStore,
    gdp: Option<&[f64]>,
    country: CountryCode,
    config: &EngineConfig,
) -> Result<CountryRanking> {
    let visitors = selected.visitor_series(country);
    let avg_visitors = visitors.iter().sum::<f64>() / visitors.len() as f64;
    let impact_per_tourist = config.impact_per_tourist(country)?;
    let (correlation, correlation_undefined) = correlate_with_gdp(&visitors, gdp);

    Ok(CountryRanking {
        country,
        avg_visitors,
        correlation,
        correlation_undefined,
        impact_per_tourist,
        total_economic_impact: economic_impact(avg_visitors, impact_per_tourist),
    })
}

/// Totals shown next to the ranking table.
pub fn summarize(
    series: &TimeSeriesStore,
    window: &PeriodRange,
    rankings: &[CountryRanking],
    config: &EngineConfig,
) -> Result<RankingSummary> {
    let selected = series.select(window)?;

    Ok(RankingSummary {
        total_annual_average: rankings.iter().map(|r| r.avg_visitors).sum(),
        total_cumulative: selected
            .records()
            .iter()
            .fold(0u64, |total, r| {
                total.saturating_add(r.total_visitors(&config.countries))
            }),
        periods_count: selected.len(),
        total_economic_impact: round_to(
            rankings.iter().map(|r| r.total_economic_impact).sum(),
            1,
        ),
    })
}

/// Totals for a single projected year, where the ranking itself is the only
/// source of visitor counts.
pub fn summarize_projection(rankings: &[CountryRanking]) -> RankingSummary {
    let total_annual_average: f64 = rankings.iter().map(|r| r.avg_visitors).sum();

    RankingSummary {
        total_annual_average,
        total_cumulative: total_annual_average.round() as u64,
        periods_count: 1,
        total_economic_impact: round_to(
            rankings.iter().map(|r| r.total_economic_impact).sum(),
            1,
        ),
    }
}
