use crate::api::models::{MarketSeason, SeasonalProfile, YearlyCountryStats};
use crate::error::{EngineError, Result};
use crate::store::models::{CountryCode, Granularity, PeriodRecord, TimeSeriesStore};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

pub const PEAK_RATIO: f64 = 1.2;
pub const LOW_RATIO: f64 = 0.8;
pub const MARKET_SEASON_MONTHS: usize = 4;

/// Classifies each country's 12 monthly averages against its own mean.
pub fn seasonality(
    monthly: &BTreeMap<CountryCode, Vec<f64>>,
) -> Result<BTreeMap<CountryCode, SeasonalProfile>> {
    monthly
        .iter()
        .map(|(country, values)| Ok((*country, profile(*country, values)?)))
        .collect()
}

fn profile(country: CountryCode, values: &[f64]) -> Result<SeasonalProfile> {
    if values.len() != 12 {
        return Err(EngineError::IncompleteMonthData {
            country,
            found: values.len(),
        });
    }

    let mean = values.iter().sum::<f64>() / 12.0;
    let mut peak_months = BTreeSet::new();
    let mut low_months = BTreeSet::new();

    for (month, value) in (1..=12u32).zip(values.iter()) {
        if *value > mean * PEAK_RATIO {
            peak_months.insert(month);
        } else if *value < mean * LOW_RATIO {
            low_months.insert(month);
        }
    }

    let max = values.iter().copied().fold(f64::MIN, f64::max);
    let min = values.iter().copied().fold(f64::MAX, f64::min);
    let variation_pct = if mean > 0.0 {
        (max - min) / mean * 100.0
    } else {
        0.0
    };

    Ok(SeasonalProfile {
        peak_months,
        low_months,
        mean,
        variation_pct,
    })
}

/// `(most variable, most stable)` country by `variation_pct`. Ties go to the
/// earlier country in canonical order.
pub fn variation_extremes(
    profiles: &BTreeMap<CountryCode, SeasonalProfile>,
) -> Option<(CountryCode, CountryCode)> {
    let mut entries = profiles
        .iter()
        .map(|(country, profile)| (*country, profile.variation_pct));
    let first = entries.next()?;

    let (mut most_variable, mut most_stable) = (first, first);
    for entry in entries {
        if entry.1 > most_variable.1 {
            most_variable = entry;
        }
        if entry.1 < most_stable.1 {
            most_stable = entry;
        }
    }
    Some((most_variable.0, most_stable.0))
}

/// Sums the 12-month profiles of all countries and picks the `n` busiest and
/// `n` quietest calendar months, busiest (or quietest) first. Equal totals go
/// to the earlier month.
pub fn market_season(
    monthly: &BTreeMap<CountryCode, Vec<f64>>,
    n: usize,
) -> Result<MarketSeason> {
    let mut monthly_totals = vec![0.0; 12];
    for (country, values) in monthly {
        if values.len() != 12 {
            return Err(EngineError::IncompleteMonthData {
                country: *country,
                found: values.len(),
            });
        }
        for (total, value) in monthly_totals.iter_mut().zip(values) {
            *total += value;
        }
    }

    let mut ranked: Vec<(u32, f64)> = (1..=12u32).zip(monthly_totals.iter().copied()).collect();
    let n = n.min(ranked.len());

    ranked.sort_by(|(ma, a), (mb, b)| {
        b.partial_cmp(a).unwrap_or(Ordering::Equal).then(ma.cmp(mb))
    });
    let peak_months = ranked.iter().take(n).map(|(month, _)| *month).collect();

    ranked.sort_by(|(ma, a), (mb, b)| {
        a.partial_cmp(b).unwrap_or(Ordering::Equal).then(ma.cmp(mb))
    });
    let low_months = ranked.iter().take(n).map(|(month, _)| *month).collect();

    Ok(MarketSeason {
        monthly_totals,
        peak_months,
        low_months,
    })
}

/// Per calendar year, per country: total, monthly average and the months
/// with the highest and lowest arrivals (earliest month on ties).
pub fn yearly_stats(
    monthly: &TimeSeriesStore,
    countries: &[CountryCode],
) -> Result<BTreeMap<i32, BTreeMap<CountryCode, YearlyCountryStats>>> {
    if monthly.granularity() != Granularity::Monthly {
        return Err(EngineError::invalid_series(
            "yearly stats expect a monthly series",
        ));
    }

    let mut grouped: BTreeMap<i32, Vec<(u32, &PeriodRecord)>> = BTreeMap::new();
    for record in monthly.records() {
        let month = record.period.month().unwrap_or(0);
        grouped
            .entry(record.period.year())
            .or_default()
            .push((month, record));
    }

    let mut stats = BTreeMap::new();
    for (year, months) in grouped {
        let mut per_country = BTreeMap::new();
        for country in countries {
            let values: Vec<(u32, u64)> = months
                .iter()
                .map(|(month, record)| (*month, record.visitors_of(*country)))
                .collect();
            let total = values
                .iter()
                .fold(0u64, |total, (_, v)| total.saturating_add(*v));

            let mut peak = values[0];
            let mut low = values[0];
            for entry in &values[1..] {
                if entry.1 > peak.1 {
                    peak = *entry;
                }
                if entry.1 < low.1 {
                    low = *entry;
                }
            }

            per_country.insert(
                *country,
                YearlyCountryStats {
                    total,
                    average: total as f64 / values.len() as f64,
                    peak_month: peak.0,
                    low_month: low.0,
                },
            );
        }
        stats.insert(year, per_country);
    }

    Ok(stats)
}
