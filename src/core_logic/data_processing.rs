use crate::api::models::UndefinedCorrelation;
use crate::error::{EngineError, Result};
use crate::store::models::{CountryCode, Granularity, PeriodRange, PeriodRecord, TimeSeriesStore};
use log::debug;
use ndarray::Array2;
use ndarray_stats::CorrelationExt;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Pearson correlation between two aligned series.
///
/// Returns the reason instead of a value when the coefficient is undefined
/// (fewer than two observations or a constant series).
pub fn pearson(x: &[f64], y: &[f64]) -> std::result::Result<f64, UndefinedCorrelation> {
    let n = x.len().min(y.len());
    if n < 2 {
        return Err(UndefinedCorrelation::TooFewPeriods);
    }
    let (x, y) = (&x[..n], &y[..n]);
    if is_constant(x) || is_constant(y) {
        return Err(UndefinedCorrelation::ZeroVariance);
    }

    let observations = Array2::from_shape_vec((2, n), x.iter().chain(y.iter()).copied().collect())
        .map_err(|_| UndefinedCorrelation::TooFewPeriods)?;
    let correlation_matrix = observations
        .pearson_correlation()
        .map_err(|_| UndefinedCorrelation::TooFewPeriods)?;

    let coefficient = correlation_matrix[[0, 1]];
    if !coefficient.is_finite() {
        return Err(UndefinedCorrelation::ZeroVariance);
    }
    Ok(coefficient.clamp(-1.0, 1.0))
}

/// Correlation of a visitor series against GDP, or the reason it is missing.
pub fn correlate_with_gdp(
    visitors: &[f64],
    gdp: Option<&[f64]>,
) -> (Option<f64>, Option<UndefinedCorrelation>) {
    match gdp.map(|gdp| pearson(visitors, gdp)) {
        Some(Ok(coefficient)) => (Some(coefficient), None),
        Some(Err(reason)) => (None, Some(reason)),
        None => (None, Some(UndefinedCorrelation::GdpUnavailable)),
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// One row per period: `year`, `month` (monthly series only) and one
/// visitor column per country.
pub fn store_to_dataframe(store: &TimeSeriesStore, countries: &[CountryCode]) -> Result<DataFrame> {
    let records = store.records();
    let mut columns = vec![Series::new(
        "year",
        records.iter().map(|r| r.period.year()).collect::<Vec<i32>>(),
    )];

    if store.granularity() == Granularity::Monthly {
        columns.push(Series::new(
            "month",
            records
                .iter()
                .map(|r| r.period.month().unwrap_or(0) as i32)
                .collect::<Vec<i32>>(),
        ));
    }

    for country in countries {
        columns.push(Series::new(
            country.as_str(),
            records
                .iter()
                .map(|r| r.visitors_of(*country) as f64)
                .collect::<Vec<f64>>(),
        ));
    }

    Ok(DataFrame::new(columns)?)
}

/// Sums monthly arrivals per calendar year and joins yearly GDP (billions).
/// Years missing from either side are dropped.
pub fn aggregate_yearly(
    monthly: &TimeSeriesStore,
    gdp_by_year: &BTreeMap<i32, f64>,
    countries: &[CountryCode],
) -> Result<TimeSeriesStore> {
    if monthly.granularity() != Granularity::Monthly {
        return Err(EngineError::invalid_series(
            "yearly aggregation expects a monthly series",
        ));
    }

    let df = store_to_dataframe(monthly, countries)?;
    let yearly_df = df
        .lazy()
        .group_by(vec![col("year")])
        .agg(
            countries
                .iter()
                .map(|country| col(country.as_str()).sum())
                .collect::<Vec<Expr>>(),
        )
        .sort("year", Default::default())
        .collect()?;

    let gdp_df = DataFrame::new(vec![
        Series::new("year", gdp_by_year.keys().copied().collect::<Vec<i32>>()),
        Series::new("gdp", gdp_by_year.values().copied().collect::<Vec<f64>>()),
    ])?;

    let combined_df = yearly_df.inner_join(&gdp_df, ["year"], ["year"])?;

    let years = i32_column(&combined_df, "year")?;
    let gdp = f64_column(&combined_df, "gdp")?;
    let mut records: Vec<PeriodRecord> = years
        .iter()
        .zip(gdp.iter())
        .map(|(year, gdp)| PeriodRecord::yearly(*year, *gdp))
        .collect();

    for country in countries {
        let totals = f64_column(&combined_df, country.as_str())?;
        for (record, total) in records.iter_mut().zip(totals) {
            record.visitors.insert(*country, total.round() as u64);
        }
    }

    records.sort_by_key(|r| r.period);
    debug!(
        "Aggregated {} monthly records into {} yearly records",
        monthly.len(),
        records.len()
    );

    TimeSeriesStore::new(records)
}

/// Average value per calendar month per country over `window`.
///
/// Each vector is ordered January..December. Months absent from the window
/// are absent from the vector, so a short history yields fewer than 12
/// entries.
pub fn monthly_profiles(
    monthly: &TimeSeriesStore,
    window: &PeriodRange,
    countries: &[CountryCode],
) -> Result<BTreeMap<CountryCode, Vec<f64>>> {
    if monthly.granularity() != Granularity::Monthly {
        return Err(EngineError::invalid_series(
            "monthly profiles expect a monthly series",
        ));
    }

    let selected = monthly.select(window)?;
    let df = store_to_dataframe(&selected, countries)?;
    let profile_df = df
        .lazy()
        .group_by(vec![col("month")])
        .agg(
            countries
                .iter()
                .map(|country| col(country.as_str()).mean())
                .collect::<Vec<Expr>>(),
        )
        .sort("month", Default::default())
        .collect()?;

    debug!(
        "Built monthly profiles for window {} from {} records ({} months)",
        window,
        selected.len(),
        profile_df.height()
    );

    countries
        .iter()
        .map(|country| Ok((*country, f64_column(&profile_df, country.as_str())?)))
        .collect()
}

fn f64_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    Ok(df
        .column(name)?
        .f64()?
        .into_iter()
        .map(|value| value.unwrap_or(0.0))
        .collect())
}

fn i32_column(df: &DataFrame, name: &str) -> Result<Vec<i32>> {
    Ok(df
        .column(name)?
        .i32()?
        .into_iter()
        .map(|value| value.unwrap_or(0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn monthly_store(years: &[i32]) -> TimeSeriesStore {
        let mut records = Vec::new();
        for year in years {
            for month in 1..=12u32 {
                let offset = (*year - 2018) as u64 * 100;
                records.push(
                    PeriodRecord::monthly(*year, month)
                        .with_visitors(CountryCode::Japan, 1_000 + month as u64 * 10 + offset)
                        .with_visitors(CountryCode::Korea, 500),
                );
            }
        }
        TimeSeriesStore::new(records).unwrap()
    }

    #[test]
    fn test_pearson() {
        assert_abs_diff_eq!(pearson(&[1.0, 2.0], &[3.0, 4.0]).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            pearson(&[1.0, 2.0, 3.0], &[6.0, 4.0, 2.0]).unwrap(),
            -1.0,
            epsilon = 1e-12
        );
        assert_abs_diff_eq!(
            pearson(&[1.0, 2.0, 3.0, 4.0], &[2.0, 1.0, 4.0, 3.0]).unwrap(),
            0.6,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_pearson_undefined() {
        assert_eq!(pearson(&[1.0], &[2.0]), Err(UndefinedCorrelation::TooFewPeriods));
        assert_eq!(
            pearson(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]),
            Err(UndefinedCorrelation::ZeroVariance)
        );
        assert_eq!(
            correlate_with_gdp(&[1.0, 2.0], None),
            (None, Some(UndefinedCorrelation::GdpUnavailable))
        );
    }

    #[test]
    fn test_round_to() {
        assert_abs_diff_eq!(round_to(136.04, 1), 136.0);
        assert_abs_diff_eq!(round_to(0.12345, 3), 0.123);
    }

    #[test]
    fn test_store_to_dataframe() {
        let store = monthly_store(&[2018]);
        let df = store_to_dataframe(&store, &[CountryCode::Japan, CountryCode::Korea]).unwrap();

        assert_eq!(df.shape(), (12, 4));
        assert_eq!(f64_column(&df, "korea").unwrap(), vec![500.0; 12]);
        assert_eq!(i32_column(&df, "month").unwrap(), (1..=12).collect::<Vec<i32>>());
    }

    #[test]
    fn test_aggregate_yearly_joins_gdp() {
        let store = monthly_store(&[2018, 2019, 2020]);
        let gdp: BTreeMap<i32, f64> = [(2018, 6.05), (2019, 6.36)].into_iter().collect();

        let yearly = aggregate_yearly(&store, &gdp, &[CountryCode::Japan, CountryCode::Korea])
            .unwrap();

        assert_eq!(yearly.len(), 2);
        let first = &yearly.records()[0];
        assert_eq!(first.period.year(), 2018);
        assert_eq!(first.gdp, Some(6.05));
        // 12 * 1000 + 10 * (1 + .. + 12)
        assert_eq!(first.visitors_of(CountryCode::Japan), 12_780);
        assert_eq!(first.visitors_of(CountryCode::Korea), 6_000);
        assert_eq!(yearly.records()[1].visitors_of(CountryCode::Japan), 13_980);
    }

    #[test]
    fn test_monthly_profiles_average_across_years() {
        let store = monthly_store(&[2018, 2019]);

        let profiles = monthly_profiles(&store, &PeriodRange::all(), &[CountryCode::Japan]).unwrap();
        let japan = &profiles[&CountryCode::Japan];

        assert_eq!(japan.len(), 12);
        assert_abs_diff_eq!(japan[0], 1_060.0, epsilon = 1e-9);
        assert_abs_diff_eq!(japan[11], 1_170.0, epsilon = 1e-9);

        let only_2019 =
            monthly_profiles(&store, &PeriodRange::year(2019), &[CountryCode::Japan]).unwrap();
        assert_abs_diff_eq!(only_2019[&CountryCode::Japan][0], 1_110.0, epsilon = 1e-9);
    }

    #[test]
    fn test_monthly_profiles_empty_window() {
        let store = monthly_store(&[2018]);
        let result = monthly_profiles(&store, &PeriodRange::year(2010), &[CountryCode::Japan]);
        assert!(matches!(result, Err(EngineError::EmptyWindow(_))));
    }
}
