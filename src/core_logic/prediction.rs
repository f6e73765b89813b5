use crate::api::models::GdpImpactPrediction;
use crate::core_logic::data_processing::round_to;
use crate::error::{EngineError, Result};
use crate::store::models::{CountryCode, TimeSeriesStore};
use std::collections::BTreeMap;

/// What-if projection: applies percentage changes per country to the latest
/// period and converts the visitor delta into GDP with a linear factor
/// (`gdp_per_thousand_visitors` billions per 1,000 visitors).
///
/// Countries without an entry in `changes_pct` keep their baseline.
pub fn predict_gdp_impact(
    series: &TimeSeriesStore,
    changes_pct: &BTreeMap<CountryCode, f64>,
    countries: &[CountryCode],
    gdp_per_thousand_visitors: f64,
) -> Result<GdpImpactPrediction> {
    let latest = series
        .latest()
        .ok_or(EngineError::InsufficientData { found: 0 })?;
    let current_gdp = latest.gdp.ok_or(EngineError::MissingGdp(latest.period))?;

    if let Some((country, pct)) = changes_pct.iter().find(|(_, pct)| !pct.is_finite()) {
        return Err(EngineError::invalid_series(format!(
            "change for {} must be finite, got {}",
            country, pct
        )));
    }

    let baseline_visitors: BTreeMap<CountryCode, f64> = countries
        .iter()
        .map(|country| (*country, latest.visitors_of(*country) as f64))
        .collect();
    let predicted_visitors: BTreeMap<CountryCode, f64> = baseline_visitors
        .iter()
        .map(|(country, baseline)| {
            let change = changes_pct.get(country).copied().unwrap_or(0.0) / 100.0;
            (*country, baseline * (1.0 + change))
        })
        .collect();

    let visitor_change =
        predicted_visitors.values().sum::<f64>() - baseline_visitors.values().sum::<f64>();
    let gdp_impact = visitor_change / 1000.0 * gdp_per_thousand_visitors;
    let impact_percentage = if current_gdp > 0.0 {
        gdp_impact / current_gdp * 100.0
    } else {
        0.0
    };

    Ok(GdpImpactPrediction {
        baseline_period: latest.period,
        baseline_visitors,
        predicted_visitors,
        visitor_change,
        gdp_impact: round_to(gdp_impact, 3),
        current_gdp,
        predicted_gdp: round_to(current_gdp + gdp_impact, 2),
        impact_percentage: round_to(impact_percentage, 2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{Period, PeriodRecord};
    use approx::assert_abs_diff_eq;

    fn series() -> TimeSeriesStore {
        TimeSeriesStore::new(vec![
            PeriodRecord::yearly(2023, 4.0).with_visitors(CountryCode::Japan, 160_000),
            PeriodRecord::yearly(2024, 4.5)
                .with_visitors(CountryCode::Japan, 180_000)
                .with_visitors(CountryCode::Korea, 130_000),
        ])
        .unwrap()
    }

    #[test]
    fn test_predict_gdp_impact() {
        // Arrange
        let changes = BTreeMap::from([(CountryCode::Japan, 10.0), (CountryCode::Korea, -20.0)]);

        // Act
        let prediction = predict_gdp_impact(
            &series(),
            &changes,
            &[CountryCode::Japan, CountryCode::Korea],
            0.01,
        )
        .unwrap();

        // Assert
        assert_eq!(prediction.baseline_period, Period::Year(2024));
        assert_abs_diff_eq!(prediction.predicted_visitors[&CountryCode::Japan], 198_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(prediction.predicted_visitors[&CountryCode::Korea], 104_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(prediction.visitor_change, -8_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(prediction.gdp_impact, -0.08, epsilon = 1e-9);
        assert_abs_diff_eq!(prediction.predicted_gdp, 4.42, epsilon = 1e-9);
        assert_abs_diff_eq!(prediction.impact_percentage, -1.78, epsilon = 1e-9);
    }

    #[test]
    fn test_no_changes_is_neutral() {
        let prediction =
            predict_gdp_impact(&series(), &BTreeMap::new(), &CountryCode::ALL, 0.01).unwrap();

        assert_abs_diff_eq!(prediction.visitor_change, 0.0);
        assert_abs_diff_eq!(prediction.predicted_gdp, 4.5);
    }

    #[test]
    fn test_missing_gdp() {
        let monthly = TimeSeriesStore::new(vec![PeriodRecord::monthly(2024, 5)]).unwrap();

        assert!(matches!(
            predict_gdp_impact(&monthly, &BTreeMap::new(), &CountryCode::ALL, 0.01),
            Err(EngineError::MissingGdp(_))
        ));
    }
}
