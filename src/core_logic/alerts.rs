use crate::api::models::{Alert, Direction};
use crate::error::{EngineError, Result};
use crate::store::models::{CountryCode, TimeSeriesStore};

/// Surge/decline alerts between the two latest periods.
///
/// A country fires when `|percent_change| > threshold_pct`. Countries whose
/// previous count is zero are skipped. Alerts follow the order of
/// `countries`.
pub fn evaluate(
    series: &TimeSeriesStore,
    threshold_pct: f64,
    countries: &[CountryCode],
) -> Result<Vec<Alert>> {
    if !threshold_pct.is_finite() || threshold_pct < 0.0 {
        return Err(EngineError::InvalidThreshold(threshold_pct));
    }

    let (previous, latest) = series.latest_two()?;

    Ok(countries
        .iter()
        .filter_map(|country| {
            let before = previous.visitors_of(*country) as f64;
            let after = latest.visitors_of(*country) as f64;
            if before == 0.0 {
                return None;
            }

            // multiply first: exact for whole-number percentages
            let percent_change = (after - before) * 100.0 / before;
            if percent_change.abs() <= threshold_pct {
                return None;
            }

            Some(Alert {
                country: *country,
                period_a: previous.period,
                period_b: latest.period,
                percent_change,
                direction: if percent_change > 0.0 {
                    Direction::Increase
                } else {
                    Direction::Decrease
                },
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{Period, PeriodRecord};
    use approx::assert_abs_diff_eq;

    fn two_periods(before: &[(CountryCode, u64)], after: &[(CountryCode, u64)]) -> TimeSeriesStore {
        let previous = before
            .iter()
            .fold(PeriodRecord::yearly(2023, 4.0), |r, (c, v)| r.with_visitors(*c, *v));
        let latest = after
            .iter()
            .fold(PeriodRecord::yearly(2024, 4.5), |r, (c, v)| r.with_visitors(*c, *v));
        TimeSeriesStore::new(vec![previous, latest]).unwrap()
    }

    #[test]
    fn test_scenario_alerts() {
        // Arrange
        let series = two_periods(
            &[(CountryCode::Japan, 160_000), (CountryCode::Korea, 100_000)],
            &[(CountryCode::Japan, 180_000), (CountryCode::Korea, 130_000)],
        );

        // Act
        let alerts = evaluate(&series, 10.0, &CountryCode::ALL).unwrap();

        // Assert
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].country, CountryCode::Japan);
        assert_abs_diff_eq!(alerts[0].percent_change, 12.5, epsilon = 1e-9);
        assert_eq!(alerts[0].direction, Direction::Increase);
        assert_eq!(alerts[0].period_a, Period::Year(2023));
        assert_eq!(alerts[0].period_b, Period::Year(2024));

        assert_eq!(alerts[1].country, CountryCode::Korea);
        assert_abs_diff_eq!(alerts[1].percent_change, 30.0, epsilon = 1e-9);
        assert_eq!(alerts[1].direction, Direction::Increase);
    }

    #[test]
    fn test_threshold_boundary_is_strict() {
        let at_threshold = two_periods(&[(CountryCode::Usa, 1_000)], &[(CountryCode::Usa, 1_100)]);
        assert!(evaluate(&at_threshold, 10.0, &CountryCode::ALL)
            .unwrap()
            .is_empty());

        let above = two_periods(&[(CountryCode::Usa, 1_000)], &[(CountryCode::Usa, 1_101)]);
        let alerts = evaluate(&above, 10.0, &CountryCode::ALL).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_abs_diff_eq!(alerts[0].percent_change, 10.1, epsilon = 1e-9);
    }

    #[test]
    fn test_decline_and_zero_baseline() {
        let series = two_periods(
            &[(CountryCode::China, 10_000), (CountryCode::Taiwan, 0)],
            &[(CountryCode::China, 2_000), (CountryCode::Taiwan, 7_000)],
        );

        let alerts = evaluate(&series, 10.0, &CountryCode::ALL).unwrap();

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].country, CountryCode::China);
        assert_eq!(alerts[0].direction, Direction::Decrease);
        assert_abs_diff_eq!(alerts[0].percent_change, -80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_order_follows_country_list() {
        let series = two_periods(
            &[(CountryCode::Japan, 100), (CountryCode::Korea, 100)],
            &[(CountryCode::Japan, 200), (CountryCode::Korea, 200)],
        );

        let alerts = evaluate(&series, 10.0, &[CountryCode::Korea, CountryCode::Japan]).unwrap();

        let order: Vec<CountryCode> = alerts.iter().map(|a| a.country).collect();
        assert_eq!(order, vec![CountryCode::Korea, CountryCode::Japan]);
    }

    #[test]
    fn test_invalid_inputs() {
        let series = two_periods(&[(CountryCode::Japan, 1)], &[(CountryCode::Japan, 2)]);
        assert!(matches!(
            evaluate(&series, -1.0, &CountryCode::ALL),
            Err(EngineError::InvalidThreshold(_))
        ));

        let single = TimeSeriesStore::new(vec![PeriodRecord::yearly(2024, 4.5)]).unwrap();
        assert!(matches!(
            evaluate(&single, 10.0, &CountryCode::ALL),
            Err(EngineError::InsufficientData { found: 1 })
        ));
    }
}
