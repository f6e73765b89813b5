use crate::api::models::CountryRanking;
use crate::config::YearMultiplierTable;
use crate::core_logic::ranking::{economic_impact, sort_rankings};
use crate::error::{EngineError, Result};

/// Projects a baseline ranking onto `year`.
///
/// Only visitor volume is scaled; correlation and the per-tourist constant
/// carry over unchanged.
pub fn adjust(
    baseline: &[CountryRanking],
    year: i32,
    table: &YearMultiplierTable,
) -> Result<Vec<CountryRanking>> {
    if !table.covers(year) {
        return Err(EngineError::UnknownYear { year });
    }

    let mut adjusted = baseline
        .iter()
        .map(|ranking| {
            let multiplier = table.multiplier(ranking.country, year)?;
            let avg_visitors = ranking.avg_visitors * multiplier;
            Ok(CountryRanking {
                avg_visitors,
                total_economic_impact: economic_impact(avg_visitors, ranking.impact_per_tourist),
                ..ranking.clone()
            })
        })
        .collect::<Result<Vec<_>>>()?;

    sort_rankings(&mut adjusted);
    Ok(adjusted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::CountryCode;
    use approx::assert_abs_diff_eq;

    fn ranking(country: CountryCode, avg_visitors: f64, impact_per_tourist: f64) -> CountryRanking {
        CountryRanking {
            country,
            avg_visitors,
            correlation: Some(0.42),
            correlation_undefined: None,
            impact_per_tourist,
            total_economic_impact: economic_impact(avg_visitors, impact_per_tourist),
        }
    }

    fn baseline() -> Vec<CountryRanking> {
        let mut rankings = vec![
            ranking(CountryCode::Japan, 170_000.0, 800.0),
            ranking(CountryCode::Korea, 115_000.0, 600.0),
            ranking(CountryCode::Usa, 60_000.0, 1_800.0),
        ];
        sort_rankings(&mut rankings);
        rankings
    }

    #[test]
    fn test_identity_multipliers_keep_baseline() {
        let table = YearMultiplierTable::new().with_year(
            2023,
            [
                (CountryCode::Japan, 1.0),
                (CountryCode::Korea, 1.0),
                (CountryCode::Usa, 1.0),
            ],
        );

        let adjusted = adjust(&baseline(), 2023, &table).unwrap();

        assert_eq!(adjusted, baseline());
    }

    #[test]
    fn test_adjust_rescales_and_resorts() {
        // Arrange
        let table = YearMultiplierTable::new().with_year(
            2020,
            [(CountryCode::Japan, 0.4), (CountryCode::Korea, 1.5)],
        );

        // Act
        let adjusted = adjust(&baseline(), 2020, &table).unwrap();

        // Assert
        let order: Vec<CountryCode> = adjusted.iter().map(|r| r.country).collect();
        assert_eq!(
            order,
            vec![CountryCode::Usa, CountryCode::Korea, CountryCode::Japan]
        );

        let japan = &adjusted[2];
        assert_abs_diff_eq!(japan.avg_visitors, 68_000.0, epsilon = 1e-6);
        assert_abs_diff_eq!(japan.total_economic_impact, 54.4);
        assert_eq!(japan.correlation, Some(0.42));
        assert_abs_diff_eq!(japan.impact_per_tourist, 800.0);

        // no entry for usa in 2020 reads as 1.0
        assert_abs_diff_eq!(adjusted[0].avg_visitors, 60_000.0);
        assert_abs_diff_eq!(adjusted[0].total_economic_impact, 108.0);
    }

    #[test]
    fn test_unknown_year() {
        let table = YearMultiplierTable::new().with_year(2020, [(CountryCode::Japan, 0.4)]);

        assert!(matches!(
            adjust(&baseline(), 2019, &table),
            Err(EngineError::UnknownYear { year: 2019 })
        ));
    }
}
