use crate::error::{EngineError, Result};
use crate::store::models::PeriodRange;

/// What a caller asked the ranking endpoint for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingRequest {
    Window(PeriodRange),
    Year(i32),
}

/// Parses `"all"`, `"2019"` or `"2014-2019"` into a window.
pub fn window_from_str(selector: &str) -> Result<PeriodRange> {
    let selector = selector.trim();
    if selector.is_empty() || selector.eq_ignore_ascii_case("all") {
        return Ok(PeriodRange::all());
    }

    match selector.split_once('-') {
        Some((first, last)) => {
            let first = parse_year(first)?;
            let last = parse_year(last)?;
            if first > last {
                return Err(EngineError::EmptyWindow(PeriodRange::years(first, last)));
            }
            Ok(PeriodRange::years(first, last))
        }
        None => Ok(PeriodRange::year(parse_year(selector)?)),
    }
}

/// A bare year asks for the year-adjusted ranking; anything else is a window.
pub fn ranking_request_from_str(selector: &str) -> Result<RankingRequest> {
    let window = window_from_str(selector)?;
    match (window.first_year, window.last_year) {
        (Some(first), Some(last)) if first == last && !selector.contains('-') => {
            Ok(RankingRequest::Year(first))
        }
        _ => Ok(RankingRequest::Window(window)),
    }
}

pub fn threshold_from_str(raw: &str) -> Result<f64> {
    let threshold: f64 = raw
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| EngineError::invalid_config(format!("'{}' is not a threshold", raw)))?;
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(EngineError::InvalidThreshold(threshold));
    }
    Ok(threshold)
}

fn parse_year(raw: &str) -> Result<i32> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| EngineError::invalid_config(format!("'{}' is not a year", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_from_str() {
        assert_eq!(window_from_str("all").unwrap(), PeriodRange::all());
        assert_eq!(window_from_str("").unwrap(), PeriodRange::all());
        assert_eq!(window_from_str("2019").unwrap(), PeriodRange::year(2019));
        assert_eq!(
            window_from_str("2014-2019").unwrap(),
            PeriodRange::years(2014, 2019)
        );
        assert!(window_from_str("2019-2014").is_err());
        assert!(window_from_str("last year").is_err());
    }

    #[test]
    fn test_ranking_request_from_str() {
        assert_eq!(
            ranking_request_from_str("2020").unwrap(),
            RankingRequest::Year(2020)
        );
        assert_eq!(
            ranking_request_from_str("2020-2020").unwrap(),
            RankingRequest::Window(PeriodRange::year(2020))
        );
        assert_eq!(
            ranking_request_from_str("ALL").unwrap(),
            RankingRequest::Window(PeriodRange::all())
        );
    }

    #[test]
    fn test_threshold_from_str() {
        assert_eq!(threshold_from_str("15").unwrap(), 15.0);
        assert_eq!(threshold_from_str("12.5%").unwrap(), 12.5);
        assert!(threshold_from_str("-3").is_err());
        assert!(threshold_from_str("abc").is_err());
    }
}
