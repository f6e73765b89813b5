use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Source market tracked by the dashboard.
///
/// The declaration order is the canonical country order used for
/// deterministic tie-breaking.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CountryCode {
    Japan,
    Korea,
    Usa,
    China,
    Philippines,
    Taiwan,
}

impl CountryCode {
    pub const ALL: [CountryCode; 6] = [
        CountryCode::Japan,
        CountryCode::Korea,
        CountryCode::Usa,
        CountryCode::China,
        CountryCode::Philippines,
        CountryCode::Taiwan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CountryCode::Japan => "japan",
            CountryCode::Korea => "korea",
            CountryCode::Usa => "usa",
            CountryCode::China => "china",
            CountryCode::Philippines => "philippines",
            CountryCode::Taiwan => "taiwan",
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CountryCode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "japan" => Ok(CountryCode::Japan),
            "korea" => Ok(CountryCode::Korea),
            // arrivals data reports the US market as "US/Hawaii"
            "usa" | "us" | "us/hawaii" | "us_hawaii" => Ok(CountryCode::Usa),
            "china" => Ok(CountryCode::China),
            "philippines" => Ok(CountryCode::Philippines),
            "taiwan" => Ok(CountryCode::Taiwan),
            other => Err(EngineError::invalid_series(format!(
                "unknown country '{}'",
                other
            ))),
        }
    }
}

/// Observation key: a calendar year or a (year, month) pair.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(untagged)]
pub enum Period {
    Year(i32),
    Month { year: i32, month: u32 },
}

impl Period {
    pub fn year(&self) -> i32 {
        match *self {
            Period::Year(year) => year,
            Period::Month { year, .. } => year,
        }
    }

    pub fn month(&self) -> Option<u32> {
        match *self {
            Period::Year(_) => None,
            Period::Month { month, .. } => Some(month),
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            Period::Year(_) => Granularity::Yearly,
            Period::Month { .. } => Granularity::Monthly,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year(year) => write!(f, "{}", year),
            Period::Month { year, month } => write!(f, "{}-{:02}", year, month),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Yearly,
    Monthly,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PeriodRecord {
    pub period: Period,
    pub gdp: Option<f64>, // billions; monthly series usually carry none
    pub visitors: BTreeMap<CountryCode, u64>,
}

impl PeriodRecord {
    pub fn yearly(year: i32, gdp: f64) -> Self {
        Self {
            period: Period::Year(year),
            gdp: Some(gdp),
            visitors: BTreeMap::new(),
        }
    }

    pub fn monthly(year: i32, month: u32) -> Self {
        Self {
            period: Period::Month { year, month },
            gdp: None,
            visitors: BTreeMap::new(),
        }
    }

    pub fn with_visitors(mut self, country: CountryCode, count: u64) -> Self {
        self.visitors.insert(country, count);
        self
    }

    /// Missing counts read as zero.
    pub fn visitors_of(&self, country: CountryCode) -> u64 {
        self.visitors.get(&country).copied().unwrap_or(0)
    }

    /// Saturates at `u64::MAX` instead of overflowing.
    pub fn total_visitors(&self, countries: &[CountryCode]) -> u64 {
        countries
            .iter()
            .fold(0u64, |total, c| total.saturating_add(self.visitors_of(*c)))
    }
}

/// Year-based window over a series. Open bounds select everything on that side.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodRange {
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
}

impl PeriodRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn years(first_year: i32, last_year: i32) -> Self {
        Self {
            first_year: Some(first_year),
            last_year: Some(last_year),
        }
    }

    pub fn year(year: i32) -> Self {
        Self::years(year, year)
    }

    pub fn before(year: i32) -> Self {
        Self {
            first_year: None,
            last_year: Some(year - 1),
        }
    }

    pub fn is_all(&self) -> bool {
        self.first_year.is_none() && self.last_year.is_none()
    }

    pub fn contains(&self, period: &Period) -> bool {
        let year = period.year();
        self.first_year.map_or(true, |first| year >= first)
            && self.last_year.map_or(true, |last| year <= last)
    }
}

impl fmt::Display for PeriodRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first_year, self.last_year) {
            (None, None) => write!(f, "all"),
            (Some(first), Some(last)) if first == last => write!(f, "{}", first),
            (Some(first), Some(last)) => write!(f, "{}-{}", first, last),
            (Some(first), None) => write!(f, "{}-", first),
            (None, Some(last)) => write!(f, "-{}", last),
        }
    }
}

/// Immutable, validated snapshot of one yearly or monthly series.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TimeSeriesStore {
    granularity: Granularity,
    records: Vec<PeriodRecord>,
}

impl TimeSeriesStore {
    /// Validates that the series is non-empty, uses a single granularity,
    /// is strictly ascending and carries sane GDP values.
    pub fn new(records: Vec<PeriodRecord>) -> Result<Self> {
        let first = records
            .first()
            .ok_or_else(|| EngineError::invalid_series("series contains no periods"))?;
        let granularity = first.period.granularity();

        for record in &records {
            if record.period.granularity() != granularity {
                return Err(EngineError::invalid_series(format!(
                    "period {} mixes yearly and monthly records",
                    record.period
                )));
            }
            if let Some(month) = record.period.month() {
                if !(1..=12).contains(&month) {
                    return Err(EngineError::invalid_series(format!(
                        "month {} out of range in {}",
                        month, record.period
                    )));
                }
            }
            if let Some(gdp) = record.gdp {
                if !gdp.is_finite() || gdp < 0.0 {
                    return Err(EngineError::invalid_series(format!(
                        "GDP {} for {} must be a non-negative number",
                        gdp, record.period
                    )));
                }
            }
        }

        if let Some(pair) = records.windows(2).find(|w| w[0].period >= w[1].period) {
            return Err(EngineError::invalid_series(format!(
                "periods must be strictly ascending: {} then {}",
                pair[0].period, pair[1].period
            )));
        }

        Ok(Self {
            granularity,
            records,
        })
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn records(&self) -> &[PeriodRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn periods(&self) -> Vec<Period> {
        self.records.iter().map(|r| r.period).collect()
    }

    /// Sub-series restricted to `window`.
    pub fn select(&self, window: &PeriodRange) -> Result<TimeSeriesStore> {
        let records: Vec<PeriodRecord> = self
            .records
            .iter()
            .filter(|r| window.contains(&r.period))
            .cloned()
            .collect();

        if records.is_empty() {
            return Err(EngineError::EmptyWindow(*window));
        }

        Ok(TimeSeriesStore {
            granularity: self.granularity,
            records,
        })
    }

    pub fn visitor_series(&self, country: CountryCode) -> Vec<f64> {
        self.records
            .iter()
            .map(|r| r.visitors_of(country) as f64)
            .collect()
    }

    /// `None` unless every period carries GDP.
    pub fn gdp_series(&self) -> Option<Vec<f64>> {
        self.records.iter().map(|r| r.gdp).collect()
    }

    /// The two chronologically last records as `(previous, latest)`.
    pub fn latest_two(&self) -> Result<(&PeriodRecord, &PeriodRecord)> {
        match self.records.as_slice() {
            [.., previous, latest] => Ok((previous, latest)),
            _ => Err(EngineError::InsufficientData {
                found: self.records.len(),
            }),
        }
    }

    pub fn latest(&self) -> Option<&PeriodRecord> {
        self.records.last()
    }

    pub fn year_range(&self) -> Option<(i32, i32)> {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => Some((first.period.year(), last.period.year())),
            _ => None,
        }
    }
}
