use crate::error::{EngineError, Result};
use crate::store::models::{CountryCode, PeriodRecord, TimeSeriesStore};
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const MONTH_COLUMN: &str = "Month";

#[derive(Deserialize, Debug)]
struct GdpRow {
    #[serde(rename = "Year")]
    year: i32,
    #[serde(rename = "GDP")]
    gdp: f64, // billions
}

/// Reads monthly arrivals: a `Month` column (`YYYY-MM`) plus one column per
/// source market. Unknown columns such as `Total Arrivals` are ignored and
/// blank cells count as zero.
pub fn read_monthly_arrivals<R: Read>(reader: R) -> Result<TimeSeriesStore> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let month_index = headers
        .iter()
        .position(|h| h.trim() == MONTH_COLUMN)
        .ok_or_else(|| EngineError::invalid_series("arrivals file has no Month column"))?;
    let country_columns: Vec<(usize, CountryCode)> = headers
        .iter()
        .enumerate()
        .filter_map(|(index, header)| header.parse::<CountryCode>().ok().map(|c| (index, c)))
        .collect();

    if country_columns.is_empty() {
        return Err(EngineError::invalid_series(
            "arrivals file has no known country columns",
        ));
    }

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let raw_month = row.get(month_index).unwrap_or_default().trim();
        let date = NaiveDate::parse_from_str(&format!("{}-01", raw_month), "%Y-%m-%d")?;

        let mut record = PeriodRecord::monthly(date.year(), date.month());
        for (index, country) in &country_columns {
            let count = parse_count(row.get(*index).unwrap_or_default())?;
            record.visitors.insert(*country, count);
        }
        records.push(record);
    }

    records.sort_by_key(|r| r.period);
    info!(
        "Loaded {} monthly records for {} countries",
        records.len(),
        country_columns.len()
    );
    TimeSeriesStore::new(records)
}

pub fn load_monthly_arrivals(path: impl AsRef<Path>) -> Result<TimeSeriesStore> {
    read_monthly_arrivals(File::open(path)?)
}

/// Reads `Year,GDP` rows, GDP in billions.
pub fn read_yearly_gdp<R: Read>(reader: R) -> Result<BTreeMap<i32, f64>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut gdp_by_year = BTreeMap::new();

    for row in csv_reader.deserialize() {
        let row: GdpRow = row?;
        if gdp_by_year.insert(row.year, row.gdp).is_some() {
            warn!("GDP for {} appears more than once, keeping the last value", row.year);
        }
    }

    info!("Loaded GDP for {} years", gdp_by_year.len());
    Ok(gdp_by_year)
}

pub fn load_yearly_gdp(path: impl AsRef<Path>) -> Result<BTreeMap<i32, f64>> {
    read_yearly_gdp(File::open(path)?)
}

fn parse_count(raw: &str) -> Result<u64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '"').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Ok(0);
    }

    let value: f64 = cleaned
        .parse()
        .map_err(|_| EngineError::invalid_series(format!("'{}' is not a visitor count", raw)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::invalid_series(format!(
            "visitor count must be non-negative, got {}",
            raw
        )));
    }
    Ok(value.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{Granularity, Period};

    const ARRIVALS: &str = "\
Month,Korea,Japan,US/Hawaii,Philippines,Taiwan,China,Total Arrivals
2019-02,\"60,100\",55000,7000,1500,2300,900,126800
2019-01,58000,61000,,1400,2500,1000,123900
";

    #[test]
    fn test_read_monthly_arrivals() {
        // Act
        let store = read_monthly_arrivals(ARRIVALS.as_bytes()).unwrap();

        // Assert
        assert_eq!(store.granularity(), Granularity::Monthly);
        assert_eq!(
            store.periods(),
            vec![
                Period::Month { year: 2019, month: 1 },
                Period::Month { year: 2019, month: 2 }
            ]
        );
        let january = &store.records()[0];
        assert_eq!(january.visitors_of(CountryCode::Japan), 61_000);
        assert_eq!(january.visitors_of(CountryCode::Usa), 0);
        assert_eq!(store.records()[1].visitors_of(CountryCode::Korea), 60_100);
        assert_eq!(january.gdp, None);
    }

    #[test]
    fn test_rejects_bad_arrivals() {
        let no_month = "Date,Japan\n2019-01,5\n";
        assert!(read_monthly_arrivals(no_month.as_bytes()).is_err());

        let bad_date = "Month,Japan\nJanuary,5\n";
        assert!(matches!(
            read_monthly_arrivals(bad_date.as_bytes()),
            Err(EngineError::Date(_))
        ));

        let negative = "Month,Japan\n2019-01,-5\n";
        assert!(read_monthly_arrivals(negative.as_bytes()).is_err());

        let duplicate = "Month,Japan\n2019-01,5\n2019-01,6\n";
        assert!(read_monthly_arrivals(duplicate.as_bytes()).is_err());
    }

    #[test]
    fn test_read_yearly_gdp() {
        let raw = "Year,GDP\n2018,6.05\n2019,6.36\n";

        let gdp = read_yearly_gdp(raw.as_bytes()).unwrap();

        assert_eq!(gdp.len(), 2);
        assert_eq!(gdp[&2019], 6.36);
    }
}
