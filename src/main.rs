#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use anyhow::Context;
use log::info;
use std::env;
use std::time::SystemTime;
use tourism_impact_engine::adapters::csv_fixture;
use tourism_impact_engine::api::lib::ranking_request_from_str;
use tourism_impact_engine::core_logic::data_processing::aggregate_yearly;
use tourism_impact_engine::{EngineConfig, TourismEngine};

const DEFAULT_MONTHLY_CSV: &str = "data/guam_monthly_arrivals.csv";
const DEFAULT_GDP_CSV: &str = "data/guam_gdp.csv";

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let now = SystemTime::now();
    let config = EngineConfig::from_env().context("loading engine configuration")?;

    let monthly_path =
        env::var("TOURISM_MONTHLY_CSV").unwrap_or_else(|_| DEFAULT_MONTHLY_CSV.to_string());
    let gdp_path = env::var("TOURISM_GDP_CSV").unwrap_or_else(|_| DEFAULT_GDP_CSV.to_string());

    let monthly = csv_fixture::load_monthly_arrivals(&monthly_path)
        .with_context(|| format!("reading monthly arrivals from {}", monthly_path))?;
    let gdp = csv_fixture::load_yearly_gdp(&gdp_path)
        .with_context(|| format!("reading GDP from {}", gdp_path))?;
    let yearly = aggregate_yearly(&monthly, &gdp, &config.countries)
        .context("aggregating monthly arrivals into years")?;

    let engine = TourismEngine::new(config, yearly, Some(monthly))?;

    // "all", "2014-2019" or a single year for the projected ranking
    let selector = env::args().nth(1).unwrap_or_else(|| "all".to_string());
    let request = ranking_request_from_str(&selector)?;
    let report = engine
        .dashboard(request)
        .with_context(|| format!("building report for '{}'", selector))?;

    info!(
        "Report built in {} ms",
        now.elapsed().map(|d| d.as_millis()).unwrap_or_default()
    );
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
