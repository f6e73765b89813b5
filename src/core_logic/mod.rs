pub mod alerts;
pub mod correlation;
pub mod data_processing;
pub mod engine;
pub mod prediction;
pub mod ranking;
pub mod seasonality;
pub mod year_adjuster;
