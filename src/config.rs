use crate::model::DeclineQuery;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct ImportConfig {
    pub stocks_csv: String,
    #[serde(default)]
    pub companies_csv: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryConfig {
    pub name: String,
    #[serde(flatten)]
    pub query: DeclineQuery,
}

/// A symbol whose price history is copied into the report.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub symbol: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub database_path: String,
    pub report_path: String,
    #[serde(default)]
    pub import: Option<ImportConfig>,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub deadline_seconds: Option<u64>,
    #[serde(default)]
    pub histories: Vec<HistoryConfig>,
    pub queries: Vec<QueryConfig>,
}

fn default_workers() -> usize {
    4
}

impl AppConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_seconds.map(Duration::from_secs)
    }
}

pub fn parse_config(content: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config: AppConfig = serde_json::from_str(content)?;
    Ok(config)
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
