// Core structs: PriceRecord, DeclineEvent, RecoveryResult, RecoveryStatistics
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Recovery targets, in percent above the decline-day open.
pub const RECOVERY_TARGETS: [u32; 8] = [10, 15, 20, 30, 40, 50, 75, 100];

/// (target %, day window) pairs reported as timeframe-conditioned recovery rates.
pub const TIMEFRAME_WINDOWS: [(u32, i64); 7] = [
    (10, 30),
    (10, 60),
    (15, 30),
    (15, 60),
    (20, 30),
    (20, 60),
    (30, 90),
];

pub const DEFAULT_THRESHOLD: f64 = -20.0;

/// One symbol, one trading date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: u64,
    /// Open of the preceding record of the same symbol. Filled in by the series store.
    pub prev_open: Option<f64>,
}

impl PriceRecord {
    /// Day-over-day change of the opening price, in percent.
    pub fn daily_change_pct(&self) -> Option<f64> {
        self.prev_open
            .map(|prev| (self.open - prev) / prev * 100.0)
    }

    /// Open-to-close change within the day, in percent.
    pub fn intraday_change_pct(&self) -> f64 {
        (self.close - self.open) / self.open * 100.0
    }
}

/// A raw row as produced by a price source, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPriceRow {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub close: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclineEvent {
    pub symbol: String,
    pub date: NaiveDate,
    pub open_price: f64,
    pub prev_open: f64,
    pub close_price: f64,
    pub volume: u64,
    pub decline_pct: f64,
    pub company_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecoveryResult {
    pub event: DeclineEvent,
    /// Calendar days until each target was first reached. Unresolved targets are absent.
    pub recovery_days: BTreeMap<u32, i64>,
}

impl RecoveryResult {
    pub fn days_for(&self, target: u32) -> Option<i64> {
        self.recovery_days.get(&target).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetStats {
    pub average_days: Option<f64>,
    pub median_days: Option<f64>,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
    pub resolved_count: usize,
    pub total_count: usize,
    pub recovery_rate_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeframeStat {
    pub target: u32,
    pub window_days: i64,
    pub percentage: f64,
    pub count: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RecoveryStatistics {
    pub total_count: usize,
    pub per_target: BTreeMap<u32, TargetStats>,
    pub timeframe_percentages: Vec<TimeframeStat>,
}

/// Filters shared by every decline query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclineQuery {
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Case-insensitive substring of the symbol. Empty means no filter.
    #[serde(default)]
    pub symbol: Option<String>,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

impl Default for DeclineQuery {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            start_date: None,
            end_date: None,
            symbol: None,
        }
    }
}

impl DeclineQuery {
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn for_symbol(mut self, pattern: impl Into<String>) -> Self {
        self.symbol = Some(pattern.into());
        self
    }

    /// Lower-cased symbol pattern, or None when the filter is absent or empty.
    pub fn symbol_needle(&self) -> Option<String> {
        self.symbol
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetOverview {
    pub total_records: usize,
    pub unique_symbols: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub decline_count: usize,
    pub worst_decline: Option<DeclineEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockListing {
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record dated {0} has an empty symbol")]
    EmptySymbol(NaiveDate),
    #[error("{symbol} on {date}: open price {open} is not a positive finite number")]
    InvalidOpen {
        symbol: String,
        date: NaiveDate,
        open: f64,
    },
    #[error("{symbol} has more than one record on {date}")]
    DuplicateDate { symbol: String, date: NaiveDate },
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("line {line}: invalid date {value:?}")]
    InvalidDate { line: u64, value: String },
    #[error("line {line}: invalid number {value:?} in column {column}")]
    InvalidNumber {
        line: u64,
        column: String,
        value: String,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("deadline exceeded after {completed} of {total} symbols")]
    DeadlineExceeded { completed: usize, total: usize },
    #[error("worker failed: {0}")]
    Worker(String),
}
