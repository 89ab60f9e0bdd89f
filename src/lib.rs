//! Detection of sharp opening-price declines in daily equity series and of the
//! time each decline took to recover by fixed percentage targets.

pub mod analyzer;
pub mod config;
pub mod model;
pub mod normalizer;
pub mod parser;
pub mod report;
pub mod source;
pub mod storage;
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerImpl, QueryAnalysis};
pub use model::{
    DeclineEvent, DeclineQuery, PriceRecord, RecoveryResult, RecoveryStatistics, RECOVERY_TARGETS,
};
pub use storage::{CompanyDirectory, SeriesStore};
