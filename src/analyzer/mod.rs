// Analyzer module: decline detection, recovery times and their statistics.

pub mod decline;
pub mod engine;
pub mod recovery;
pub mod statistics;

// Re-export the main Analyzer implementation for ease of use.
pub use decline::DeclineDetector;
pub use engine::{Analyzer, AnalyzerImpl, QueryAnalysis};
pub use recovery::RecoveryCalculator;
pub use statistics::aggregate;
