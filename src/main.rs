use dip_scout::analyzer::AnalyzerImpl;
use dip_scout::config::{load_config, AppConfig, QueryConfig};
use dip_scout::model::{AnalysisError, SourceError, StoreError};
use dip_scout::normalizer::normalize_all;
use dip_scout::report::{build_report, write_report, QueryReport};
use dip_scout::source::{import_into, CsvSource, PriceSource, SqliteSource};
use dip_scout::storage::{CompanyDirectory, SeriesStore, SqliteStorage};
use futures::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let storage = match SqliteStorage::new(&config.database_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            return;
        }
    };

    if let Some(import) = &config.import {
        let companies = import.companies_csv.as_ref().map(PathBuf::from);
        let csv = CsvSource::new(&import.stocks_csv, companies);
        if let Err(e) = import_into(&csv, &storage).await {
            error!("Import failed: {}", e);
            return;
        }
    }

    info!("Loading snapshot from {}...", config.database_path);
    let analyzer = match load_snapshot(&SqliteSource::new(storage.clone())).await {
        Ok((store, directory)) => {
            info!(
                "Snapshot ready: {} symbols, {} records, {} company names",
                store.symbol_count(),
                store.total_records(),
                directory.len()
            );
            AnalyzerImpl::new(Arc::new(store), Arc::new(directory)).with_workers(config.workers)
        }
        Err(e) => {
            error!("Failed to load snapshot: {}", e);
            return;
        }
    };

    info!("Queries to run: {}", config.queries.len());
    let tasks: Vec<_> = config
        .queries
        .iter()
        .map(|query_cfg| run_query(query_cfg, &analyzer, &config))
        .collect();
    let reports: Vec<QueryReport> = join_all(tasks).await.into_iter().flatten().collect();

    let report = build_report(&analyzer, &config.histories, reports);
    info!(
        "{} declines at the default threshold across {} stocks",
        report.overview.decline_count,
        report.stocks.len()
    );
    if let Some(worst) = &report.overview.worst_decline {
        info!(
            "Worst decline: {} ({}) {:.2}% on {}",
            worst.symbol, worst.company_name, worst.decline_pct, worst.date
        );
    }

    if let Err(e) = write_report(&config.report_path, &report) {
        error!("Failed to write report: {}", e);
        return;
    }
    info!("Report written to {}", config.report_path);
}

#[derive(Debug, thiserror::Error)]
enum SnapshotError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("malformed price data: {0}")]
    Store(#[from] StoreError),
}

/// Loads raw rows and company names from `source` and builds the immutable series store.
async fn load_snapshot(
    source: &dyn PriceSource,
) -> Result<(SeriesStore, CompanyDirectory), SnapshotError> {
    let rows = source.load_prices().await?;
    let directory = source.load_companies().await?;
    let store = SeriesStore::build(normalize_all(rows))?;
    Ok((store, directory))
}

/// Runs one configured query, logging a summary of its statistics.
async fn run_query(
    query_cfg: &QueryConfig,
    analyzer: &AnalyzerImpl,
    config: &AppConfig,
) -> Option<QueryReport> {
    info!("Processing query: {}", query_cfg.name);
    let deadline = config.deadline().map(|d| Instant::now() + d);

    let analysis = match analyzer.analyze(&query_cfg.query, deadline).await {
        Ok(analysis) => analysis,
        Err(AnalysisError::DeadlineExceeded { completed, total }) => {
            warn!(
                "Query {} hit its deadline after {}/{} symbols",
                query_cfg.name, completed, total
            );
            return None;
        }
        Err(e) => {
            warn!("Query {} failed: {}", query_cfg.name, e);
            return None;
        }
    };

    let stats = &analysis.statistics;
    info!("Query {}: {} declines analyzed", query_cfg.name, stats.total_count);
    for (target, target_stats) in &stats.per_target {
        info!(
            "  +{}%: recovered {}/{} ({:.1}%), avg {:?} days, median {:?} days",
            target,
            target_stats.resolved_count,
            target_stats.total_count,
            target_stats.recovery_rate_pct,
            target_stats.average_days,
            target_stats.median_days
        );
    }

    info!("Finished query: {}", query_cfg.name);
    Some(QueryReport {
        name: query_cfg.name.clone(),
        analysis,
    })
}
