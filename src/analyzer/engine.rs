use crate::analyzer::decline::{symbol_matches, sort_events, DeclineDetector};
use crate::analyzer::recovery::{recovery_for, RecoveryCalculator};
use crate::analyzer::statistics::aggregate;
use crate::model::{
    AnalysisError, DatasetOverview, DeclineEvent, DeclineQuery, PriceRecord, RecoveryResult,
    RecoveryStatistics, StockListing,
};
use crate::storage::{CompanyDirectory, SeriesStore};
use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Trait defining the query interface over a price snapshot.
pub trait Analyzer {
    fn find_declines(&self, query: &DeclineQuery) -> Vec<DeclineEvent>;
    fn compute_recovery(&self, events: Vec<DeclineEvent>) -> Vec<RecoveryResult>;
    fn aggregate(&self, results: &[RecoveryResult]) -> RecoveryStatistics;

    /// Declines followed by their recovery times.
    fn recovery_for_query(&self, query: &DeclineQuery) -> Vec<RecoveryResult> {
        self.compute_recovery(self.find_declines(query))
    }

    fn statistics_for_query(&self, query: &DeclineQuery) -> RecoveryStatistics {
        self.aggregate(&self.recovery_for_query(query))
    }
}

/// Query engine over an immutable series store.
#[derive(Clone)]
pub struct AnalyzerImpl {
    store: Arc<SeriesStore>,
    directory: Arc<CompanyDirectory>,
    workers: usize,
}

/// Everything a single query produces.
#[derive(Debug, Clone, Serialize)]
pub struct QueryAnalysis {
    pub query: DeclineQuery,
    pub results: Vec<RecoveryResult>,
    pub statistics: RecoveryStatistics,
}

impl AnalyzerImpl {
    pub fn new(store: Arc<SeriesStore>, directory: Arc<CompanyDirectory>) -> Self {
        Self {
            store,
            directory,
            workers: 1,
        }
    }

    /// Number of symbol shards used by the async queries.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn overview(&self, query: &DeclineQuery) -> DatasetOverview {
        let detector = DeclineDetector::new(&self.store, &self.directory);
        DatasetOverview {
            total_records: self.store.total_records(),
            unique_symbols: self.store.symbol_count(),
            date_range: self.store.date_range(),
            decline_count: detector.find_declines(query).len(),
            worst_decline: detector.worst_decline(),
        }
    }

    /// Ascending history of one symbol within inclusive bounds.
    /// The symbol is matched exactly after upper-casing.
    pub fn history(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> &[PriceRecord] {
        let symbol = symbol.trim().to_uppercase();
        self.store.records_between(&symbol, start, end)
    }

    pub fn list_stocks(&self) -> Vec<StockListing> {
        self.store
            .all_symbols()
            .map(|symbol| StockListing {
                symbol: symbol.to_string(),
                name: self.directory.display_name(symbol).to_string(),
            })
            .collect()
    }

    /// Decline detection sharded by symbol across blocking workers.
    pub async fn find_declines_sharded(
        &self,
        query: &DeclineQuery,
        deadline: Option<Instant>,
    ) -> Result<Vec<DeclineEvent>, AnalysisError> {
        let needle = query.symbol_needle();
        let symbols: Vec<String> = self
            .store
            .all_symbols()
            .filter(|symbol| symbol_matches(symbol, needle.as_deref()))
            .map(str::to_string)
            .collect();

        let store = Arc::clone(&self.store);
        let directory = Arc::clone(&self.directory);
        let query = query.clone();
        let mut events = self
            .run_sharded(symbols, deadline, move |symbol: String| {
                DeclineDetector::new(&store, &directory).declines_for_symbol(&symbol, &query)
            })
            .await?;

        // Shards finish in any order; the global ordering is applied after the merge.
        sort_events(&mut events);
        Ok(events)
    }

    /// Recovery computation sharded by symbol. Output keeps the input order.
    pub async fn compute_recovery_sharded(
        &self,
        events: Vec<DeclineEvent>,
        deadline: Option<Instant>,
    ) -> Result<Vec<RecoveryResult>, AnalysisError> {
        let mut by_symbol: BTreeMap<String, Vec<(usize, DeclineEvent)>> = BTreeMap::new();
        for (idx, event) in events.into_iter().enumerate() {
            by_symbol.entry(event.symbol.clone()).or_default().push((idx, event));
        }

        let units: Vec<(String, Vec<(usize, DeclineEvent)>)> = by_symbol.into_iter().collect();
        let store = Arc::clone(&self.store);
        let mut indexed = self
            .run_sharded(
                units,
                deadline,
                move |(symbol, events): (String, Vec<(usize, DeclineEvent)>)| {
                    let history = store.records_for(&symbol);
                    events
                        .into_iter()
                        .map(|(idx, event)| {
                            let start = history.partition_point(|r| r.date <= event.date);
                            (idx, recovery_for(event, &history[start..]))
                        })
                        .collect()
                },
            )
            .await?;

        indexed.sort_by_key(|(idx, _)| *idx);
        Ok(indexed.into_iter().map(|(_, result)| result).collect())
    }

    /// Runs the full pipeline for one query: declines, recovery times and statistics.
    pub async fn analyze(
        &self,
        query: &DeclineQuery,
        deadline: Option<Instant>,
    ) -> Result<QueryAnalysis, AnalysisError> {
        info!(
            "Analyzing declines <= {}% (symbol: {:?}, {:?}..{:?})",
            query.threshold, query.symbol, query.start_date, query.end_date
        );
        let events = self.find_declines_sharded(query, deadline).await?;
        info!("Found {} declines", events.len());

        let results = self.compute_recovery_sharded(events, deadline).await?;
        let statistics = aggregate(&results);
        info!(
            "Recovery computed for {} declines across {} targets",
            statistics.total_count,
            statistics.per_target.len()
        );

        Ok(QueryAnalysis {
            query: query.clone(),
            results,
            statistics,
        })
    }

    async fn run_sharded<U, T, F>(
        &self,
        units: Vec<U>,
        deadline: Option<Instant>,
        work: F,
    ) -> Result<Vec<T>, AnalysisError>
    where
        U: Send + 'static,
        T: Send + 'static,
        F: Fn(U) -> Vec<T> + Send + Sync + 'static,
    {
        let total = units.len();
        let completed = Arc::new(AtomicUsize::new(0));
        let work = Arc::new(work);
        let shards = split_into_shards(units, self.workers);
        debug!("Running {} units in {} shards", total, shards.len());

        let handles = shards.into_iter().map(move |shard| {
            let work = Arc::clone(&work);
            let completed = Arc::clone(&completed);
            tokio::task::spawn_blocking(move || {
                let mut out = Vec::new();
                for unit in shard {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Err(AnalysisError::DeadlineExceeded {
                            completed: completed.load(Ordering::Relaxed),
                            total,
                        });
                    }
                    out.extend(work(unit));
                    completed.fetch_add(1, Ordering::Relaxed);
                }
                Ok(out)
            })
        });

        let mut merged = Vec::new();
        for joined in join_all(handles).await {
            let shard = joined.map_err(|e| {
                warn!("Shard worker failed: {}", e);
                AnalysisError::Worker(e.to_string())
            })??;
            merged.extend(shard);
        }
        Ok(merged)
    }
}

impl Analyzer for AnalyzerImpl {
    fn find_declines(&self, query: &DeclineQuery) -> Vec<DeclineEvent> {
        let events = DeclineDetector::new(&self.store, &self.directory).find_declines(query);
        debug!("find_declines({}) -> {} events", query.threshold, events.len());
        events
    }

    fn compute_recovery(&self, events: Vec<DeclineEvent>) -> Vec<RecoveryResult> {
        RecoveryCalculator::new(&self.store).compute_recovery(events)
    }

    fn aggregate(&self, results: &[RecoveryResult]) -> RecoveryStatistics {
        aggregate(results)
    }
}

fn split_into_shards<U>(units: Vec<U>, workers: usize) -> Vec<Vec<U>> {
    let per_shard = units.len().div_ceil(workers.max(1)).max(1);
    let mut shards = Vec::new();
    let mut iter = units.into_iter();
    loop {
        let shard: Vec<U> = iter.by_ref().take(per_shard).collect();
        if shard.is_empty() {
            break;
        }
        shards.push(shard);
    }
    shards
}
