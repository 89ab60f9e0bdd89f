use crate::model::{PriceRecord, StoreError};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Immutable, symbol-indexed daily price history.
///
/// Each symbol's records are kept in ascending date order with `prev_open`
/// derived from the preceding record of the same symbol only.
#[derive(Debug, Default)]
pub struct SeriesStore {
    series: BTreeMap<String, Vec<PriceRecord>>,
    total_records: usize,
}

impl SeriesStore {
    /// Builds the store from an unordered collection of records.
    ///
    /// Fails on records that break the input contract: an empty symbol, a
    /// non-positive or non-finite open, or two records for one symbol on the same date.
    pub fn build(records: impl IntoIterator<Item = PriceRecord>) -> Result<Self, StoreError> {
        let mut series: BTreeMap<String, Vec<PriceRecord>> = BTreeMap::new();
        for record in records {
            if record.symbol.is_empty() {
                return Err(StoreError::EmptySymbol(record.date));
            }
            if !record.open.is_finite() || record.open <= 0.0 {
                return Err(StoreError::InvalidOpen {
                    symbol: record.symbol,
                    date: record.date,
                    open: record.open,
                });
            }
            series.entry(record.symbol.clone()).or_default().push(record);
        }

        let mut total_records = 0;
        for (symbol, records) in series.iter_mut() {
            records.sort_by_key(|r| r.date);
            if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
                return Err(StoreError::DuplicateDate {
                    symbol: symbol.clone(),
                    date: pair[0].date,
                });
            }

            let mut prev_open = None;
            for record in records.iter_mut() {
                record.prev_open = prev_open;
                prev_open = Some(record.open);
            }
            total_records += records.len();
        }

        debug!(
            "Series store built: {} symbols, {} records",
            series.len(),
            total_records
        );
        Ok(Self {
            series,
            total_records,
        })
    }

    /// Records of `symbol` in ascending date order; empty when the symbol is unknown.
    pub fn records_for(&self, symbol: &str) -> &[PriceRecord] {
        self.series.get(symbol).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct symbols in ascending order.
    pub fn all_symbols(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn symbol_count(&self) -> usize {
        self.series.len()
    }

    pub fn total_records(&self) -> usize {
        self.total_records
    }

    pub fn is_empty(&self) -> bool {
        self.total_records == 0
    }

    /// Earliest and latest date across every symbol.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.series.values().filter_map(|r| r.first()).map(|r| r.date).min()?;
        let last = self.series.values().filter_map(|r| r.last()).map(|r| r.date).max()?;
        Some((first, last))
    }

    /// Records of `symbol` strictly after `date`.
    pub fn records_after(&self, symbol: &str, date: NaiveDate) -> &[PriceRecord] {
        let records = self.records_for(symbol);
        let start = records.partition_point(|r| r.date <= date);
        &records[start..]
    }

    /// Records of `symbol` within the inclusive bounds.
    pub fn records_between(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> &[PriceRecord] {
        let records = self.records_for(symbol);
        let from = start.map_or(0, |s| records.partition_point(|r| r.date < s));
        let to = end.map_or(records.len(), |e| records.partition_point(|r| r.date <= e));
        if from >= to {
            return &[];
        }
        &records[from..to]
    }
}
