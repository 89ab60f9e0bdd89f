use crate::model::{DeclineEvent, DeclineQuery, PriceRecord};
use crate::storage::{CompanyDirectory, SeriesStore};
use std::cmp::Ordering;

/// Finds days whose open fell at least `threshold` percent below the previous open.
pub struct DeclineDetector<'a> {
    store: &'a SeriesStore,
    directory: &'a CompanyDirectory,
}

impl<'a> DeclineDetector<'a> {
    pub fn new(store: &'a SeriesStore, directory: &'a CompanyDirectory) -> Self {
        Self { store, directory }
    }

    /// All qualifying events, most recent first and most severe first within a date.
    pub fn find_declines(&self, query: &DeclineQuery) -> Vec<DeclineEvent> {
        let needle = query.symbol_needle();
        let mut events: Vec<DeclineEvent> = self
            .store
            .all_symbols()
            .filter(|symbol| symbol_matches(symbol, needle.as_deref()))
            .flat_map(|symbol| self.declines_for_symbol(symbol, query))
            .collect();
        sort_events(&mut events);
        events
    }

    /// Qualifying events of one symbol, in ascending date order.
    /// The symbol filter is not applied here.
    pub fn declines_for_symbol(&self, symbol: &str, query: &DeclineQuery) -> Vec<DeclineEvent> {
        self.store
            .records_between(symbol, query.start_date, query.end_date)
            .iter()
            .filter_map(|record| {
                let pct = record.daily_change_pct()?;
                (pct <= query.threshold).then(|| self.to_event(record, pct))
            })
            .collect()
    }

    /// The most negative day-over-day change in the whole store, ignoring filters.
    /// Ties go to the lowest symbol, then the earliest date.
    pub fn worst_decline(&self) -> Option<DeclineEvent> {
        self.store
            .all_symbols()
            .flat_map(|symbol| self.store.records_for(symbol))
            .filter_map(|record| record.daily_change_pct().map(|pct| (record, pct)))
            .min_by(|(a, pa), (b, pb)| {
                pa.total_cmp(pb)
                    .then_with(|| a.symbol.cmp(&b.symbol))
                    .then_with(|| a.date.cmp(&b.date))
            })
            .map(|(record, pct)| self.to_event(record, pct))
    }

    fn to_event(&self, record: &PriceRecord, decline_pct: f64) -> DeclineEvent {
        DeclineEvent {
            symbol: record.symbol.clone(),
            date: record.date,
            open_price: record.open,
            prev_open: record.prev_open.unwrap_or_default(),
            close_price: record.close,
            volume: record.volume,
            decline_pct,
            company_name: self.directory.display_name(&record.symbol).to_string(),
        }
    }
}

/// Case-insensitive substring match; `needle` must already be lower-cased.
pub fn symbol_matches(symbol: &str, needle: Option<&str>) -> bool {
    needle.is_none_or(|n| symbol.to_lowercase().contains(n))
}

/// Date descending, then decline ascending, then symbol ascending.
pub fn compare_events(a: &DeclineEvent, b: &DeclineEvent) -> Ordering {
    b.date
        .cmp(&a.date)
        .then_with(|| a.decline_pct.total_cmp(&b.decline_pct))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

pub fn sort_events(events: &mut [DeclineEvent]) {
    events.sort_by(compare_events);
}
