use crate::model::{PriceRecord, RawPriceRow};
use tracing::debug;

/// Turns raw rows into well-formed records. Rows without an open or close price are dropped.
pub fn normalize_all(rows: Vec<RawPriceRow>) -> Vec<PriceRecord> {
    let total = rows.len();
    let records: Vec<PriceRecord> = rows.into_iter().filter_map(normalize_row).collect();
    debug!("Normalized {} of {} rows", records.len(), total);
    records
}

fn normalize_row(row: RawPriceRow) -> Option<PriceRecord> {
    let symbol = row.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return None;
    }
    let open = row.open.filter(|o| *o > 0.0)?;
    let close = row.close?;

    Some(PriceRecord {
        symbol,
        date: row.date,
        open,
        close,
        high: row.high.unwrap_or_else(|| open.max(close)),
        low: row.low.unwrap_or_else(|| open.min(close)),
        volume: row.volume.filter(|v| *v > 0.0).map_or(0, |v| v.round() as u64),
        prev_open: None,
    })
}
