// CSV parsing for the daily stock export and the company list
use crate::model::{ParserError, RawPriceRow};
use crate::storage::CompanyDirectory;
use crate::utils::parse_date;
use csv::{ReaderBuilder, StringRecord};

pub trait Parser {
    type Output;

    fn parse(&self, text: &str) -> Result<Self::Output, ParserError>;
}

/// Parses `Date,Symbol,Adj Close,Close,High,Low,Open,Volume` rows. Column order is free.
pub struct StockCsvParser;

/// Parses `Symbol,Shortname,...` rows into a company directory.
pub struct CompanyCsvParser;

impl StockCsvParser {
    pub fn new() -> Self {
        Self
    }
}

impl CompanyCsvParser {
    pub fn new() -> Self {
        Self
    }
}

struct Columns {
    date: usize,
    symbol: usize,
    open: usize,
    close: usize,
    high: usize,
    low: usize,
    volume: usize,
}

fn column(headers: &StringRecord, name: &str) -> Result<usize, ParserError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| ParserError::MissingColumn(name.to_string()))
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

fn optional_number(
    record: &StringRecord,
    idx: usize,
    name: &str,
) -> Result<Option<f64>, ParserError> {
    let value = record.get(idx).unwrap_or("").trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(|n| n.is_finite().then_some(n))
        .map_err(|_| ParserError::InvalidNumber {
            line: line_of(record),
            column: name.to_string(),
            value: value.to_string(),
        })
}

impl Parser for StockCsvParser {
    type Output = Vec<RawPriceRow>;

    fn parse(&self, text: &str) -> Result<Vec<RawPriceRow>, ParserError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let cols = Columns {
            date: column(&headers, "Date")?,
            symbol: column(&headers, "Symbol")?,
            open: column(&headers, "Open")?,
            close: column(&headers, "Close")?,
            high: column(&headers, "High")?,
            low: column(&headers, "Low")?,
            volume: column(&headers, "Volume")?,
        };

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let raw_date = record.get(cols.date).unwrap_or("");
            let date = parse_date(raw_date).ok_or_else(|| ParserError::InvalidDate {
                line: line_of(&record),
                value: raw_date.to_string(),
            })?;

            rows.push(RawPriceRow {
                symbol: record.get(cols.symbol).unwrap_or("").to_string(),
                date,
                open: optional_number(&record, cols.open, "Open")?,
                close: optional_number(&record, cols.close, "Close")?,
                high: optional_number(&record, cols.high, "High")?,
                low: optional_number(&record, cols.low, "Low")?,
                volume: optional_number(&record, cols.volume, "Volume")?,
            });
        }

        Ok(rows)
    }
}

impl Parser for CompanyCsvParser {
    type Output = CompanyDirectory;

    fn parse(&self, text: &str) -> Result<CompanyDirectory, ParserError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let symbol_col = column(&headers, "Symbol")?;
        let name_col = column(&headers, "Shortname")?;

        let mut directory = CompanyDirectory::new();
        for result in reader.records() {
            let record = result?;
            let symbol = record.get(symbol_col).unwrap_or("").trim();
            let name = record.get(name_col).unwrap_or("").trim();
            if !symbol.is_empty() {
                directory.insert(symbol, name);
            }
        }

        Ok(directory)
    }
}
