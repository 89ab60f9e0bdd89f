// Price sources: where a snapshot of raw rows and company names comes from.
use crate::model::{RawPriceRow, SourceError};
use crate::parser::{CompanyCsvParser, Parser, StockCsvParser};
use crate::storage::{CompanyDirectory, SqliteStorage};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    async fn load_prices(&self) -> Result<Vec<RawPriceRow>, SourceError>;
    async fn load_companies(&self) -> Result<CompanyDirectory, SourceError>;
}

/// Reads the stock and company CSV exports from disk.
pub struct CsvSource {
    pub stocks_path: PathBuf,
    pub companies_path: Option<PathBuf>,
}

impl CsvSource {
    pub fn new(stocks_path: impl Into<PathBuf>, companies_path: Option<PathBuf>) -> Self {
        Self {
            stocks_path: stocks_path.into(),
            companies_path,
        }
    }
}

#[async_trait::async_trait]
impl PriceSource for CsvSource {
    async fn load_prices(&self) -> Result<Vec<RawPriceRow>, SourceError> {
        info!("Reading prices from {}", self.stocks_path.display());
        let text = tokio::fs::read_to_string(&self.stocks_path).await?;
        let rows = tokio::task::spawn_blocking(move || StockCsvParser::new().parse(&text))
            .await
            .map_err(|e| SourceError::Io(std::io::Error::other(e)))??;
        info!("Parsed {} price rows", rows.len());
        Ok(rows)
    }

    async fn load_companies(&self) -> Result<CompanyDirectory, SourceError> {
        let Some(path) = &self.companies_path else {
            return Ok(CompanyDirectory::new());
        };
        let text = tokio::fs::read_to_string(path).await?;
        Ok(CompanyCsvParser::new().parse(&text)?)
    }
}

/// Loads the snapshot persisted in SQLite.
pub struct SqliteSource {
    storage: Arc<Mutex<SqliteStorage>>,
}

impl SqliteSource {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self { storage }
    }
}

#[async_trait::async_trait]
impl PriceSource for SqliteSource {
    async fn load_prices(&self) -> Result<Vec<RawPriceRow>, SourceError> {
        Ok(self.storage.lock().await.load_prices()?)
    }

    async fn load_companies(&self) -> Result<CompanyDirectory, SourceError> {
        Ok(self.storage.lock().await.load_companies()?)
    }
}

/// Copies everything `from` provides into `storage`, replacing the previous snapshot.
pub async fn import_into(
    from: &dyn PriceSource,
    storage: &Mutex<SqliteStorage>,
) -> Result<usize, SourceError> {
    let rows = from.load_prices().await?;
    let companies = from.load_companies().await?;

    let mut guard = storage.lock().await;
    let stored = guard.replace_prices(&rows)?;
    guard.replace_companies(&companies)?;
    info!("Imported {} price rows and {} company names", stored, companies.len());
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn imports_csv_into_sqlite_and_reads_back() {
        let dir = std::env::temp_dir().join(format!("dip-scout-source-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let stocks = dir.join("stocks.csv");
        let companies = dir.join("companies.csv");
        tokio::fs::write(
            &stocks,
            "Date,Symbol,Adj Close,Close,High,Low,Open,Volume\n\
             2024-01-01,ABC,1,100,101,99,100,10\n\
             2024-01-02,ABC,1,80,81,79,80,10\n",
        )
        .await
        .unwrap();
        tokio::fs::write(&companies, "Symbol,Shortname\nABC,Abc Corp\n").await.unwrap();

        let storage = Arc::new(Mutex::new(SqliteStorage::open_in_memory().unwrap()));
        let csv = CsvSource::new(&stocks, Some(companies.clone()));
        assert_eq!(import_into(&csv, &storage).await.unwrap(), 2);

        let sqlite = SqliteSource::new(storage.clone());
        let rows = sqlite.load_prices().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].open, Some(80.0));
        assert_eq!(sqlite.load_companies().await.unwrap().display_name("ABC"), "Abc Corp");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let csv = CsvSource::new("/nonexistent/dip-scout/stocks.csv", None);
        assert!(matches!(csv.load_prices().await, Err(SourceError::Io(_))));
        assert!(csv.load_companies().await.unwrap().is_empty());
    }
}
