use crate::model::{RawPriceRow, StorageError};
use crate::storage::CompanyDirectory;
use rusqlite::{params, Connection, Row};

/// Persisted snapshot of raw daily prices and company names.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens the database at `db_path` and creates the schema if needed.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open(db_path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS prices (
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                open REAL,
                close REAL,
                high REAL,
                low REAL,
                volume REAL,
                PRIMARY KEY (symbol, date)
            );

            CREATE TABLE IF NOT EXISTS companies (
                symbol TEXT PRIMARY KEY,
                shortname TEXT NOT NULL
            );
            "
        )?;

        Ok(Self { conn })
    }

    /// Replaces the whole price table with `rows` in a single transaction.
    /// Later rows win when a (symbol, date) pair repeats.
    pub fn replace_prices(&mut self, rows: &[RawPriceRow]) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM prices", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO prices (symbol, date, open, close, high, low, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for row in rows {
                stmt.execute(params![
                    &row.symbol,
                    &row.date,
                    &row.open,
                    &row.close,
                    &row.high,
                    &row.low,
                    &row.volume,
                ])?;
            }
        }
        tx.commit()?;
        self.count_prices()
    }

    /// Replaces the company table with the entries of `directory`.
    pub fn replace_companies(&mut self, directory: &CompanyDirectory) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM companies", [])?;
        {
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO companies (symbol, shortname) VALUES (?1, ?2)")?;
            for (symbol, name) in directory.iter() {
                stmt.execute(params![symbol, name])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn count_prices(&self) -> Result<usize, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM prices", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Loads every stored price row, ordered by symbol then date.
    pub fn load_prices(&self) -> Result<Vec<RawPriceRow>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT symbol, date, open, close, high, low, volume
             FROM prices ORDER BY symbol ASC, date ASC",
        )?;

        let rows = stmt.query_map([], Self::map_price)?;
        let mut prices = Vec::new();
        for row in rows {
            prices.push(row?);
        }

        Ok(prices)
    }

    pub fn load_companies(&self) -> Result<CompanyDirectory, StorageError> {
        let mut stmt = self.conn.prepare("SELECT symbol, shortname FROM companies")?;
        let rows = stmt.query_map([], |row| {
            let symbol: String = row.get(0)?;
            let name: String = row.get(1)?;
            Ok((symbol, name))
        })?;

        let mut directory = CompanyDirectory::new();
        for row in rows {
            let (symbol, name) = row?;
            directory.insert(symbol, name);
        }

        Ok(directory)
    }

    fn map_price(row: &Row) -> Result<RawPriceRow, rusqlite::Error> {
        Ok(RawPriceRow {
            symbol: row.get(0)?,
            date: row.get(1)?,
            open: row.get(2)?,
            close: row.get(3)?,
            high: row.get(4)?,
            low: row.get(5)?,
            volume: row.get(6)?,
        })
    }
}
