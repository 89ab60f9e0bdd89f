// Storage module: in-memory series store, company names and the SQLite snapshot.

pub mod directory;
pub mod series;
pub mod sqlite;

pub use directory::CompanyDirectory;
pub use series::SeriesStore;
pub use sqlite::SqliteStorage;
