pub mod sqlite_filter_log_store;

pub use sqlite_filter_log_store::SqliteFilterLogStore;
