// SQLite connection setup and timestamp helpers shared by the stores.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;

/// Opens (creating if needed) the SQLite database at `database_path`.
///
/// Accepts a bare file path or a `sqlite:` URL. Parent directories are
/// created so a fresh checkout can run without setup.
pub async fn connect(database_path: &str) -> anyhow::Result<Pool<Sqlite>> {
    let conn_str = if database_path.starts_with("sqlite:") {
        database_path.to_string()
    } else {
        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        format!("sqlite://{}?mode=rwc", database_path)
    };

    let pool = SqlitePoolOptions::new().connect(&conn_str).await?;
    tracing::debug!("Connected to SQLite database at {}", database_path);
    Ok(pool)
}

/// Fixed-width RFC 3339 so `ORDER BY` on the text column is chronological.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc))
}
