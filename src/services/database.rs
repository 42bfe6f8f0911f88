use crate::error::{AppError, Result};
use crate::models::PriceRow;
use crate::services::price_store::{PriceStore, WishlistStore};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// SQLite storage for daily prices and wishlists
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    database_path: PathBuf,
}

/// Database schema version for migrations
const DB_SCHEMA_VERSION: &str = "1";

impl SqliteStore {
    /// Open (or create) the database and make sure the schema exists
    pub async fn new(database_path: PathBuf) -> Result<Self> {
        info!("Initializing SQLite database at: {:?}", database_path);

        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let connect_options = SqliteConnectOptions::new()
            .filename(&database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal) // concurrent readers during writes
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePool::connect_with(connect_options).await?;

        let store = Self { pool, database_path };
        store.initialize_database().await?;

        info!("SQLite database initialized successfully");
        Ok(store)
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Initialize database schema
    async fn initialize_database(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stock_prices (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                date TEXT NOT NULL,
                avg_price REAL NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS wishlists (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                stock_symbol TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let indexes = vec![
            // One row per symbol and day; concurrent reconciliations rely on it
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_stock_prices_unique ON stock_prices(symbol, date)",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_wishlists_unique ON wishlists(user_id, stock_symbol)",
        ];

        for index in indexes {
            sqlx::query(index).execute(&self.pool).await?;
        }

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)")
            .bind(DB_SCHEMA_VERSION)
            .execute(&self.pool)
            .await?;

        debug!("Database schema initialized");
        Ok(())
    }

    /// Per-symbol row counts and date ranges
    pub async fn symbol_summaries(&self) -> Result<Vec<SymbolSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT symbol, COUNT(*) AS row_count, MIN(date) AS first_date, MAX(date) AS last_date
            FROM stock_prices
            GROUP BY symbol
            ORDER BY symbol
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<SymbolSummary> {
                Ok(SymbolSummary {
                    symbol: row.try_get("symbol")?,
                    row_count: row.try_get("row_count")?,
                    first_date: row.try_get("first_date")?,
                    last_date: row.try_get("last_date")?,
                })
            })
            .collect()
    }

    /// Get database statistics
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let total_records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_prices")
            .fetch_one(&self.pool)
            .await?;

        let unique_symbols: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT symbol) FROM stock_prices")
            .fetch_one(&self.pool)
            .await?;

        let wishlist_entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM wishlists")
            .fetch_one(&self.pool)
            .await?;

        let row = sqlx::query("SELECT MIN(date) AS first_date, MAX(date) AS last_date FROM stock_prices")
            .fetch_one(&self.pool)
            .await?;
        let first: Option<String> = row.try_get("first_date")?;
        let last: Option<String> = row.try_get("last_date")?;
        let date_range = match (first, last) {
            (Some(first), Some(last)) => Some((first, last)),
            _ => None,
        };

        Ok(DatabaseStats {
            total_records,
            unique_symbols,
            wishlist_entries,
            date_range,
        })
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
        info!("SQLite database connection pool closed");
    }
}

fn row_to_price_row(row: sqlx::sqlite::SqliteRow) -> Result<PriceRow> {
    Ok(PriceRow {
        symbol: row.try_get("symbol")?,
        date: row.try_get("date")?,
        avg_price: row.try_get("avg_price")?,
    })
}

#[async_trait]
impl PriceStore for SqliteStore {
    async fn query(&self, symbol: &str, since: Option<NaiveDate>) -> Result<Vec<PriceRow>> {
        let rows = match since {
            Some(since) => {
                sqlx::query("SELECT symbol, date, avg_price FROM stock_prices WHERE symbol = ?1 AND date >= ?2")
                    .bind(symbol)
                    .bind(since)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT symbol, date, avg_price FROM stock_prices WHERE symbol = ?1")
                    .bind(symbol)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(row_to_price_row).collect()
    }

    async fn insert(&self, rows: &[PriceRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut transaction = self.pool.begin().await?;
        let mut affected_rows = 0;

        for row in rows {
            if !row.avg_price.is_finite() {
                return Err(AppError::InvalidInput(format!(
                    "Refusing to store non-finite price for {} on {}",
                    row.symbol, row.date
                )));
            }

            let result = sqlx::query("INSERT OR IGNORE INTO stock_prices (symbol, date, avg_price) VALUES (?1, ?2, ?3)")
                .bind(&row.symbol)
                .bind(row.date)
                .bind(row.avg_price)
                .execute(&mut *transaction)
                .await?;

            affected_rows += result.rows_affected() as usize;
        }

        transaction.commit().await?;
        debug!(requested = rows.len(), inserted = affected_rows, "Inserted price rows");
        Ok(affected_rows)
    }
}

#[async_trait]
impl WishlistStore for SqliteStore {
    async fn symbols_for_user(&self, user_id: &str) -> Result<Vec<String>> {
        let symbols = sqlx::query_scalar("SELECT stock_symbol FROM wishlists WHERE user_id = ?1 ORDER BY id")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(symbols)
    }

    async fn add_symbol(&self, user_id: &str, symbol: &str) -> Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO wishlists (user_id, stock_symbol) VALUES (?1, ?2)")
            .bind(user_id)
            .bind(symbol)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_symbol(&self, user_id: &str, symbol: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wishlists WHERE user_id = ?1 AND stock_symbol = ?2")
            .bind(user_id)
            .bind(symbol)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Database statistics
#[derive(Debug)]
pub struct DatabaseStats {
    pub total_records: i64,
    pub unique_symbols: i64,
    pub wishlist_entries: i64,
    pub date_range: Option<(String, String)>,
}

/// Stored history for one symbol
#[derive(Debug)]
pub struct SymbolSummary {
    pub symbol: String,
    pub row_count: i64,
    pub first_date: String,
    pub last_date: String,
}
