use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use thiserror::Error;

use super::StatePort;

/// Errors surfaced while opening or using the state store. Lock contention
/// gets its own variant so the binary can print a targeted message.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Another instance of feedguard appears to be running. Please close it and try again.")]
    InstanceLocked,

    #[error("State store migration failed: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_contention(&err) {
            DatabaseError::InstanceLocked
        } else {
            DatabaseError::Other(err)
        }
    }
}

/// SQLite reports lock contention under several distinct messages depending on
/// where the lock was hit (connect, statement, or file open).
fn is_lock_contention(err: &impl std::fmt::Display) -> bool {
    const LOCK_MESSAGES: [&str; 5] = [
        "database is locked",
        "database table is locked",
        "sqlite_busy",
        "sqlite_locked",
        "unable to open database file",
    ];
    let message = err.to_string().to_lowercase();
    LOCK_MESSAGES.iter().any(|m| message.contains(m))
}

/// SQLite-backed key-value store holding the feed collection and its version
/// marker.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the state database and run schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InstanceLocked`] when another instance holds
    /// the SQLite lock, [`DatabaseError::Migration`] when the schema cannot be
    /// brought up to date.
    pub async fn open(path: &str) -> Result<Self, DatabaseError> {
        let in_memory = path == ":memory:";
        let url = if in_memory {
            "sqlite::memory:".to_owned()
        } else {
            format!("sqlite:{}?mode=rwc", path)
        };

        // The store holds the user's feed list; create the file with
        // user-only permissions so it never exists world-readable.
        #[cfg(unix)]
        if !in_memory {
            let db_path = std::path::Path::new(path);
            if !db_path.exists() {
                if let Some(parent) = db_path.parent() {
                    if parent.exists() {
                        use std::os::unix::fs::OpenOptionsExt;
                        let _file = std::fs::OpenOptions::new()
                            .write(true)
                            .create_new(true)
                            .mode(0o600)
                            .open(db_path)
                            .ok(); // On failure SQLite reports the error at connect.
                    }
                }
            }
        }

        // busy_timeout lets SQLite wait out transient lock contention instead
        // of failing with SQLITE_BUSY immediately.
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(DatabaseError::from_sqlx)?
            .pragma("busy_timeout", "5000");
        // An in-memory database is private to its connection, so the pool
        // must stay at a single connection to see one coherent store.
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(DatabaseError::from_sqlx)?;

        let db = Self { pool };
        db.migrate().await.map_err(|e| {
            if is_lock_contention(&e) {
                DatabaseError::InstanceLocked
            } else {
                DatabaseError::Migration(e.to_string())
            }
        })?;
        Ok(db)
    }

    /// Run schema migrations atomically within a transaction.
    ///
    /// The schema is a single key-value table; `IF NOT EXISTS` keeps the
    /// migration idempotent, so re-running on an existing database is a no-op.
    async fn migrate(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

impl StatePort for Database {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM app_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO app_state (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM app_state WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let db = test_db().await;
        assert_eq!(db.get("feeds.list").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let db = test_db().await;
        db.set("feeds.version", "2.0.0").await.unwrap();
        assert_eq!(
            db.get("feeds.version").await.unwrap(),
            Some("2.0.0".to_string())
        );
    }

    #[tokio::test]
    async fn test_set_upserts() {
        let db = test_db().await;
        db.set("feeds.version", "1.0.0").await.unwrap();
        db.set("feeds.version", "2.0.0").await.unwrap();
        assert_eq!(
            db.get("feeds.version").await.unwrap(),
            Some("2.0.0".to_string())
        );
    }

    #[tokio::test]
    async fn test_remove_deletes_key() {
        let db = test_db().await;
        db.set("feeds.list", "[]").await.unwrap();
        db.remove("feeds.list").await.unwrap();
        assert_eq!(db.get("feeds.list").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_noop() {
        let db = test_db().await;
        db.remove("never.stored").await.unwrap();
    }

    #[test]
    fn test_lock_contention_detection() {
        assert!(is_lock_contention(&"error returned from database: database is locked"));
        assert!(is_lock_contention(&"SQLITE_BUSY: another connection holds the lock"));
        assert!(is_lock_contention(&"unable to open database file"));
        assert!(!is_lock_contention(&"no such table: app_state"));
        assert!(!is_lock_contention(&"UNIQUE constraint failed: app_state.key"));
    }

    #[tokio::test]
    async fn test_migrate_idempotent() {
        let db = test_db().await;
        db.migrate().await.unwrap();
        db.set("k", "v").await.unwrap();
        db.migrate().await.unwrap();
        assert_eq!(db.get("k").await.unwrap(), Some("v".to_string()));
    }
}
