//! Session token storage backed by SQLite.

use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::session::Credentials;

/// Storage errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The underlying database operation failed.
    #[error("session database error: {0}")]
    Db(#[from] sqlx::Error),
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    uid TEXT NOT NULL,
    fullname TEXT NOT NULL,
    email TEXT NOT NULL,
    admin INTEGER NOT NULL,
    member INTEGER NOT NULL,
    expires_at INTEGER NOT NULL
)";

/// Shared handle to the session database.
///
/// Cloning is cheap; all clones share one connection pool.
#[derive(Debug, Clone)]
pub struct StoragePool {
    pool: SqlitePool,
}

/// A per-session lease on the storage pool.
///
/// Held by authenticated sessions for the duration of one request and
/// released at the dispatch boundary.
#[derive(Debug, Clone)]
pub struct StorageHandle {
    pool: SqlitePool,
}

impl StorageHandle {
    /// The underlying pool, for endpoints that query directly.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl StoragePool {
    /// Open (or create) the session database and ensure the schema.
    ///
    /// `path` is a filesystem path unless it already carries a
    /// `sqlite:` scheme, which is passed through untouched so tests
    /// can use `sqlite::memory:`.
    ///
    /// # Errors
    /// Returns [`StorageError::Db`] if the database cannot be opened
    /// or the schema cannot be applied.
    pub async fn open(path: &str) -> Result<Self, StorageError> {
        let url = if path.starts_with("sqlite:") {
            path.to_owned()
        } else {
            format!("sqlite://{path}?mode=rwc")
        };
        // A pooled in-memory database is one database per connection;
        // a single connection keeps every handle on the same schema.
        let mut options = SqlitePoolOptions::new();
        if url.contains(":memory:") {
            options = options.max_connections(1);
        }
        let pool = options.connect(&url).await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// A lease for one session's lifetime.
    #[must_use]
    pub fn lease(&self) -> StorageHandle {
        StorageHandle { pool: self.pool.clone() }
    }

    /// Store a session token for the given credentials.
    ///
    /// Only the token's hash is persisted. Storing an existing token
    /// again replaces its row.
    ///
    /// # Errors
    /// Returns [`StorageError::Db`] on database failure.
    pub async fn store_token(
        &self,
        token: &str,
        credentials: &Credentials,
        expires_at: i64,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT OR REPLACE INTO sessions \
             (token_hash, uid, fullname, email, admin, member, expires_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(hash_token(token))
        .bind(&credentials.uid)
        .bind(&credentials.fullname)
        .bind(&credentials.email)
        .bind(i64::from(credentials.admin))
        .bind(i64::from(credentials.member))
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Resolve a token into credentials, if it is known and unexpired.
    ///
    /// # Errors
    /// Returns [`StorageError::Db`] on database failure.
    pub async fn lookup_token(&self, token: &str) -> Result<Option<Credentials>, StorageError> {
        let now = chrono::Utc::now().timestamp();
        let row = sqlx::query(
            "SELECT uid, fullname, email, admin, member FROM sessions \
             WHERE token_hash = ? AND expires_at > ?",
        )
        .bind(hash_token(token))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(Credentials {
            uid: row.try_get("uid")?,
            fullname: row.try_get("fullname")?,
            email: row.try_get("email")?,
            admin: row.try_get::<i64, _>("admin")? != 0,
            member: row.try_get::<i64, _>("member")? != 0,
        }))
    }

    /// Delete all expired sessions, returning how many were removed.
    ///
    /// # Errors
    /// Returns [`StorageError::Db`] on database failure.
    pub async fn purge_expired(&self) -> Result<u64, StorageError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// Hex-encoded SHA-256 digest of a session token.
fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
