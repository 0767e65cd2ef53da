use async_trait::async_trait;
use jiff::Timestamp;
use linkway_core::repository::{Link, ReadRepository, Repository, Result};
use linkway_core::{ShortCode, StorageError};
use sqlx::{PgPool, Row};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

const INSERT_TIMEOUT: Duration = Duration::from_secs(1);
const SELECT_TIMEOUT: Duration = Duration::from_millis(200);
const SCAN_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres implementation of the repository contract.
///
/// Links live in a single `links` table keyed by `short_code`. The primary
/// key is what enforces code uniqueness: a duplicate insert fails with a
/// unique violation, reported as [`StorageError::Conflict`].
#[derive(Debug, Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a repository from an existing connection pool.
    ///
    /// The schema is expected to exist; see [`PostgresRepository::migrate`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool and brings the schema up to date.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        info!("connected to postgres link store");

        let repository = Self::new(pool);
        repository.migrate().await?;
        Ok(repository)
    }

    /// Runs the embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Query(format!("migration failed: {e}")))
    }

    /// Highest stored code of the form `prefix` + decimal digits, comparing
    /// the digits numerically. Used to resume a sequential generator.
    pub async fn last_in_sequence(&self, prefix: &str) -> Result<Option<ShortCode>> {
        let row = with_timeout(
            SCAN_TIMEOUT,
            "scan sequence",
            sqlx::query(
                r#"
                SELECT short_code
                FROM links
                WHERE short_code ~ $1
                ORDER BY length(short_code) DESC, short_code DESC
                LIMIT 1
                "#,
            )
            .bind(sequence_pattern(prefix))
            .fetch_optional(&self.pool),
        )
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("short_code").map_err(map_sqlx_error)?;
        ShortCode::new(raw)
            .map(Some)
            .map_err(|e| StorageError::InvalidData(e.to_string()))
    }
}

/// Anchored regex matching `prefix` followed by six or more digits.
fn sequence_pattern(prefix: &str) -> String {
    let mut pattern = String::from("^");
    for c in prefix.chars() {
        if !c.is_ascii_alphanumeric() && c != '_' {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push_str("[0-9]{6,}$");
    pattern
}

async fn with_timeout<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(map_sqlx_error),
        Err(_) => Err(StorageError::Timeout(format!(
            "{operation} exceeded {}ms",
            limit.as_millis()
        ))),
    }
}

fn parse_created_at(micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{}': {e}", micros))
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl ReadRepository for PostgresRepository {
    async fn get(&self, code: &ShortCode) -> Result<Option<Link>> {
        let row = with_timeout(
            SELECT_TIMEOUT,
            "select link",
            sqlx::query(
                r#"
                SELECT original_url, created_at
                FROM links
                WHERE short_code = $1
                "#,
            )
            .bind(code.as_str())
            .fetch_optional(&self.pool),
        )
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let original_url: String = row.try_get("original_url").map_err(map_sqlx_error)?;
        let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;

        Ok(Some(Link {
            code: code.clone(),
            original_url,
            created_at: parse_created_at(created_at)?,
        }))
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn insert(&self, code: &ShortCode, original_url: &str) -> Result<Link> {
        let created_at = Timestamp::now();

        let result = tokio::time::timeout(
            INSERT_TIMEOUT,
            sqlx::query(
                r#"
                INSERT INTO links (short_code, original_url, created_at)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(code.as_str())
            .bind(original_url)
            .bind(created_at.as_microsecond())
            .execute(&self.pool),
        )
        .await;

        match result {
            Ok(Ok(_)) => Ok(Link {
                code: code.clone(),
                original_url: original_url.to_owned(),
                created_at,
            }),
            Ok(Err(err)) if is_unique_violation(&err) => {
                debug!(code = %code, "short code already taken");
                Err(StorageError::Conflict(code.to_string()))
            }
            Ok(Err(err)) => Err(map_sqlx_error(err)),
            Err(_) => Err(StorageError::Timeout(format!(
                "insert link exceeded {}ms",
                INSERT_TIMEOUT.as_millis()
            ))),
        }
    }
}
