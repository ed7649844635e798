//! # Ledger Store Errors
//!
//! Every failure the store can hand back, classified by what the schema or
//! the engine's guards rejected rather than by the raw SQLite message.
//!
//! ## Where Each Variant Comes From
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQLite / sqlx                         DbError                          │
//! │  ─────────────────────────────────     ───────────────────────────────  │
//! │  UNIQUE (business_tokens.business_id)  UniqueViolation  → AlreadyExists │
//! │  CHECK / FOREIGN KEY / NOT NULL        ConstraintViolation              │
//! │  RAISE(ABORT) on transactions          AppendOnly                       │
//! │  SQLITE_BUSY after busy_timeout        Busy                             │
//! │  CAS UPDATE matched 0 rows             ConcurrentModification           │
//! │  lookup by id found nothing            NotFound         → NotFound      │
//! │  pool open / acquire / closed          Connection                       │
//! │  embedded migrations                   Migration                        │
//! │  anything else                         Query                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! fodi-market turns `NotFound` and `UniqueViolation` into their own
//! variants; everything else becomes `MarketError::Internal`.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Message of the append-only triggers in `001_initial_schema.sql`.
const APPEND_ONLY_MESSAGE: &str = "transactions are append-only";

/// Ledger store errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `constraint` is the `table.column` SQLite reports.
    #[error("{entity} already exists ({constraint})")]
    UniqueViolation { entity: String, constraint: String },

    /// CHECK, FOREIGN KEY or NOT NULL rejected the write.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Something tried to rewrite or remove a ledger row.
    #[error("Transactions are append-only")]
    AppendOnly,

    /// Another writer changed the row between read and write.
    #[error("Concurrent modification of {entity} {id}")]
    ConcurrentModification { entity: String, id: String },

    /// The database stayed locked past the busy timeout.
    #[error("Database busy: {0}")]
    Busy(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn concurrent_modification(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::ConcurrentModification {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether this is a UNIQUE violation (lost insert race).
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }

    /// Builds a `UniqueViolation` from SQLite's
    /// `UNIQUE constraint failed: <table>.<column>[, ...]` message.
    fn unique_violation(message: &str) -> Self {
        let constraint = message
            .split("constraint failed: ")
            .nth(1)
            .and_then(|cols| cols.split(',').next())
            .map(str::trim)
            .unwrap_or("unknown")
            .to_string();
        let table = constraint.split('.').next().unwrap_or_default();

        DbError::UniqueViolation {
            entity: entity_for_table(table).to_string(),
            constraint,
        }
    }
}

/// Domain name of the row a ledger table stores.
fn entity_for_table(table: &str) -> &str {
    match table {
        "businesses" => "Business",
        "business_tokens" => "Token",
        "business_subscriptions" => "Subscription",
        "transactions" => "Transaction",
        other => other,
    }
}

fn is_busy(code: Option<&str>, message: &str) -> bool {
    // SQLITE_BUSY and its extended codes
    matches!(code, Some("5") | Some("261") | Some("517") | Some("773"))
        || message.contains("database is locked")
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::unique_violation(message),
                    ErrorKind::ForeignKeyViolation
                    | ErrorKind::CheckViolation
                    | ErrorKind::NotNullViolation => {
                        DbError::ConstraintViolation(message.to_string())
                    }
                    _ if message.contains(APPEND_ONLY_MESSAGE) => DbError::AppendOnly,
                    _ if is_busy(db_err.code().as_deref(), message) => {
                        DbError::Busy(message.to_string())
                    }
                    _ => DbError::Query(message.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => {
                DbError::Connection("timed out acquiring a pooled connection".to_string())
            }
            sqlx::Error::PoolClosed => DbError::Connection("pool is closed".to_string()),

            other => DbError::Query(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err.to_string())
    }
}

/// Result type for ledger store operations.
pub type DbResult<T> = Result<T, DbError>;
