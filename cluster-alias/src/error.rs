//! Error types for the alias directory and its store gateway.

use thiserror::Error;

/// Errors surfaced by [`AliasDirectory`](crate::AliasDirectory) operations.
#[derive(Debug, Error)]
pub enum AliasError {
    /// The alias matches neither a registered alias nor a known identity.
    #[error("no cluster found for alias {alias}")]
    NotFound {
        /// The alias that failed to resolve.
        alias: String,
    },

    /// Write contention outlived the gateway's retry budget.
    #[error("write contention persisted after {attempts} attempts: {last}")]
    TransientWriteFailure {
        /// How many attempts the gateway made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last: StoreError,
    },

    /// Any other store failure, propagated as reported by the gateway.
    #[error("store failure: {0}")]
    Persistent(StoreError),
}

impl From<StoreError> for AliasError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RetriesExhausted { attempts, last } => AliasError::TransientWriteFailure {
                attempts,
                last: *last,
            },
            other => AliasError::Persistent(other),
        }
    }
}

/// Errors reported by a [`StoreGateway`](crate::StoreGateway).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Error from the underlying SQLite connection.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Contention the caller may retry (lock wait, busy database, deadlock).
    #[error("transient contention: {0}")]
    Transient(String),

    /// A transactional write kept hitting transient contention.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        last: Box<StoreError>,
    },

    /// Generic gateway failure.
    #[error("store operation failed: {0}")]
    OperationFailed(String),
}

impl StoreError {
    /// Whether a retried write transaction may succeed where this one failed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Transient(_) => true,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(failure, _)) => matches!(
                failure.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Errors from loading a [`DirectoryConfig`](crate::DirectoryConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document is not valid JSON for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the directory cannot run with.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
