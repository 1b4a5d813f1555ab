//! Access to the shared relational store.
//!
//! - **StoreGateway**: read, write and retried transactional write
//! - **SqlExecutor**: statement execution inside an open transaction
//! - **RetryPolicy**: bounded backoff for contended writes
//! - **SqliteGateway**: SQLite implementation

pub mod retry;
pub mod row;
pub mod sqlite;
pub mod traits;

// Re-exports
pub use retry::RetryPolicy;
pub use row::{RowMap, SqlValue};
pub use sqlite::SqliteGateway;
pub use traits::{SqlExecutor, StoreGateway};
