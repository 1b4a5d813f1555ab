//! Store gateway trait definitions.
//!
//! The directory never talks to a database driver directly. It submits SQL
//! through a [`StoreGateway`], which owns connections, transactions and the
//! retry policy for contended writes.

use crate::error::StoreError;
use crate::gateway::row::{RowMap, SqlValue};

/// Executes mutating statements inside an open write transaction.
pub trait SqlExecutor {
    /// Run one mutating statement and return the number of affected rows.
    fn execute_write(&self, sql: &str, args: &[SqlValue]) -> Result<u64, StoreError>;
}

/// Access to the shared relational store.
///
/// # Consistency Model
///
/// Reads are not transactional and may race with concurrent writers.
/// Mutations go through [`execute_transactional_write`], which retries the
/// whole closure on transient contention, so the closure must be safe to run
/// more than once.
///
/// [`execute_transactional_write`]: StoreGateway::execute_transactional_write
///
/// # Example
///
/// ```rust,ignore
/// gateway.execute_query(
///     "SELECT alias FROM cluster_alias WHERE cluster_name = ?",
///     &[SqlValue::from("db-1:3306")],
///     &mut |row| {
///         alias = Some(row.get_string("alias"));
///         Ok(())
///     },
/// )?;
///
/// gateway.execute_transactional_write(&mut |tx| {
///     tx.execute_write("DELETE FROM cluster_alias WHERE cluster_name = ?", &[name.clone()])?;
///     Ok(())
/// })?;
/// ```
pub trait StoreGateway: Send + Sync {
    /// Run a read query, calling `handler` once per result row.
    ///
    /// An error returned by the handler stops iteration and is propagated.
    fn execute_query(
        &self,
        sql: &str,
        args: &[SqlValue],
        handler: &mut dyn FnMut(&RowMap) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;

    /// Run a single mutating statement outside any explicit transaction.
    fn execute_write(&self, sql: &str, args: &[SqlValue]) -> Result<u64, StoreError>;

    /// Run `write` inside a write transaction, retrying on contention.
    ///
    /// The transaction commits when `write` returns `Ok` and rolls back
    /// otherwise. Contention that outlives the retry budget surfaces as
    /// [`StoreError::RetriesExhausted`].
    fn execute_transactional_write(
        &self,
        write: &mut dyn FnMut(&dyn SqlExecutor) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;
}
