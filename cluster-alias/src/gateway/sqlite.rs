//! SQLite-backed store gateway.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::types::{ToSql, ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::gateway::retry::RetryPolicy;
use crate::gateway::row::{RowMap, SqlValue};
use crate::gateway::traits::{SqlExecutor, StoreGateway};

/// How long SQLite itself waits on a locked database before reporting BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(value) => ToSqlOutput::Owned(Value::Integer(*value)),
            SqlValue::Real(value) => ToSqlOutput::Owned(Value::Real(*value)),
            SqlValue::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
        })
    }
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(value) => SqlValue::Integer(value),
            ValueRef::Real(value) => SqlValue::Real(value),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

/// A [`StoreGateway`] over a single SQLite connection.
///
/// The connection is guarded by a mutex, so one gateway serializes its own
/// callers; other processes sharing the database file contend through
/// SQLite's locking, which is where [`RetryPolicy`] comes in.
#[derive(Debug)]
pub struct SqliteGateway {
    conn: Mutex<Connection>,
    retry: RetryPolicy,
}

impl SqliteGateway {
    /// Open (or create) a database file.
    #[instrument(skip(retry))]
    pub fn open(path: &str, retry: RetryPolicy) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        debug!("Opened SQLite alias store");
        Ok(Self::from_connection(conn, retry))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn, RetryPolicy::default()))
    }

    /// Wrap an already configured connection.
    pub fn from_connection(conn: Connection, retry: RetryPolicy) -> Self {
        Self {
            conn: Mutex::new(conn),
            retry,
        }
    }

    /// The retry policy applied to transactional writes.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::OperationFailed("SQLite connection mutex poisoned".into()))
    }
}

/// Executor handed to transactional write closures.
struct TransactionExecutor<'conn> {
    tx: &'conn Transaction<'conn>,
}

impl SqlExecutor for TransactionExecutor<'_> {
    fn execute_write(&self, sql: &str, args: &[SqlValue]) -> Result<u64, StoreError> {
        let affected = self.tx.execute(sql, params_from_iter(args.iter()))?;
        Ok(affected as u64)
    }
}

impl StoreGateway for SqliteGateway {
    fn execute_query(
        &self,
        sql: &str,
        args: &[SqlValue],
        handler: &mut dyn FnMut(&RowMap) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        while let Some(row) = rows.next()? {
            let mut map = RowMap::new();
            for (index, name) in names.iter().enumerate() {
                map.insert(name.as_str(), SqlValue::from(row.get_ref(index)?));
            }
            handler(&map)?;
        }
        Ok(())
    }

    fn execute_write(&self, sql: &str, args: &[SqlValue]) -> Result<u64, StoreError> {
        let conn = self.lock()?;
        let affected = conn.execute(sql, params_from_iter(args.iter()))?;
        Ok(affected as u64)
    }

    fn execute_transactional_write(
        &self,
        write: &mut dyn FnMut(&dyn SqlExecutor) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        self.retry.run(|| {
            let mut conn = self.lock()?;
            // IMMEDIATE takes the write lock up front so contention shows up
            // as BUSY here rather than mid-transaction.
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            write(&TransactionExecutor { tx: &tx })?;
            tx.commit()?;
            Ok(())
        })
    }
}
