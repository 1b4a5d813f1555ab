//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Once};

use cluster_alias::{
    schema, AliasDirectory, DirectoryConfig, ManualClock, RetryPolicy, RowMap, SqlExecutor,
    SqlValue, SqliteGateway, StoreError, StoreGateway,
};

pub const NOW: i64 = 1_700_000_000;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// What the faulty gateway should do to writes touching a table.
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Fail with a non-retryable error.
    Persistent,
    /// Fail with contention this many times, then let writes through.
    Transient(u32),
}

/// Gateway wrapper that injects failures into writes on chosen tables.
///
/// Reads always pass through.
pub struct FaultyGateway {
    inner: SqliteGateway,
    faults: Mutex<Vec<(String, Fault)>>,
    transient_hits: AtomicU32,
}

impl FaultyGateway {
    pub fn new(inner: SqliteGateway) -> Self {
        Self {
            inner,
            faults: Mutex::new(Vec::new()),
            transient_hits: AtomicU32::new(0),
        }
    }

    /// Inject `fault` into writes whose SQL mentions `table` as a whole word.
    pub fn fail_writes_to(&self, table: &str, fault: Fault) {
        self.faults
            .lock()
            .expect("faults lock")
            .push((table.to_string(), fault));
    }

    pub fn clear_faults(&self) {
        self.faults.lock().expect("faults lock").clear();
        self.transient_hits.store(0, Ordering::SeqCst);
    }

    fn check(&self, sql: &str) -> Result<(), StoreError> {
        let faults = self.faults.lock().expect("faults lock");
        for (table, fault) in faults.iter() {
            if !mentions_table(sql, table) {
                continue;
            }
            match fault {
                Fault::Persistent => {
                    return Err(StoreError::OperationFailed(format!(
                        "injected failure on {table}"
                    )))
                }
                Fault::Transient(times) => {
                    if self.transient_hits.fetch_add(1, Ordering::SeqCst) < *times {
                        return Err(StoreError::Transient(format!(
                            "injected lock wait on {table}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn mentions_table(sql: &str, table: &str) -> bool {
    sql.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| word == table)
}

struct FaultyExecutor<'a> {
    inner: &'a dyn SqlExecutor,
    gateway: &'a FaultyGateway,
}

impl SqlExecutor for FaultyExecutor<'_> {
    fn execute_write(&self, sql: &str, args: &[SqlValue]) -> Result<u64, StoreError> {
        self.gateway.check(sql)?;
        self.inner.execute_write(sql, args)
    }
}

impl StoreGateway for FaultyGateway {
    fn execute_query(
        &self,
        sql: &str,
        args: &[SqlValue],
        handler: &mut dyn FnMut(&RowMap) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        self.inner.execute_query(sql, args, handler)
    }

    fn execute_write(&self, sql: &str, args: &[SqlValue]) -> Result<u64, StoreError> {
        self.check(sql)?;
        self.inner.execute_write(sql, args)
    }

    fn execute_transactional_write(
        &self,
        write: &mut dyn FnMut(&dyn SqlExecutor) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        self.inner
            .execute_transactional_write(&mut |tx: &dyn SqlExecutor| {
                write(&FaultyExecutor {
                    inner: tx,
                    gateway: self,
                })
            })
    }
}

pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
    }
}

pub fn sqlite(retry: RetryPolicy) -> SqliteGateway {
    let conn = rusqlite_connection();
    let gateway = SqliteGateway::from_connection(conn, retry);
    schema::ensure_alias_tables(&gateway).expect("alias tables");
    schema::ensure_discovery_tables(&gateway).expect("discovery tables");
    gateway
}

fn rusqlite_connection() -> rusqlite::Connection {
    rusqlite::Connection::open_in_memory().expect("in-memory database")
}

pub struct Fixture {
    pub directory: AliasDirectory,
    pub gateway: Arc<FaultyGateway>,
    pub clock: Arc<ManualClock>,
}

pub fn fixture() -> Fixture {
    fixture_with_retry(fast_retry(3))
}

pub fn fixture_with_retry(retry: RetryPolicy) -> Fixture {
    init_tracing();
    let gateway = Arc::new(FaultyGateway::new(sqlite(retry)));
    let clock = Arc::new(ManualClock::new(NOW));
    let config = DirectoryConfig::builder().retry_policy(retry).build();
    let directory = AliasDirectory::with_clock(gateway.clone(), clock.clone(), config);
    Fixture {
        directory,
        gateway,
        clock,
    }
}

/// One discovery row for `database_instance`.
pub struct Instance<'a> {
    pub host: &'a str,
    pub cluster: &'a str,
    pub alias: &'a str,
    pub read_only: bool,
    pub replicas: i64,
    pub last_checked: Option<i64>,
    pub last_seen: Option<i64>,
}

impl<'a> Instance<'a> {
    pub fn new(host: &'a str, cluster: &'a str, alias: &'a str) -> Self {
        Self {
            host,
            cluster,
            alias,
            read_only: false,
            replicas: 0,
            last_checked: Some(NOW),
            last_seen: Some(NOW),
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn replicas(mut self, replicas: i64) -> Self {
        self.replicas = replicas;
        self
    }

    /// Last check did not reach the instance.
    pub fn unreachable(mut self) -> Self {
        self.last_seen = Some(NOW - 600);
        self
    }

    pub fn insert(self, gateway: &dyn StoreGateway) {
        gateway
            .execute_write(
                "INSERT INTO database_instance
                    (hostname, port, cluster_name, suggested_cluster_alias,
                     read_only, num_slave_hosts, last_checked, last_seen)
                 VALUES (?, 3306, ?, ?, ?, ?, ?, ?)",
                &[
                    self.host.into(),
                    self.cluster.into(),
                    self.alias.into(),
                    self.read_only.into(),
                    self.replicas.into(),
                    self.last_checked.into(),
                    self.last_seen.into(),
                ],
            )
            .expect("insert instance");
    }
}

pub fn downtime(gateway: &dyn StoreGateway, host: &str, reason: &str, end: i64) {
    gateway
        .execute_write(
            "INSERT INTO database_instance_downtime
                (hostname, port, downtime_active, end_timestamp, reason)
             VALUES (?, 3306, 1, ?, ?)",
            &[host.into(), end.into(), reason.into()],
        )
        .expect("insert downtime");
}
