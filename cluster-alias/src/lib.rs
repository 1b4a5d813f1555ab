//! # cluster-alias
//!
//! Durable alias directory for database clusters.
//!
//! A cluster's identity (its cluster name) follows the current primary and
//! therefore changes whenever a failover promotes a new member. Dashboards,
//! automation and alerting want a name that does not move. This crate keeps a
//! many-to-one mapping from stable **aliases** to volatile **identities**:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      AliasDirectory                          │
//! │  resolve_identity_by_alias / resolve_alias_by_identity       │
//! │  set_alias / set_override / rename_identity / synchronize    │
//! ├──────────────────────────────────────────────────────────────┤
//! │                 StoreGateway (trait)                         │
//! │  execute_query · execute_write · execute_transactional_write │
//! ├──────────────────────────────────────────────────────────────┤
//! │  SqliteGateway        │  any other relational backend        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store holds two owned relations, `cluster_alias` (the authoritative
//! mapping) and `cluster_alias_override` (operator pins), and reads the
//! upstream discovery relations `database_instance` and
//! `database_instance_downtime` without ever writing them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cluster_alias::{AliasDirectory, DirectoryConfig, SqliteGateway, schema};
//!
//! let config = DirectoryConfig::default();
//! let gateway = Arc::new(SqliteGateway::open("aliases.db", config.retry_policy())?);
//! schema::ensure_alias_tables(gateway.as_ref())?;
//!
//! let directory = AliasDirectory::new(gateway, config);
//! directory.synchronize()?;
//! let cluster = directory.resolve_identity_by_alias("payments")?;
//! ```

#![deny(missing_docs)]

pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod gateway;
pub mod runner;
pub mod schema;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{DirectoryConfig, DirectoryConfigBuilder, DEFAULT_LOST_IN_RECOVERY_REASON};
pub use directory::{AliasDirectory, SyncReport};
pub use error::{AliasError, ConfigError, StoreError};
pub use gateway::{RetryPolicy, RowMap, SqlExecutor, SqlValue, SqliteGateway, StoreGateway};
pub use runner::{run_periodic_sync, SyncRunnerStats, MIN_SYNC_INTERVAL};
pub use types::{AliasMapping, AliasOverride, DiscoveryFact};
