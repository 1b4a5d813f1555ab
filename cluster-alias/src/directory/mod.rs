//! The alias directory: alias ↔ identity resolution and maintenance.
//!
//! Operations are split by concern:
//!
//! - [`reader`]: lookups by alias and by identity, listings
//! - [`writer`]: explicit alias and override upserts
//! - [`sync`]: reconciliation against discovery facts
//! - [`rename`]: re-keying rows when a cluster identity changes

pub mod reader;
pub mod rename;
pub mod sync;
pub mod writer;

use std::fmt;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::DirectoryConfig;
use crate::gateway::StoreGateway;

pub use sync::SyncReport;

/// Durable directory mapping stable aliases to volatile cluster identities.
///
/// # Read Contract
///
/// - An identity with no registered alias is its own alias (self-alias).
///   [`resolve_alias_by_identity`](Self::resolve_alias_by_identity) never
///   fails for a missing row.
/// - An alias that is not registered but equals a registered identity
///   resolves to that identity.
/// - Several identities may share one alias. Lookup by alias then returns the
///   lowest identity in byte order.
///
/// # Overrides
///
/// Operator overrides are stored next to the alias map and re-keyed on
/// rename, but never merged into it. Consumers that want an override to win
/// read it with [`read_override`](Self::read_override) and apply their own
/// precedence.
///
/// # Concurrency
///
/// The directory holds no locks and no cached state. Every mutation is
/// submitted to the gateway as a retried transactional write; reads may race
/// with concurrent writers and only last-write-wins is guaranteed.
#[derive(Clone)]
pub struct AliasDirectory {
    gateway: Arc<dyn StoreGateway>,
    clock: Arc<dyn Clock>,
    config: DirectoryConfig,
}

impl AliasDirectory {
    /// Create a directory over `gateway` using the wall clock.
    pub fn new(gateway: Arc<dyn StoreGateway>, config: DirectoryConfig) -> Self {
        Self::with_clock(gateway, Arc::new(SystemClock), config)
    }

    /// Create a directory with an explicit clock.
    pub fn with_clock(
        gateway: Arc<dyn StoreGateway>,
        clock: Arc<dyn Clock>,
        config: DirectoryConfig,
    ) -> Self {
        Self {
            gateway,
            clock,
            config,
        }
    }

    /// The directory's configuration.
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    fn now(&self) -> i64 {
        self.clock.now_unix()
    }
}

impl fmt::Debug for AliasDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AliasDirectory")
            .field("clock", &self.clock)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
