//! Rows of the alias relations and the upstream discovery facts.

use serde::{Deserialize, Serialize};

/// One row of the authoritative alias map (`cluster_alias`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasMapping {
    /// Current cluster identity (cluster name).
    pub identity: String,
    /// Stable human-facing name.
    pub alias: String,
    /// Unix seconds of the last registration.
    pub registered_at: i64,
}

/// One operator-pinned row of `cluster_alias_override`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasOverride {
    /// Cluster identity the pin applies to.
    pub identity: String,
    /// Alias chosen by the operator.
    pub alias: String,
}

/// Per-instance facts reported by topology discovery.
///
/// Several facts share an identity, one per member instance of the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoveryFact {
    /// Cluster identity the reporting instance belongs to.
    pub identity: String,
    /// Alias suggested by the instance; empty when it has none.
    pub suggested_alias: String,
    /// Whether the instance is read-only.
    pub read_only: bool,
    /// Number of replicas attached to the instance.
    pub replica_count: i64,
    /// Unix seconds of the last check attempt.
    pub last_checked: Option<i64>,
    /// Unix seconds the instance was last seen healthy.
    pub last_seen: Option<i64>,
    /// Under active downtime with the "lost in recovery" reason.
    pub downtime_excluded: bool,
}

impl DiscoveryFact {
    /// Whether the most recent check reached the instance.
    ///
    /// True when `last_checked <= last_seen`. A missing timestamp counts as
    /// false.
    pub fn last_check_succeeded(&self) -> bool {
        matches!(
            (self.last_checked, self.last_seen),
            (Some(checked), Some(seen)) if checked <= seen
        )
    }

    /// Whether this fact may contribute its suggested alias.
    pub fn is_eligible(&self) -> bool {
        !self.identity.is_empty() && !self.suggested_alias.is_empty() && !self.downtime_excluded
    }
}
