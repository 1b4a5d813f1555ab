//! Synchronization of the alias map against discovery facts.
//!
//! Every member instance of a cluster reports a suggested alias. Members may
//! disagree, so each pass orders the eligible facts and applies one upsert per
//! fact in that order; the last upsert for an identity wins.
//!
//! # Ordering
//!
//! ```text
//! 1. last_check_succeeded   ascending   (unreachable members first)
//! 2. read_only              descending  (read-only members first)
//! 3. replica_count          ascending   (leaf members first)
//! ```
//!
//! Applied last, and therefore authoritative, is a reachable member; among
//! reachable members a writable one; among those the one with most replicas.
//! In a healthy topology that is the primary. This is the outcome of the
//! sort above under last-applied-wins; the sort keys and directions are
//! fixed and must not be reversed to "prefer" the first member.
//!
//! Identities whose every fact carries an empty suggestion get a self-alias
//! in a second pass.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, error, info};

use crate::directory::writer::UPSERT_ALIAS_SQL;
use crate::directory::AliasDirectory;
use crate::error::AliasError;
use crate::gateway::SqlValue;
use crate::types::DiscoveryFact;

const DISCOVERY_FACTS_SQL: &str = "SELECT
        database_instance.cluster_name,
        database_instance.suggested_cluster_alias,
        database_instance.read_only,
        database_instance.num_slave_hosts,
        database_instance.last_checked,
        database_instance.last_seen,
        CASE
            WHEN downtime.downtime_active = 1
                 AND downtime.end_timestamp > ?
                 AND downtime.reason = ?
            THEN 1 ELSE 0
        END AS downtime_excluded
    FROM database_instance
    LEFT JOIN database_instance_downtime AS downtime
        ON downtime.hostname = database_instance.hostname
       AND downtime.port = database_instance.port
    ORDER BY database_instance.hostname, database_instance.port";

/// Outcome of one synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Discovery facts read.
    pub facts_read: usize,
    /// Facts that contributed a suggested alias.
    pub eligible: usize,
    /// Facts with a suggestion that were skipped for lost-in-recovery downtime.
    pub downtime_excluded: usize,
    /// Distinct identities that received a suggested alias.
    pub aliased_identities: usize,
    /// Identities that received a self-alias.
    pub fallback_identities: usize,
}

/// Upserts to apply, in order, for one pass.
#[derive(Debug, Default)]
pub(crate) struct SyncPlan {
    /// `(identity, alias)` pairs; later entries overwrite earlier ones.
    pub(crate) upserts: Vec<(String, String)>,
    /// Identities to self-alias.
    pub(crate) fallback: Vec<String>,
    pub(crate) report: SyncReport,
}

/// Order facts and derive the upserts for both passes.
///
/// Facts with an empty identity are ignored entirely.
pub(crate) fn plan_synchronization(facts: Vec<DiscoveryFact>) -> SyncPlan {
    let mut report = SyncReport {
        facts_read: facts.len(),
        ..SyncReport::default()
    };

    // identity -> every fact so far had an empty suggestion
    let mut all_empty: BTreeMap<&str, bool> = BTreeMap::new();
    for fact in facts.iter().filter(|fact| !fact.identity.is_empty()) {
        let empty = all_empty.entry(fact.identity.as_str()).or_insert(true);
        *empty &= fact.suggested_alias.is_empty();
        if fact.downtime_excluded && !fact.suggested_alias.is_empty() {
            report.downtime_excluded += 1;
        }
    }
    let fallback: Vec<String> = all_empty
        .into_iter()
        .filter(|(_, empty)| *empty)
        .map(|(identity, _)| identity.to_string())
        .collect();

    let mut eligible: Vec<&DiscoveryFact> =
        facts.iter().filter(|fact| fact.is_eligible()).collect();
    // Stable: ties keep the store's (hostname, port) order.
    eligible.sort_by_key(|fact| {
        (
            fact.last_check_succeeded(),
            Reverse(fact.read_only),
            fact.replica_count,
        )
    });

    let aliased: BTreeSet<&str> = eligible.iter().map(|fact| fact.identity.as_str()).collect();
    report.eligible = eligible.len();
    report.aliased_identities = aliased.len();
    report.fallback_identities = fallback.len();

    let upserts = eligible
        .into_iter()
        .map(|fact| (fact.identity.clone(), fact.suggested_alias.clone()))
        .collect();

    SyncPlan {
        upserts,
        fallback,
        report,
    }
}

impl AliasDirectory {
    /// Read the discovery facts the next pass would use.
    ///
    /// `downtime_excluded` is computed against the configured lost-in-recovery
    /// reason and the directory clock.
    pub fn read_discovery_facts(&self) -> Result<Vec<DiscoveryFact>, AliasError> {
        let mut facts = Vec::new();
        self.gateway.execute_query(
            DISCOVERY_FACTS_SQL,
            &[
                SqlValue::from(self.now()),
                SqlValue::from(self.config.lost_in_recovery_reason()),
            ],
            &mut |row| {
                facts.push(DiscoveryFact {
                    identity: row.get_string("cluster_name"),
                    suggested_alias: row.get_string("suggested_cluster_alias"),
                    read_only: row.get_bool("read_only"),
                    replica_count: row.get_i64("num_slave_hosts"),
                    last_checked: row.get_opt_i64("last_checked"),
                    last_seen: row.get_opt_i64("last_seen"),
                    downtime_excluded: row.get_bool("downtime_excluded"),
                });
                Ok(())
            },
        )?;
        Ok(facts)
    }

    /// Reconcile the alias map with current discovery facts.
    ///
    /// Runs two transactional writes: suggested aliases, then self-aliases for
    /// identities with no suggestion at all. If the first fails the second is
    /// skipped. Nothing is retried here beyond the gateway's own contention
    /// handling; the next pass starts from scratch.
    pub fn synchronize(&self) -> Result<SyncReport, AliasError> {
        let facts = self.read_discovery_facts().map_err(|err| {
            error!(error = %err, "Failed to read discovery facts");
            err
        })?;
        let plan = plan_synchronization(facts);
        let now = SqlValue::from(self.now());

        if !plan.upserts.is_empty() {
            self.gateway
                .execute_transactional_write(&mut |tx| {
                    for (identity, alias) in &plan.upserts {
                        tx.execute_write(
                            UPSERT_ALIAS_SQL,
                            &[
                                SqlValue::from(identity.as_str()),
                                SqlValue::from(alias.as_str()),
                                now.clone(),
                            ],
                        )?;
                    }
                    Ok(())
                })
                .map_err(|err| {
                    error!(error = %err, "Failed to register suggested cluster aliases");
                    AliasError::from(err)
                })?;
        }

        if !plan.fallback.is_empty() {
            self.gateway
                .execute_transactional_write(&mut |tx| {
                    for identity in &plan.fallback {
                        tx.execute_write(
                            UPSERT_ALIAS_SQL,
                            &[
                                SqlValue::from(identity.as_str()),
                                SqlValue::from(identity.as_str()),
                                now.clone(),
                            ],
                        )?;
                    }
                    Ok(())
                })
                .map_err(|err| {
                    error!(error = %err, "Failed to register fallback cluster aliases");
                    AliasError::from(err)
                })?;
        }

        for identity in &plan.fallback {
            debug!(identity = %identity, "Registered self-alias");
        }
        let report = plan.report;
        info!(
            facts = report.facts_read,
            eligible = report.eligible,
            downtime_excluded = report.downtime_excluded,
            aliased = report.aliased_identities,
            fallback = report.fallback_identities,
            "Synchronized cluster aliases"
        );
        Ok(report)
    }
}
