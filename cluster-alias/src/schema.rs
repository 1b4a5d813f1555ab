//! Table names and DDL for the alias relations.
//!
//! `cluster_alias` and `cluster_alias_override` belong to the directory.
//! `database_instance` and `database_instance_downtime` belong to discovery
//! and the downtime subsystem; their DDL lives here only so the directory can
//! be embedded or tested against a standalone database.

use crate::error::StoreError;
use crate::gateway::StoreGateway;

/// Authoritative alias map.
pub const ALIAS_TABLE: &str = "cluster_alias";

/// Operator-pinned aliases.
pub const OVERRIDE_TABLE: &str = "cluster_alias_override";

const ALIAS_TABLES_DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS cluster_alias (
        cluster_name TEXT NOT NULL PRIMARY KEY,
        alias TEXT NOT NULL,
        last_registered INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS cluster_alias_alias_idx ON cluster_alias (alias)",
    "CREATE TABLE IF NOT EXISTS cluster_alias_override (
        cluster_name TEXT NOT NULL PRIMARY KEY,
        alias TEXT NOT NULL
    )",
];

const DISCOVERY_TABLES_DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS database_instance (
        hostname TEXT NOT NULL,
        port INTEGER NOT NULL,
        cluster_name TEXT NOT NULL DEFAULT '',
        suggested_cluster_alias TEXT NOT NULL DEFAULT '',
        read_only INTEGER NOT NULL DEFAULT 0,
        num_slave_hosts INTEGER NOT NULL DEFAULT 0,
        last_checked INTEGER,
        last_seen INTEGER,
        PRIMARY KEY (hostname, port)
    )",
    "CREATE INDEX IF NOT EXISTS database_instance_cluster_name_idx
        ON database_instance (cluster_name)",
    "CREATE TABLE IF NOT EXISTS database_instance_downtime (
        hostname TEXT NOT NULL,
        port INTEGER NOT NULL,
        downtime_active INTEGER,
        end_timestamp INTEGER,
        reason TEXT NOT NULL DEFAULT '',
        PRIMARY KEY (hostname, port)
    )",
];

/// Create the directory's own tables if they are missing.
pub fn ensure_alias_tables(gateway: &dyn StoreGateway) -> Result<(), StoreError> {
    apply(gateway, ALIAS_TABLES_DDL)
}

/// Create the upstream discovery and downtime tables if they are missing.
pub fn ensure_discovery_tables(gateway: &dyn StoreGateway) -> Result<(), StoreError> {
    apply(gateway, DISCOVERY_TABLES_DDL)
}

fn apply(gateway: &dyn StoreGateway, statements: &[&str]) -> Result<(), StoreError> {
    gateway.execute_transactional_write(&mut |tx| {
        for statement in statements {
            tx.execute_write(statement, &[])?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqliteGateway;

    fn table_names(gateway: &SqliteGateway) -> Vec<String> {
        let mut names = Vec::new();
        gateway
            .execute_query(
                "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                &[],
                &mut |row| {
                    names.push(row.get_string("name"));
                    Ok(())
                },
            )
            .expect("list tables");
        names
    }

    #[test]
    fn test_ensure_tables_is_idempotent() {
        let gateway = SqliteGateway::open_in_memory().expect("in-memory database");
        ensure_alias_tables(&gateway).expect("first run");
        ensure_alias_tables(&gateway).expect("second run");
        ensure_discovery_tables(&gateway).expect("discovery tables");

        assert_eq!(
            table_names(&gateway),
            vec![
                "cluster_alias",
                "cluster_alias_override",
                "database_instance",
                "database_instance_downtime",
            ]
        );
    }
}
