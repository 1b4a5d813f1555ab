//! Directory lookups.

use tracing::debug;

use crate::directory::AliasDirectory;
use crate::error::AliasError;
use crate::gateway::SqlValue;
use crate::types::{AliasMapping, AliasOverride};

impl AliasDirectory {
    /// Resolve an alias to the cluster identity it currently names.
    ///
    /// Matches rows whose alias equals `alias`, or whose identity equals it
    /// (identities are implicitly their own alias). When several rows match,
    /// the lowest identity wins.
    ///
    /// # Errors
    ///
    /// - [`AliasError::NotFound`]: no row matches
    /// - [`AliasError::Persistent`]: the query failed
    pub fn resolve_identity_by_alias(&self, alias: &str) -> Result<String, AliasError> {
        let mut identity: Option<String> = None;
        self.gateway.execute_query(
            "SELECT cluster_name
               FROM cluster_alias
              WHERE alias = ? OR cluster_name = ?
              ORDER BY cluster_name ASC
              LIMIT 1",
            &[SqlValue::from(alias), SqlValue::from(alias)],
            &mut |row| {
                identity = Some(row.get_string("cluster_name"));
                Ok(())
            },
        )?;

        match identity {
            Some(identity) => {
                debug!(alias = %alias, identity = %identity, "Resolved alias");
                Ok(identity)
            }
            None => Err(AliasError::NotFound {
                alias: alias.to_string(),
            }),
        }
    }

    /// Resolve a cluster identity to its alias.
    ///
    /// Returns the identity itself when no alias is registered; callers must
    /// not treat that as a failure.
    pub fn resolve_alias_by_identity(&self, identity: &str) -> Result<String, AliasError> {
        let mut alias = identity.to_string();
        self.gateway.execute_query(
            "SELECT alias FROM cluster_alias WHERE cluster_name = ?",
            &[SqlValue::from(identity)],
            &mut |row| {
                alias = row.get_string("alias");
                Ok(())
            },
        )?;
        Ok(alias)
    }

    /// The operator-pinned alias for `identity`, if one was set.
    pub fn read_override(&self, identity: &str) -> Result<Option<String>, AliasError> {
        let mut alias = None;
        self.gateway.execute_query(
            "SELECT alias FROM cluster_alias_override WHERE cluster_name = ?",
            &[SqlValue::from(identity)],
            &mut |row| {
                alias = Some(row.get_string("alias"));
                Ok(())
            },
        )?;
        Ok(alias)
    }

    /// Every row of the alias map, ordered by identity.
    pub fn list_aliases(&self) -> Result<Vec<AliasMapping>, AliasError> {
        let mut mappings = Vec::new();
        self.gateway.execute_query(
            "SELECT cluster_name, alias, last_registered
               FROM cluster_alias
              ORDER BY cluster_name",
            &[],
            &mut |row| {
                mappings.push(AliasMapping {
                    identity: row.get_string("cluster_name"),
                    alias: row.get_string("alias"),
                    registered_at: row.get_i64("last_registered"),
                });
                Ok(())
            },
        )?;
        Ok(mappings)
    }

    /// Every operator override, ordered by identity.
    pub fn list_overrides(&self) -> Result<Vec<AliasOverride>, AliasError> {
        let mut overrides = Vec::new();
        self.gateway.execute_query(
            "SELECT cluster_name, alias FROM cluster_alias_override ORDER BY cluster_name",
            &[],
            &mut |row| {
                overrides.push(AliasOverride {
                    identity: row.get_string("cluster_name"),
                    alias: row.get_string("alias"),
                });
                Ok(())
            },
        )?;
        Ok(overrides)
    }
}

#[cfg(test)]
mod tests {
    use crate::directory::test_support::{directory, NOW};
    use crate::error::AliasError;
    use crate::types::AliasMapping;

    #[test]
    fn test_unknown_identity_is_its_own_alias() {
        let (directory, _, _) = directory();
        assert_eq!(
            directory
                .resolve_alias_by_identity("db-9:3306")
                .expect("lookup succeeds"),
            "db-9:3306"
        );
    }

    #[test]
    fn test_unknown_alias_is_not_found() {
        let (directory, _, _) = directory();
        let result = directory.resolve_identity_by_alias("payments");
        assert!(matches!(
            result,
            Err(AliasError::NotFound { alias }) if alias == "payments"
        ));
    }

    #[test]
    fn test_resolve_both_directions() {
        let (directory, _, _) = directory();
        directory
            .set_alias("db-1:3306", "payments")
            .expect("set alias");

        assert_eq!(
            directory.resolve_identity_by_alias("payments").expect("by alias"),
            "db-1:3306"
        );
        assert_eq!(
            directory
                .resolve_alias_by_identity("db-1:3306")
                .expect("by identity"),
            "payments"
        );
    }

    #[test]
    fn test_known_identity_resolves_as_alias() {
        let (directory, _, _) = directory();
        directory
            .set_alias("db-1:3306", "payments")
            .expect("set alias");

        assert_eq!(
            directory
                .resolve_identity_by_alias("db-1:3306")
                .expect("identity used as alias"),
            "db-1:3306"
        );
    }

    #[test]
    fn test_shared_alias_resolves_to_lowest_identity() {
        let (directory, _, _) = directory();
        directory.set_alias("db-7:3306", "orders").expect("set");
        directory.set_alias("db-2:3306", "orders").expect("set");
        directory.set_alias("db-5:3306", "orders").expect("set");

        assert_eq!(
            directory.resolve_identity_by_alias("orders").expect("resolve"),
            "db-2:3306"
        );
    }

    #[test]
    fn test_list_aliases_is_ordered() {
        let (directory, _, _) = directory();
        directory.set_alias("b", "beta").expect("set");
        directory.set_alias("a", "alpha").expect("set");

        assert_eq!(
            directory.list_aliases().expect("list"),
            vec![
                AliasMapping {
                    identity: "a".into(),
                    alias: "alpha".into(),
                    registered_at: NOW,
                },
                AliasMapping {
                    identity: "b".into(),
                    alias: "beta".into(),
                    registered_at: NOW,
                },
            ]
        );
    }

    #[test]
    fn test_read_override() {
        let (directory, _, _) = directory();
        assert_eq!(directory.read_override("db-1:3306").expect("read"), None);

        directory
            .set_override("db-1:3306", "billing")
            .expect("set override");
        assert_eq!(
            directory.read_override("db-1:3306").expect("read"),
            Some("billing".to_string())
        );
    }
}
