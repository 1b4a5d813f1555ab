//! Re-keying aliases when a cluster identity changes.

use tracing::{error, info};

use crate::directory::AliasDirectory;
use crate::error::AliasError;
use crate::gateway::SqlValue;
use crate::schema::{ALIAS_TABLE, OVERRIDE_TABLE};

// UPDATE OR REPLACE: a row already keyed by the new identity (typically a
// self-alias from an earlier pass) is dropped in favour of the renamed one.
const RENAME_ALIAS_SQL: &str =
    "UPDATE OR REPLACE cluster_alias SET cluster_name = ? WHERE cluster_name = ?";

// Plain UPDATE: an override already pinned on the new identity is operator
// intent, so the key conflict is reported instead of replacing it.
const RENAME_OVERRIDE_SQL: &str =
    "UPDATE cluster_alias_override SET cluster_name = ? WHERE cluster_name = ?";

impl AliasDirectory {
    /// Move every alias and override from `old_identity` to `new_identity`.
    ///
    /// Called by recovery after a promotion renames the cluster. Alias text
    /// is preserved.
    ///
    /// Both tables are updated in separate transactions and both updates are
    /// always attempted. This is not atomic: if the override update fails
    /// after the alias update committed, the error is returned and the alias
    /// map already points at the new identity. When both fail, the override
    /// error is the one returned.
    ///
    /// An alias row already keyed by `new_identity` is replaced. An override
    /// already pinned on `new_identity` is kept, and the rename of the
    /// override fails with [`AliasError::Persistent`].
    pub fn rename_identity(
        &self,
        old_identity: &str,
        new_identity: &str,
    ) -> Result<(), AliasError> {
        let mut result = Ok(());
        for (table, sql) in [
            (ALIAS_TABLE, RENAME_ALIAS_SQL),
            (OVERRIDE_TABLE, RENAME_OVERRIDE_SQL),
        ] {
            if let Err(err) = self.rename_in(table, sql, old_identity, new_identity) {
                result = Err(err);
            }
        }
        result
    }

    fn rename_in(
        &self,
        table: &str,
        sql: &str,
        old_identity: &str,
        new_identity: &str,
    ) -> Result<(), AliasError> {
        let args = [SqlValue::from(new_identity), SqlValue::from(old_identity)];
        let mut renamed = 0;
        self.gateway
            .execute_transactional_write(&mut |tx| {
                renamed = tx.execute_write(sql, &args)?;
                Ok(())
            })
            .map_err(|err| {
                error!(
                    table,
                    old_identity = %old_identity,
                    new_identity = %new_identity,
                    error = %err,
                    "Failed to rename cluster identity"
                );
                AliasError::from(err)
            })?;

        info!(
            table,
            old_identity = %old_identity,
            new_identity = %new_identity,
            rows = renamed,
            "Renamed cluster identity"
        );
        Ok(())
    }
}
