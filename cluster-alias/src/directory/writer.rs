//! Explicit alias and override writes.

use tracing::{error, info};

use crate::directory::AliasDirectory;
use crate::error::AliasError;
use crate::gateway::SqlValue;

pub(crate) const UPSERT_ALIAS_SQL: &str =
    "INSERT INTO cluster_alias (cluster_name, alias, last_registered)
     VALUES (?, ?, ?)
     ON CONFLICT (cluster_name) DO UPDATE SET
         alias = excluded.alias,
         last_registered = excluded.last_registered";

const UPSERT_OVERRIDE_SQL: &str = "INSERT INTO cluster_alias_override (cluster_name, alias)
     VALUES (?, ?)
     ON CONFLICT (cluster_name) DO UPDATE SET alias = excluded.alias";

impl AliasDirectory {
    /// Register `alias` for `identity`, replacing any previous alias.
    ///
    /// Idempotent. Refreshes the registration timestamp. Does not check
    /// whether another identity already uses the same alias.
    pub fn set_alias(&self, identity: &str, alias: &str) -> Result<(), AliasError> {
        let args = [
            SqlValue::from(identity),
            SqlValue::from(alias),
            SqlValue::from(self.now()),
        ];
        self.gateway
            .execute_transactional_write(&mut |tx| {
                tx.execute_write(UPSERT_ALIAS_SQL, &args)?;
                Ok(())
            })
            .map_err(|err| {
                error!(
                    identity = %identity,
                    alias = %alias,
                    error = %err,
                    "Failed to write cluster alias"
                );
                AliasError::from(err)
            })?;

        info!(identity = %identity, alias = %alias, "Wrote cluster alias");
        Ok(())
    }

    /// Pin `alias` for `identity` in the override table.
    ///
    /// Overrides are never touched by synchronization and are not merged
    /// into the alias map.
    pub fn set_override(&self, identity: &str, alias: &str) -> Result<(), AliasError> {
        let args = [SqlValue::from(identity), SqlValue::from(alias)];
        self.gateway
            .execute_transactional_write(&mut |tx| {
                tx.execute_write(UPSERT_OVERRIDE_SQL, &args)?;
                Ok(())
            })
            .map_err(|err| {
                error!(
                    identity = %identity,
                    alias = %alias,
                    error = %err,
                    "Failed to write cluster alias override"
                );
                AliasError::from(err)
            })?;

        info!(identity = %identity, alias = %alias, "Wrote cluster alias override");
        Ok(())
    }
}
