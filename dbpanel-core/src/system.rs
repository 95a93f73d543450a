//! Accessor for the server's `mysql` system schema.

use crate::Result;
use crate::driver::{ConnectionRole, DriverAdapter};
use std::sync::Arc;

/// Name of the system schema the accessor reads from.
pub const SYSTEM_DATABASE_NAME: &str = "mysql";

/// Read-side accessor over the server's system schema.
///
/// Obtained through
/// [`DatabaseFacade::get_system_database`](crate::facade::DatabaseFacade::get_system_database);
/// the facade constructs it once and hands out the same accessor on every
/// call.
pub struct SystemDatabase {
    driver: Arc<dyn DriverAdapter>,
}

impl std::fmt::Debug for SystemDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemDatabase").finish_non_exhaustive()
    }
}

impl SystemDatabase {
    /// Creates an accessor over `driver`.
    pub fn new(driver: Arc<dyn DriverAdapter>) -> Self {
        Self { driver }
    }

    /// The schema name this accessor reads from.
    pub fn name(&self) -> &'static str {
        SYSTEM_DATABASE_NAME
    }

    /// Named time zones loaded into the server, if any.
    pub async fn time_zone_names(&self) -> Result<Vec<String>> {
        let result = self
            .driver
            .query(
                "SELECT Name FROM mysql.time_zone_name ORDER BY Name",
                ConnectionRole::User,
            )
            .await?;

        Ok(result
            .rows()
            .filter_map(|row| row.value_at(0).map(str::to_string))
            .collect())
    }

    /// `(user, host)` pairs of the server's accounts. Requires read access
    /// to the system schema.
    pub async fn user_accounts(&self) -> Result<Vec<(String, String)>> {
        let result = self
            .driver
            .query(
                "SELECT User, Host FROM mysql.user ORDER BY User, Host",
                ConnectionRole::User,
            )
            .await?;

        Ok(result
            .rows()
            .filter_map(|row| {
                let user = row.value("User")?.to_string();
                let host = row.value("Host")?.to_string();
                Some((user, host))
            })
            .collect())
    }
}
