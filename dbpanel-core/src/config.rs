//! Configuration types for the facade and its connections.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Behavior flags for metadata retrieval and diagnostics.
///
/// `disable_is` switches every metadata operation from the server's
/// `information_schema` catalog to the legacy `SHOW` commands; some hosted
/// servers make the catalog unusably slow or restrict it outright.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Use legacy `SHOW` commands instead of `information_schema`
    pub disable_is: bool,
    /// Sort object names naturally (`a2` before `a10`)
    pub natural_order: bool,
    /// Log every issued statement at debug level
    pub debug_sql: bool,
}

/// Per-session settings applied right after a connection is established.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Time zone to apply to the session; empty means "do not set"
    pub session_time_zone: String,
}

impl SessionSettings {
    /// Session settings with the given time zone.
    pub fn with_time_zone(time_zone: impl Into<String>) -> Self {
        Self {
            session_time_zone: time_zone.into(),
        }
    }
}

/// Configuration for one database connection.
///
/// This struct intentionally does NOT store passwords; credentials stay in
/// the connection URL and are never logged or serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host address
    pub host: String,
    /// Optional port number
    pub port: Option<u16>,
    /// Optional database name
    pub database: Option<String>,
    /// Optional username (password handled separately)
    pub username: Option<String>,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Query timeout duration
    pub query_timeout: Duration,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: None,
            database: None,
            username: None,
            connect_timeout: Duration::from_secs(30),
            query_timeout: Duration::from_secs(30),
            max_connections: 10,
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ConnectionConfig({}{}{})",
            self.host,
            self.port.map_or_else(String::new, |p| format!(":{}", p)),
            self.database
                .as_ref()
                .map_or_else(String::new, |db| format!("/{}", db))
        )
        // Intentionally omit username and never include credentials
    }
}

impl ConnectionConfig {
    /// Creates a new connection config with safe defaults.
    pub fn new(host: String) -> Self {
        Self {
            host,
            ..Default::default()
        }
    }

    /// Builder method to set port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builder method to set database.
    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    /// Builder method to set username.
    pub fn with_username(mut self, username: String) -> Self {
        self.username = Some(username);
        self
    }

    /// Validates connection configuration parameters.
    ///
    /// # Errors
    /// Returns error if configuration values are invalid or unsafe
    pub fn validate(&self) -> crate::Result<()> {
        if self.host.is_empty() {
            return Err(crate::error::DbPanelError::configuration(
                "host cannot be empty",
            ));
        }

        if let Some(port) = self.port {
            if port == 0 {
                return Err(crate::error::DbPanelError::configuration(
                    "port must be greater than 0",
                ));
            }
        }

        if self.max_connections == 0 {
            return Err(crate::error::DbPanelError::configuration(
                "max_connections must be greater than 0",
            ));
        }

        if self.max_connections > 100 {
            return Err(crate::error::DbPanelError::configuration(
                "max_connections should not exceed 100 for safety",
            ));
        }

        if self.connect_timeout.as_secs() == 0 {
            return Err(crate::error::DbPanelError::configuration(
                "connect_timeout must be greater than 0",
            ));
        }

        if self.query_timeout.as_secs() == 0 {
            return Err(crate::error::DbPanelError::configuration(
                "query_timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}
