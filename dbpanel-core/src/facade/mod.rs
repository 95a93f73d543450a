//! Database abstraction facade.
//!
//! Single point of truth for server interaction state: connection-role
//! routing, parsed server version and vendor flags, session-scoped caching
//! of expensive facts, and metadata retrieval that yields the same shape
//! whether the server exposes `information_schema` or only the legacy
//! `SHOW` commands.
//!
//! One facade serves one logical login session and is owned by that
//! session's context; share it behind an `Arc` within the session, never
//! across sessions. Tests construct facades directly over a
//! [`ScriptedDriver`](crate::driver::scripted::ScriptedDriver).

pub mod collation;
pub mod metadata;

use crate::cache::{
    KEY_CURRENT_USER, KEY_IS_AMAZON_RDS, KEY_LOWER_CASE_TABLE_NAMES, SessionCache,
};
use crate::config::{ServerConfig, SessionSettings};
use crate::driver::{
    ConnectionRole, DriverAdapter, ResultSet, Statement, quote_identifier, quote_string,
};
use crate::error::DbPanelError;
use crate::system::SystemDatabase;
use crate::version::{MIN_SUPPORTED_VERSION, ServerVersion, UTF8MB4_MIN_VERSION};
use crate::Result;
use collation::{is_valid_collation_name, resolve_connection_collation};
use metadata::{
    ColumnMetadata, DatabaseSortColumn, DatabaseStats, SortDirection, TableMetadata,
    natural_cmp, sort_database_stats,
};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

/// Path marker that identifies an Amazon RDS server's base directory.
const RDS_BASEDIR_MARKER: &str = "/rdsdbbin/";

/// Facade over the raw driver providing version detection, session caching
/// and uniform metadata retrieval.
pub struct DatabaseFacade {
    driver: Arc<dyn DriverAdapter>,
    config: ServerConfig,
    version: RwLock<Option<ServerVersion>>,
    cache: Mutex<SessionCache>,
    current_database: RwLock<Option<String>>,
    system_database: OnceLock<SystemDatabase>,
}

impl std::fmt::Debug for DatabaseFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseFacade")
            .field("config", &self.config)
            .field("version", &self.version_int())
            .finish_non_exhaustive()
    }
}

impl DatabaseFacade {
    /// Creates a facade over `driver`. The session context owns the facade;
    /// there is deliberately no process-wide instance.
    pub fn new(driver: Arc<dyn DriverAdapter>, config: ServerConfig) -> Self {
        Self {
            driver,
            config,
            version: RwLock::new(None),
            cache: Mutex::new(SessionCache::new()),
            current_database: RwLock::new(None),
            system_database: OnceLock::new(),
        }
    }

    /// The behavior configuration this facade was created with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Query plumbing
    // ------------------------------------------------------------------

    /// Runs `sql` on the connection for `role`.
    pub async fn query(&self, sql: &str, role: ConnectionRole) -> Result<ResultSet> {
        if self.config.debug_sql {
            tracing::debug!(%role, sql, "issuing statement");
        }
        self.driver.query(sql, role).await
    }

    /// Runs `sql`, turning a failed query into `None` instead of an error.
    pub async fn try_query(&self, sql: &str, role: ConnectionRole) -> Option<ResultSet> {
        self.query(sql, role).await.ok()
    }

    /// Runs `sql` on the control-user connection; failure is an error.
    pub async fn query_as_control_user(&self, sql: &str) -> Result<ResultSet> {
        self.query(sql, ConnectionRole::ControlUser).await
    }

    /// Runs `sql` on the control-user connection; failure is `None`.
    pub async fn try_query_as_control_user(&self, sql: &str) -> Option<ResultSet> {
        self.try_query(sql, ConnectionRole::ControlUser).await
    }

    /// Obtains a prepared-statement handle for `role`. Delegates to the
    /// driver exactly once; no retries at this layer.
    pub async fn prepare(&self, sql: &str, role: ConnectionRole) -> Result<Statement> {
        self.driver.prepare(sql, role).await
    }

    /// Fetches the first cell of the first result row.
    pub async fn fetch_value(&self, sql: &str, role: ConnectionRole) -> Result<Option<String>> {
        Ok(self.query(sql, role).await?.scalar().map(str::to_string))
    }

    /// Fetches the first result row keyed by column name.
    pub async fn fetch_single_row(
        &self,
        sql: &str,
        role: ConnectionRole,
    ) -> Result<Option<HashMap<String, Option<String>>>> {
        Ok(self.query(sql, role).await?.single_row())
    }

    /// Changes the active database. Only the user role's selection is
    /// tracked as "the current database" of the session.
    pub async fn select_db(&self, name: &str, role: ConnectionRole) -> Result<()> {
        self.driver.select_db(name, role).await?;
        if role == ConnectionRole::User {
            let mut current = self
                .current_database
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *current = (!name.is_empty()).then(|| name.to_string());
        }
        Ok(())
    }

    /// The database currently selected on the user connection, if any.
    pub fn current_database(&self) -> Option<String> {
        self.current_database
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ------------------------------------------------------------------
    // Connection lifecycle
    // ------------------------------------------------------------------

    /// Runs once after a connection is established: version detection,
    /// connection character set, optional session time zone.
    ///
    /// Every step fails soft. Some hosted servers restrict the version
    /// query; the version then stays unknown and dependent features keep
    /// their defaults.
    pub async fn post_connect(&self, session: &SessionSettings) {
        let version_row = self
            .try_query("SELECT @@version, @@version_comment", ConnectionRole::User)
            .await
            .and_then(|result| result.single_row());
        match version_row {
            Some(row) => self.set_version(&row),
            None => tracing::debug!("server version unavailable; keeping defaults"),
        }

        let charset = if self.version_int() >= UTF8MB4_MIN_VERSION {
            "utf8mb4"
        } else {
            "utf8"
        };
        let names = format!("SET NAMES '{0}' COLLATE '{0}_general_ci';", charset);
        if self.try_query(&names, ConnectionRole::User).await.is_none() {
            tracing::warn!("failed to set connection character set to {}", charset);
        }

        if !session.session_time_zone.is_empty() {
            let sql = format!(
                "SET time_zone = {};",
                quote_string(&session.session_time_zone)
            );
            if self.try_query(&sql, ConnectionRole::User).await.is_none() {
                tracing::warn!(
                    "failed to set session time zone {}",
                    session.session_time_zone
                );
            }
        }
    }

    /// Updates the version state from a row holding `@@version` and
    /// `@@version_comment`. A row without `@@version` changes nothing; a
    /// usable row replaces integer, raw string and vendor flavor together.
    pub fn set_version(&self, row: &HashMap<String, Option<String>>) {
        let version = match row.get("@@version") {
            Some(Some(version)) => version,
            _ => return,
        };
        let comment = match row.get("@@version_comment") {
            Some(Some(comment)) => comment.as_str(),
            _ => "",
        };

        let parsed = ServerVersion::from_version_row(version, comment);
        *self
            .version
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(parsed);
    }

    fn version_state(&self) -> Option<ServerVersion> {
        self.version
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Integer-encoded server version; 0 while unknown.
    pub fn version_int(&self) -> u32 {
        self.version_state().map_or(0, |v| v.version_int())
    }

    /// The version string as reported by the server; empty while unknown.
    pub fn version_string(&self) -> String {
        self.version_state().map_or_else(String::new, |v| v.raw().to_string())
    }

    /// Whether the server identified itself as MariaDB.
    pub fn is_mariadb(&self) -> bool {
        self.version_state()
            .is_some_and(|v| v.flavor() == crate::version::ServerFlavor::MariaDb)
    }

    /// Whether the server identified itself as Percona Server.
    pub fn is_percona(&self) -> bool {
        self.version_state()
            .is_some_and(|v| v.flavor() == crate::version::ServerFlavor::Percona)
    }

    /// Whether the known server version is below the supported minimum.
    pub fn is_upgrade_required(&self) -> bool {
        let version = self.version_int();
        version > 0 && version < MIN_SUPPORTED_VERSION
    }

    // ------------------------------------------------------------------
    // Session-cached server facts
    // ------------------------------------------------------------------

    fn cache_get(&self, key: &str) -> Option<Value> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn cache_set(&self, key: &str, value: Value) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set(key, value);
    }

    /// Removes one cached fact, forcing its next read to re-query.
    pub fn invalidate_cached(&self, key: &str) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    async fn cached_current_user(&self) -> Option<String> {
        match self.cache_get(KEY_CURRENT_USER) {
            Some(Value::String(user)) => return Some(user),
            // A cached null records "queried and got nothing"; do not ask again.
            Some(Value::Null) => return None,
            _ => {}
        }

        let user = self
            .try_query("SELECT CURRENT_USER();", ConnectionRole::User)
            .await
            .and_then(|result| result.scalar().map(str::to_string));

        match user {
            Some(user) => {
                self.cache_set(KEY_CURRENT_USER, json!(user));
                Some(user)
            }
            None => {
                self.cache_set(KEY_CURRENT_USER, Value::Null);
                None
            }
        }
    }

    /// The `user@host` identity of the logged-in user; `"@"` when the
    /// server would not say.
    pub async fn current_user(&self) -> String {
        self.cached_current_user()
            .await
            .unwrap_or_else(|| "@".to_string())
    }

    /// The current identity split into `(user, host)` on the first `@`.
    /// Both parts are empty when the identity is unknown or malformed.
    pub async fn current_user_and_host(&self) -> (String, String) {
        match self.cached_current_user().await {
            Some(identity) => identity
                .split_once('@')
                .map(|(user, host)| (user.to_string(), host.to_string()))
                .unwrap_or_default(),
            None => (String::new(), String::new()),
        }
    }

    /// Whether the server runs on Amazon RDS, detected from its base
    /// directory path. Cached after the first query.
    pub async fn is_amazon_rds(&self) -> bool {
        if let Some(value) = self.cache_get(KEY_IS_AMAZON_RDS) {
            return value.as_bool().unwrap_or(false);
        }

        let basedir = self
            .try_query("SELECT @@basedir", ConnectionRole::User)
            .await
            .and_then(|result| result.scalar().map(str::to_string));
        let is_rds = basedir.is_some_and(|dir| dir.contains(RDS_BASEDIR_MARKER));

        self.cache_set(KEY_IS_AMAZON_RDS, json!(is_rds));
        is_rds
    }

    /// The server's identifier case-folding mode: 0, 1 or 2. Anything the
    /// server reports outside that range, or a failed query, is 0.
    pub async fn lower_case_table_names(&self) -> u8 {
        if let Some(value) = self.cache_get(KEY_LOWER_CASE_TABLE_NAMES) {
            return value.as_u64().map_or(0, |v| v.min(2) as u8);
        }

        let mode = self
            .try_query("SELECT @@lower_case_table_names", ConnectionRole::User)
            .await
            .and_then(|result| result.scalar().map(str::to_string))
            .and_then(|value| value.parse::<u8>().ok())
            .filter(|mode| *mode <= 2)
            .unwrap_or(0);

        self.cache_set(KEY_LOWER_CASE_TABLE_NAMES, json!(mode));
        mode
    }

    // ------------------------------------------------------------------
    // Collations
    // ------------------------------------------------------------------

    /// Default collation of one database. With the catalog disabled this
    /// selects the target database and reads `@@collation_database`,
    /// restoring the previous selection afterwards; the value is identical
    /// on both paths for the same underlying data.
    pub async fn db_collation(&self, database: &str) -> Result<String> {
        if !self.config.disable_is {
            let sql = format!(
                "SELECT DEFAULT_COLLATION_NAME FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = {}",
                quote_string(database)
            );
            return self
                .fetch_value(&sql, ConnectionRole::User)
                .await?
                .ok_or_else(|| {
                    DbPanelError::query_failed(format!("no collation for database {}", database))
                });
        }

        let previous = self.current_database();
        self.select_db(database, ConnectionRole::User).await?;
        let collation = self
            .fetch_value("SELECT @@collation_database", ConnectionRole::User)
            .await?;
        if previous.as_deref() != Some(database) {
            self.select_db(previous.as_deref().unwrap_or(""), ConnectionRole::User)
                .await?;
        }

        collation.ok_or_else(|| {
            DbPanelError::query_failed(format!("no collation for database {}", database))
        })
    }

    /// The server-wide default collation.
    pub async fn server_collation(&self) -> Result<String> {
        self.fetch_value("SELECT @@collation_server", ConnectionRole::User)
            .await?
            .ok_or_else(|| DbPanelError::query_failed("no server collation reported"))
    }

    /// Sets the connection collation, substituting a compatible name on
    /// servers too old for the requested character set.
    pub async fn set_collation(&self, collation: &str) -> Result<()> {
        if !is_valid_collation_name(collation) {
            return Err(DbPanelError::configuration(format!(
                "Invalid collation name: {}",
                collation
            )));
        }

        let resolved = resolve_connection_collation(self.version_int(), collation);
        let sql = format!("SET collation_connection = '{}';", resolved);
        self.query(&sql, ConnectionRole::User).await.map(|_| ())
    }

    // ------------------------------------------------------------------
    // Metadata retrieval
    // ------------------------------------------------------------------

    /// Full metadata of every table in `database`, keyed by table name
    /// exactly as returned by the server.
    pub async fn get_tables_full(
        &self,
        database: &str,
    ) -> Result<BTreeMap<String, TableMetadata>> {
        let tables = if self.config.disable_is {
            let sql = format!("SHOW TABLE STATUS FROM {}", quote_identifier(database));
            let result = self.query(&sql, ConnectionRole::User).await?;
            result
                .rows()
                .filter_map(|row| TableMetadata::from_status_row(database, &row))
                .map(|table| (table.name.clone(), table))
                .collect()
        } else {
            let sql = build_tables_full_query(database);
            let result = self.query(&sql, ConnectionRole::User).await?;
            result
                .rows()
                .filter_map(|row| TableMetadata::from_information_schema_row(&row))
                .map(|table| (table.name.clone(), table))
                .collect()
        };

        Ok(tables)
    }

    /// Plain table-name listing for `database`, ordered per configuration.
    pub async fn get_tables(&self, database: &str) -> Result<Vec<String>> {
        let sql = format!("SHOW TABLES FROM {}", quote_identifier(database));
        let result = self.query(&sql, ConnectionRole::User).await?;

        let mut names: Vec<String> = result
            .rows()
            .filter_map(|row| row.value_at(0).map(str::to_string))
            .collect();
        if self.config.natural_order {
            names.sort_by(|a, b| natural_cmp(a, b));
        } else {
            names.sort();
        }

        Ok(names)
    }

    /// Column descriptions of one table via `SHOW FULL COLUMNS`.
    pub async fn get_columns(&self, database: &str, table: &str) -> Result<Vec<ColumnMetadata>> {
        let sql = format!(
            "SHOW FULL COLUMNS FROM {}.{}",
            quote_identifier(database),
            quote_identifier(table)
        );
        let result = self.query(&sql, ConnectionRole::User).await?;

        Ok(result
            .rows()
            .filter_map(|row| ColumnMetadata::from_show_columns_row(&row))
            .collect())
    }

    /// Aggregate metadata of every accessible database, ordered by the
    /// requested column and direction.
    ///
    /// With the catalog enabled this is a single aggregate query; with the
    /// catalog disabled the aggregates are computed from each database's
    /// `SHOW TABLE STATUS` rows. Numeric columns sort numerically; equal
    /// values order by schema name ascending.
    #[allow(clippy::too_many_arguments)]
    pub async fn get_databases_full(
        &self,
        like_pattern: Option<&str>,
        apply_limits: bool,
        role: ConnectionRole,
        sort_by: DatabaseSortColumn,
        sort_order: SortDirection,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<DatabaseStats>> {
        if !self.config.disable_is {
            let sql =
                build_databases_full_query(like_pattern, apply_limits, sort_by, sort_order, offset, limit);
            let result = self.query(&sql, role).await?;
            return Ok(result
                .rows()
                .filter_map(|row| DatabaseStats::from_information_schema_row(&row))
                .collect());
        }

        let sql = match like_pattern {
            Some(pattern) => format!("SHOW DATABASES LIKE {}", quote_string(pattern)),
            None => "SHOW DATABASES".to_string(),
        };
        let result = self.query(&sql, role).await?;
        let names: Vec<String> = result
            .rows()
            .filter_map(|row| row.value_at(0).map(str::to_string))
            .collect();

        let mut stats = Vec::with_capacity(names.len());
        for name in &names {
            let collation = self.db_collation(name).await.ok();
            let tables = self.get_tables_full(name).await?;
            stats.push(DatabaseStats::from_tables(name, collation, tables.values()));
        }

        sort_database_stats(&mut stats, sort_by, sort_order, self.config.natural_order);

        if apply_limits {
            stats = stats.into_iter().skip(offset).take(limit).collect();
        }

        Ok(stats)
    }

    // ------------------------------------------------------------------
    // System database
    // ------------------------------------------------------------------

    /// Accessor for the server's system schema, bound to this facade's
    /// driver. Lazily constructed; repeated calls return the same accessor.
    pub fn get_system_database(&self) -> &SystemDatabase {
        self.system_database
            .get_or_init(|| SystemDatabase::new(Arc::clone(&self.driver)))
    }
}

/// Catalog query behind [`DatabaseFacade::get_tables_full`].
fn build_tables_full_query(database: &str) -> String {
    format!(
        "SELECT TABLE_SCHEMA, TABLE_NAME, TABLE_TYPE, ENGINE, VERSION, ROW_FORMAT, \
         TABLE_ROWS, AVG_ROW_LENGTH, DATA_LENGTH, MAX_DATA_LENGTH, INDEX_LENGTH, \
         DATA_FREE, AUTO_INCREMENT, CREATE_TIME, UPDATE_TIME, CHECK_TIME, \
         TABLE_COLLATION, CHECKSUM, CREATE_OPTIONS, TABLE_COMMENT \
         FROM information_schema.TABLES WHERE TABLE_SCHEMA = {} ORDER BY TABLE_NAME",
        quote_string(database)
    )
}

/// Catalog aggregate behind [`DatabaseFacade::get_databases_full`].
fn build_databases_full_query(
    like_pattern: Option<&str>,
    apply_limits: bool,
    sort_by: DatabaseSortColumn,
    sort_order: SortDirection,
    offset: usize,
    limit: usize,
) -> String {
    let mut sql = String::from(
        "SELECT s.SCHEMA_NAME, s.DEFAULT_COLLATION_NAME, \
         COUNT(t.TABLE_SCHEMA) AS SCHEMA_TABLES, \
         SUM(t.TABLE_ROWS) AS SCHEMA_TABLE_ROWS, \
         SUM(t.DATA_LENGTH) AS SCHEMA_DATA_LENGTH, \
         SUM(t.MAX_DATA_LENGTH) AS SCHEMA_MAX_DATA_LENGTH, \
         SUM(t.INDEX_LENGTH) AS SCHEMA_INDEX_LENGTH, \
         SUM(t.DATA_LENGTH + t.INDEX_LENGTH) AS SCHEMA_LENGTH, \
         SUM(t.DATA_FREE) AS SCHEMA_DATA_FREE \
         FROM information_schema.SCHEMATA s \
         LEFT JOIN information_schema.TABLES t ON t.TABLE_SCHEMA = s.SCHEMA_NAME",
    );

    if let Some(pattern) = like_pattern {
        sql.push_str(&format!(" WHERE s.SCHEMA_NAME LIKE {}", quote_string(pattern)));
    }

    sql.push_str(" GROUP BY s.SCHEMA_NAME, s.DEFAULT_COLLATION_NAME");
    sql.push_str(&format!(
        " ORDER BY {} {}, s.SCHEMA_NAME ASC",
        sort_by.sql_name(),
        sort_order.sql_keyword()
    ));

    if apply_limits {
        sql.push_str(&format!(" LIMIT {}, {}", offset, limit));
    }

    sql
}
