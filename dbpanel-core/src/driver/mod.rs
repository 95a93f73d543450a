//! Driver adapter abstraction over raw server connections.
//!
//! The facade never talks to a wire protocol directly; it issues SQL text
//! through a [`DriverAdapter`] and consumes uniform [`ResultSet`] values.
//! Two implementations ship with the crate:
//!
//! - [`mysql::MySqlDriver`]: sqlx-backed pools, one per connection role
//! - [`scripted::ScriptedDriver`]: deterministic expectation queue for tests
//!
//! A failed query is an `Err`, never a panic; whether that failure is fatal
//! is decided by the caller (see the facade's `try_` query variants).

pub mod mysql;
pub mod scripted;

use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Which underlying credential/connection context a statement executes under.
///
/// A statement's effective privileges and session state are fully determined
/// by its role; roles never share connections or session-scoped state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionRole {
    /// The logged-in user's own connection and privileges
    User,
    /// The configuration-storage connection, typically more privileged
    ControlUser,
    /// Side connections, e.g. for background checks
    Auxiliary,
}

impl std::fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionRole::User => write!(f, "user"),
            ConnectionRole::ControlUser => write!(f, "control user"),
            ConnectionRole::Auxiliary => write!(f, "auxiliary"),
        }
    }
}

/// Metadata of one result-set field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Column name as labelled in the result
    pub name: String,
    /// Server-side type name, when the driver exposes one
    pub type_name: Option<String>,
}

impl FieldMeta {
    /// Field metadata carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
        }
    }
}

/// Tabular query result with all cells carried as optional strings.
///
/// The facade's consumers are metadata operations and a web UI; both work on
/// the server's textual representation, so cells are `Option<String>` with
/// `None` standing for SQL NULL.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    fields: Vec<FieldMeta>,
    rows: Vec<Vec<Option<String>>>,
}

impl ResultSet {
    /// Builds a result set. Row widths must match the field count.
    pub fn new(fields: Vec<FieldMeta>, rows: Vec<Vec<Option<String>>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == fields.len()));
        Self { fields, rows }
    }

    /// An empty result, as produced by statements like `SET`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Field metadata for the result columns.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first cell of the first row, for single-value queries.
    pub fn scalar(&self) -> Option<&str> {
        self.rows.first().and_then(|row| row.first()).and_then(|cell| cell.as_deref())
    }

    /// The first row keyed by column name, for single-row queries.
    pub fn single_row(&self) -> Option<HashMap<String, Option<String>>> {
        self.rows.first().map(|row| {
            self.fields
                .iter()
                .zip(row.iter())
                .map(|(field, cell)| (field.name.clone(), cell.clone()))
                .collect()
        })
    }

    /// Iterates rows as name-addressable views.
    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |values| RowView {
            fields: &self.fields,
            values,
        })
    }
}

/// Borrowed view of one result row with access by column name.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    fields: &'a [FieldMeta],
    values: &'a [Option<String>],
}

impl<'a> RowView<'a> {
    /// Non-null value of the named column; `None` when the column is absent
    /// or its value is NULL.
    pub fn value(&self, name: &str) -> Option<&'a str> {
        self.raw(name).flatten()
    }

    /// Value of the named column, distinguishing a missing column (outer
    /// `None`) from a NULL value (inner `None`).
    pub fn raw(&self, name: &str) -> Option<Option<&'a str>> {
        self.fields
            .iter()
            .position(|field| field.name == name)
            .map(|i| self.values[i].as_deref())
    }

    /// Value by position.
    pub fn value_at(&self, index: usize) -> Option<&'a str> {
        self.values.get(index).and_then(|cell| cell.as_deref())
    }
}

/// Handle to a statement the driver has accepted for later execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    role: ConnectionRole,
}

impl Statement {
    /// Creates a statement handle. Drivers construct these after the server
    /// has accepted the statement text.
    pub fn new(sql: impl Into<String>, role: ConnectionRole) -> Self {
        Self {
            sql: sql.into(),
            role,
        }
    }

    /// The statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The role the statement is bound to.
    pub fn role(&self) -> ConnectionRole {
        self.role
    }
}

/// Executes raw statements against the server and returns tabular results.
///
/// Implementations must not retry: failures propagate immediately and any
/// retry/backoff policy belongs to a higher layer.
#[async_trait]
pub trait DriverAdapter: Send + Sync {
    /// Runs `sql` on the connection for `role`. An `Err` means the query
    /// failed; statements without a result set return an empty [`ResultSet`].
    async fn query(&self, sql: &str, role: ConnectionRole) -> Result<ResultSet>;

    /// Asks the server to accept `sql` as a prepared statement, exactly once
    /// per call.
    async fn prepare(&self, sql: &str, role: ConnectionRole) -> Result<Statement>;

    /// Changes the active database for `role`. An empty name is a no-op.
    async fn select_db(&self, name: &str, role: ConnectionRole) -> Result<()>;
}

/// Quotes an identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quotes a string literal with single quotes, doubling embedded quotes and
/// escaping backslashes.
pub fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}
