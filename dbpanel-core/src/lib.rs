//! Database abstraction core for the dbpanel web administration tool.
//!
//! The crate's centerpiece is the [`facade::DatabaseFacade`]: a single
//! connection-role-aware entry point over one or more underlying server
//! connections. It owns version detection and vendor classification,
//! session-scoped caching of expensive server facts, collation resolution,
//! and metadata retrieval that produces one uniform shape whether the
//! server exposes an `information_schema` catalog or only legacy `SHOW`
//! commands.
//!
//! # Architecture
//! - [`driver`] executes raw statements per connection role and returns
//!   uniform tabular results; the facade never touches a wire protocol.
//! - [`version`] parses server version strings into comparable integers
//!   and vendor flags.
//! - [`cache`] memoizes per-session facts until explicitly invalidated.
//! - [`facade::metadata`] holds the strongly-typed metadata records and
//!   produces the dual-keyed legacy row views at the serialization
//!   boundary.
//!
//! One facade serves one logical login session; construct it explicitly in
//! the session context instead of reaching for a global instance.

pub mod cache;
pub mod config;
pub mod driver;
pub mod error;
pub mod facade;
pub mod logging;
pub mod system;
pub mod version;

// Re-export commonly used types
pub use cache::SessionCache;
pub use config::{ConnectionConfig, ServerConfig, SessionSettings};
pub use driver::{ConnectionRole, DriverAdapter, FieldMeta, ResultSet, Statement};
pub use error::{DbPanelError, Result, format_error, redact_database_url};
pub use facade::DatabaseFacade;
pub use facade::metadata::{
    ColumnMetadata, DatabaseSortColumn, DatabaseStats, SortDirection, TableMetadata,
};
pub use logging::init_logging;
pub use system::SystemDatabase;
pub use version::{MIN_SUPPORTED_VERSION, ServerFlavor, ServerVersion, version_to_int};
