//! Connection collation resolution.
//!
//! Old servers do not understand every character set newer clients ask for;
//! the substitution table below maps a requested collation onto one the
//! server's version can accept. The rule is version-gated, not name-gated:
//! the same requested name resolves differently depending on the cached
//! server version integer.

use crate::version::UTF8MB4_MIN_VERSION;
use regex::Regex;
use std::sync::OnceLock;

/// `(min_version_int, prefix, fallback_prefix)`: below `min_version_int`, a
/// collation starting with `prefix` is issued with `fallback_prefix` instead.
const COLLATION_FALLBACKS: &[(u32, &str, &str)] = &[(UTF8MB4_MIN_VERSION, "utf8mb4_", "utf8_")];

/// Resolves the collation name to issue for a server at `version_int`.
pub fn resolve_connection_collation(version_int: u32, name: &str) -> String {
    for &(min_version, prefix, fallback) in COLLATION_FALLBACKS {
        if version_int < min_version {
            if let Some(rest) = name.strip_prefix(prefix) {
                return format!("{}{}", fallback, rest);
            }
        }
    }
    name.to_string()
}

/// Whether `name` has the shape of a collation identifier. Collation names
/// are interpolated into `SET` statements, so anything outside the
/// identifier alphabet is rejected before it reaches the server.
pub fn is_valid_collation_name(name: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new("^[A-Za-z0-9_]+$").unwrap_or_else(|_| unreachable!("static pattern compiles"))
    });
    pattern.is_match(name)
}
