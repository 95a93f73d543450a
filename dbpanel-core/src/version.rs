//! Server version parsing and vendor detection.
//!
//! Version strings reported by MySQL-family servers come in shapes like
//! `5.6.35`, `10.1.22-MariaDB-1:10.1.22+maria~jessie` or `5.05.01`. The
//! parser extracts the leading numeric dot-groups and encodes them into a
//! single comparable integer; vendor detection is a separate pass over the
//! version string and the server's version comment.

/// Minimum server version the tool fully supports, encoded as
/// `major * 10000 + minor * 100 + patch`. Anything older is flagged as
/// requiring a server upgrade.
pub const MIN_SUPPORTED_VERSION: u32 = 50500;

/// Version integer threshold at which the server understands the `utf8mb4`
/// character set.
pub const UTF8MB4_MIN_VERSION: u32 = 50504;

/// Server distribution detected from version metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerFlavor {
    /// Vanilla MySQL (or anything without a recognized vendor marker)
    #[default]
    MySql,
    /// MariaDB fork
    MariaDb,
    /// Percona Server
    Percona,
}

impl std::fmt::Display for ServerFlavor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerFlavor::MySql => write!(f, "MySQL"),
            ServerFlavor::MariaDb => write!(f, "MariaDB"),
            ServerFlavor::Percona => write!(f, "Percona Server"),
        }
    }
}

/// Parsed server version: the original string, its integer encoding and the
/// detected distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVersion {
    raw: String,
    version_int: u32,
    flavor: ServerFlavor,
}

impl ServerVersion {
    /// Builds a version from the values of `@@version` and
    /// `@@version_comment`.
    pub fn from_version_row(version: &str, version_comment: &str) -> Self {
        Self {
            raw: version.to_string(),
            version_int: version_to_int(version),
            flavor: detect_flavor(version, version_comment),
        }
    }

    /// The version string exactly as the server reported it.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Integer encoding, `major * 10000 + minor * 100 + patch`.
    pub fn version_int(&self) -> u32 {
        self.version_int
    }

    /// Major version component.
    pub fn major(&self) -> u32 {
        self.version_int / 10000
    }

    /// Detected server distribution.
    pub fn flavor(&self) -> ServerFlavor {
        self.flavor
    }

    /// Whether the server is older than [`MIN_SUPPORTED_VERSION`].
    pub fn requires_upgrade(&self) -> bool {
        self.version_int < MIN_SUPPORTED_VERSION
    }
}

/// Encodes a dotted version string as `major * 10000 + minor * 100 + patch`.
///
/// Up to three dot-groups are considered; each group contributes the integer
/// value of its leading decimal digits, so suffixes like `22-MariaDB-1:...`
/// count as `22`. Missing groups are zero, not a parse failure: `"5.0"`
/// encodes as `50000`.
pub fn version_to_int(version: &str) -> u32 {
    let mut parts = version.split('.').map(leading_u32);
    let major = parts.next().unwrap_or(0);
    let minor = parts.next().unwrap_or(0);
    let patch = parts.next().unwrap_or(0);
    major * 10000 + minor * 100 + patch
}

/// Integer value of the leading decimal digits of a version group.
fn leading_u32(group: &str) -> u32 {
    let digits: String = group.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Detects the server distribution from the version string and the version
/// comment. Both strings are searched for the case-sensitive vendor markers;
/// a string without either marker is vanilla MySQL.
pub fn detect_flavor(version: &str, version_comment: &str) -> ServerFlavor {
    if version.contains("MariaDB") || version_comment.contains("MariaDB") {
        ServerFlavor::MariaDb
    } else if version.contains("Percona") || version_comment.contains("Percona") {
        ServerFlavor::Percona
    } else {
        ServerFlavor::MySql
    }
}
