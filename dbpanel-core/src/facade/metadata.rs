//! Typed metadata records and their legacy row views.
//!
//! Table and database metadata reaches the facade in two shapes: canonical
//! uppercase columns from `information_schema`, or the mixed-case columns of
//! the legacy `SHOW` commands. Both normalize into one strongly-typed record
//! here; the loose dual-keyed maps that downstream page code consumes exist
//! only at the serialization boundary ([`TableMetadata::combined_row`]),
//! where every value is present under BOTH naming conventions.

use crate::driver::RowView;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Full metadata of one table, normalized from either metadata source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableMetadata {
    /// Database the table lives in
    pub schema: String,
    /// Table name exactly as returned by the server
    pub name: String,
    /// `BASE TABLE`, `VIEW`, `SYSTEM VIEW`
    pub table_type: String,
    pub engine: Option<String>,
    pub version: Option<String>,
    pub row_format: Option<String>,
    pub rows: Option<u64>,
    pub avg_row_length: Option<u64>,
    pub data_length: Option<u64>,
    pub max_data_length: Option<u64>,
    pub index_length: Option<u64>,
    pub data_free: Option<u64>,
    pub auto_increment: Option<u64>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
    pub check_time: Option<String>,
    pub collation: Option<String>,
    pub checksum: Option<String>,
    pub create_options: Option<String>,
    pub comment: Option<String>,
    /// MariaDB extensions, carried through when the server reports them
    pub max_index_length: Option<u64>,
    pub temporary: Option<String>,
}

fn parse_u64(value: Option<&str>) -> Option<u64> {
    value.and_then(|v| v.parse().ok())
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

impl TableMetadata {
    /// Normalizes one `SHOW TABLE STATUS` row. Returns `None` for rows
    /// without a name, which the server does not produce in practice.
    pub fn from_status_row(schema: &str, row: &RowView<'_>) -> Option<Self> {
        let name = row.value("Name")?.to_string();

        // Very old servers report the engine under `Type`.
        let engine = owned(row.value("Engine").or_else(|| row.value("Type")));

        Some(Self {
            schema: schema.to_string(),
            name,
            table_type: "BASE TABLE".to_string(),
            engine,
            version: owned(row.value("Version")),
            row_format: owned(row.value("Row_format")),
            rows: parse_u64(row.value("Rows")),
            avg_row_length: parse_u64(row.value("Avg_row_length")),
            data_length: parse_u64(row.value("Data_length")),
            max_data_length: parse_u64(row.value("Max_data_length")),
            index_length: parse_u64(row.value("Index_length")),
            data_free: parse_u64(row.value("Data_free")),
            auto_increment: parse_u64(row.value("Auto_increment")),
            create_time: owned(row.value("Create_time")),
            update_time: owned(row.value("Update_time")),
            check_time: owned(row.value("Check_time")),
            collation: owned(row.value("Collation")),
            checksum: owned(row.value("Checksum")),
            create_options: owned(row.value("Create_options")),
            comment: owned(row.value("Comment")),
            max_index_length: parse_u64(row.value("Max_index_length")),
            temporary: owned(row.value("Temporary")),
        })
    }

    /// Normalizes one `information_schema.TABLES` row.
    pub fn from_information_schema_row(row: &RowView<'_>) -> Option<Self> {
        let name = row.value("TABLE_NAME")?.to_string();

        Some(Self {
            schema: row.value("TABLE_SCHEMA").unwrap_or_default().to_string(),
            name,
            table_type: row
                .value("TABLE_TYPE")
                .unwrap_or("BASE TABLE")
                .to_string(),
            engine: owned(row.value("ENGINE")),
            version: owned(row.value("VERSION")),
            row_format: owned(row.value("ROW_FORMAT")),
            rows: parse_u64(row.value("TABLE_ROWS")),
            avg_row_length: parse_u64(row.value("AVG_ROW_LENGTH")),
            data_length: parse_u64(row.value("DATA_LENGTH")),
            max_data_length: parse_u64(row.value("MAX_DATA_LENGTH")),
            index_length: parse_u64(row.value("INDEX_LENGTH")),
            data_free: parse_u64(row.value("DATA_FREE")),
            auto_increment: parse_u64(row.value("AUTO_INCREMENT")),
            create_time: owned(row.value("CREATE_TIME")),
            update_time: owned(row.value("UPDATE_TIME")),
            check_time: owned(row.value("CHECK_TIME")),
            collation: owned(row.value("TABLE_COLLATION")),
            checksum: owned(row.value("CHECKSUM")),
            create_options: owned(row.value("CREATE_OPTIONS")),
            comment: owned(row.value("TABLE_COMMENT")),
            max_index_length: parse_u64(row.value("MAX_INDEX_LENGTH")),
            temporary: owned(row.value("TEMPORARY")),
        })
    }

    fn u64_cell(value: Option<u64>) -> Option<String> {
        value.map(|v| v.to_string())
    }

    /// Row view with the canonical `information_schema` column names.
    pub fn canonical_row(&self) -> BTreeMap<String, Option<String>> {
        let mut row = BTreeMap::new();
        row.insert("TABLE_SCHEMA".into(), Some(self.schema.clone()));
        row.insert("TABLE_NAME".into(), Some(self.name.clone()));
        row.insert("TABLE_TYPE".into(), Some(self.table_type.clone()));
        row.insert("ENGINE".into(), self.engine.clone());
        row.insert("VERSION".into(), self.version.clone());
        row.insert("ROW_FORMAT".into(), self.row_format.clone());
        row.insert("TABLE_ROWS".into(), Self::u64_cell(self.rows));
        row.insert("AVG_ROW_LENGTH".into(), Self::u64_cell(self.avg_row_length));
        row.insert("DATA_LENGTH".into(), Self::u64_cell(self.data_length));
        row.insert("MAX_DATA_LENGTH".into(), Self::u64_cell(self.max_data_length));
        row.insert("INDEX_LENGTH".into(), Self::u64_cell(self.index_length));
        row.insert("DATA_FREE".into(), Self::u64_cell(self.data_free));
        row.insert("AUTO_INCREMENT".into(), Self::u64_cell(self.auto_increment));
        row.insert("CREATE_TIME".into(), self.create_time.clone());
        row.insert("UPDATE_TIME".into(), self.update_time.clone());
        row.insert("CHECK_TIME".into(), self.check_time.clone());
        row.insert("TABLE_COLLATION".into(), self.collation.clone());
        row.insert("CHECKSUM".into(), self.checksum.clone());
        row.insert("CREATE_OPTIONS".into(), self.create_options.clone());
        row.insert("TABLE_COMMENT".into(), self.comment.clone());
        if self.max_index_length.is_some() {
            row.insert("MAX_INDEX_LENGTH".into(), Self::u64_cell(self.max_index_length));
        }
        if self.temporary.is_some() {
            row.insert("TEMPORARY".into(), self.temporary.clone());
        }
        row
    }

    /// Row view with the legacy `SHOW TABLE STATUS` column names.
    pub fn legacy_row(&self) -> BTreeMap<String, Option<String>> {
        let mut row = BTreeMap::new();
        row.insert("Db".into(), Some(self.schema.clone()));
        row.insert("Name".into(), Some(self.name.clone()));
        row.insert("Engine".into(), self.engine.clone());
        // `Type` predates `Engine` and mirrors it for old page code.
        row.insert("Type".into(), self.engine.clone());
        row.insert("Version".into(), self.version.clone());
        row.insert("Row_format".into(), self.row_format.clone());
        row.insert("Rows".into(), Self::u64_cell(self.rows));
        row.insert("Avg_row_length".into(), Self::u64_cell(self.avg_row_length));
        row.insert("Data_length".into(), Self::u64_cell(self.data_length));
        row.insert("Max_data_length".into(), Self::u64_cell(self.max_data_length));
        row.insert("Index_length".into(), Self::u64_cell(self.index_length));
        row.insert("Data_free".into(), Self::u64_cell(self.data_free));
        row.insert("Auto_increment".into(), Self::u64_cell(self.auto_increment));
        row.insert("Create_time".into(), self.create_time.clone());
        row.insert("Update_time".into(), self.update_time.clone());
        row.insert("Check_time".into(), self.check_time.clone());
        row.insert("Collation".into(), self.collation.clone());
        row.insert("Checksum".into(), self.checksum.clone());
        row.insert("Create_options".into(), self.create_options.clone());
        row.insert("Comment".into(), self.comment.clone());
        if self.max_index_length.is_some() {
            row.insert("Max_index_length".into(), Self::u64_cell(self.max_index_length));
        }
        if self.temporary.is_some() {
            row.insert("Temporary".into(), self.temporary.clone());
        }
        row
    }

    /// Row view carrying BOTH key conventions with identical values, the
    /// shape consumed by page code written against either naming.
    pub fn combined_row(&self) -> BTreeMap<String, Option<String>> {
        let mut row = self.canonical_row();
        row.extend(self.legacy_row());
        row
    }
}

/// Aggregate metadata of one database.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatabaseStats {
    pub schema_name: String,
    pub default_collation_name: Option<String>,
    pub schema_tables: u64,
    pub schema_table_rows: u64,
    pub schema_data_length: u64,
    pub schema_max_data_length: u64,
    pub schema_index_length: u64,
    /// Data plus index length
    pub schema_length: u64,
    pub schema_data_free: u64,
}

impl DatabaseStats {
    /// Normalizes one row of the aggregate `information_schema` query.
    pub fn from_information_schema_row(row: &RowView<'_>) -> Option<Self> {
        let schema_name = row.value("SCHEMA_NAME")?.to_string();
        let get = |name: &str| parse_u64(row.value(name)).unwrap_or(0);

        Some(Self {
            schema_name,
            default_collation_name: owned(row.value("DEFAULT_COLLATION_NAME")),
            schema_tables: get("SCHEMA_TABLES"),
            schema_table_rows: get("SCHEMA_TABLE_ROWS"),
            schema_data_length: get("SCHEMA_DATA_LENGTH"),
            schema_max_data_length: get("SCHEMA_MAX_DATA_LENGTH"),
            schema_index_length: get("SCHEMA_INDEX_LENGTH"),
            schema_length: get("SCHEMA_LENGTH"),
            schema_data_free: get("SCHEMA_DATA_FREE"),
        })
    }

    /// Folds a database's table metadata into the aggregate shape. Used on
    /// servers where the catalog is disabled and the per-table rows come
    /// from `SHOW TABLE STATUS`.
    pub fn from_tables<'a>(
        schema_name: &str,
        default_collation_name: Option<String>,
        tables: impl IntoIterator<Item = &'a TableMetadata>,
    ) -> Self {
        let mut stats = Self {
            schema_name: schema_name.to_string(),
            default_collation_name,
            ..Default::default()
        };

        for table in tables {
            stats.schema_tables += 1;
            stats.schema_table_rows += table.rows.unwrap_or(0);
            stats.schema_data_length += table.data_length.unwrap_or(0);
            stats.schema_max_data_length += table.max_data_length.unwrap_or(0);
            stats.schema_index_length += table.index_length.unwrap_or(0);
            stats.schema_data_free += table.data_free.unwrap_or(0);
        }
        stats.schema_length = stats.schema_data_length + stats.schema_index_length;

        stats
    }

    /// Canonical row view for serialization.
    pub fn row(&self) -> BTreeMap<String, Option<String>> {
        let mut row = BTreeMap::new();
        row.insert("SCHEMA_NAME".into(), Some(self.schema_name.clone()));
        row.insert(
            "DEFAULT_COLLATION_NAME".into(),
            self.default_collation_name.clone(),
        );
        row.insert("SCHEMA_TABLES".into(), Some(self.schema_tables.to_string()));
        row.insert(
            "SCHEMA_TABLE_ROWS".into(),
            Some(self.schema_table_rows.to_string()),
        );
        row.insert(
            "SCHEMA_DATA_LENGTH".into(),
            Some(self.schema_data_length.to_string()),
        );
        row.insert(
            "SCHEMA_MAX_DATA_LENGTH".into(),
            Some(self.schema_max_data_length.to_string()),
        );
        row.insert(
            "SCHEMA_INDEX_LENGTH".into(),
            Some(self.schema_index_length.to_string()),
        );
        row.insert("SCHEMA_LENGTH".into(), Some(self.schema_length.to_string()));
        row.insert(
            "SCHEMA_DATA_FREE".into(),
            Some(self.schema_data_free.to_string()),
        );
        row
    }
}

/// Sortable columns of the database aggregate listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseSortColumn {
    SchemaName,
    DefaultCollationName,
    SchemaTables,
    SchemaTableRows,
    SchemaDataLength,
    SchemaMaxDataLength,
    SchemaIndexLength,
    SchemaLength,
    SchemaDataFree,
}

impl DatabaseSortColumn {
    /// The column's canonical SQL alias, used for the catalog `ORDER BY`.
    pub fn sql_name(&self) -> &'static str {
        match self {
            Self::SchemaName => "SCHEMA_NAME",
            Self::DefaultCollationName => "DEFAULT_COLLATION_NAME",
            Self::SchemaTables => "SCHEMA_TABLES",
            Self::SchemaTableRows => "SCHEMA_TABLE_ROWS",
            Self::SchemaDataLength => "SCHEMA_DATA_LENGTH",
            Self::SchemaMaxDataLength => "SCHEMA_MAX_DATA_LENGTH",
            Self::SchemaIndexLength => "SCHEMA_INDEX_LENGTH",
            Self::SchemaLength => "SCHEMA_LENGTH",
            Self::SchemaDataFree => "SCHEMA_DATA_FREE",
        }
    }

    /// Compares two aggregates on this column. Numeric columns compare by
    /// value, never lexically.
    pub fn compare(&self, a: &DatabaseStats, b: &DatabaseStats, natural: bool) -> Ordering {
        match self {
            Self::SchemaName => {
                if natural {
                    natural_cmp(&a.schema_name, &b.schema_name)
                } else {
                    a.schema_name.cmp(&b.schema_name)
                }
            }
            Self::DefaultCollationName => {
                a.default_collation_name.cmp(&b.default_collation_name)
            }
            Self::SchemaTables => a.schema_tables.cmp(&b.schema_tables),
            Self::SchemaTableRows => a.schema_table_rows.cmp(&b.schema_table_rows),
            Self::SchemaDataLength => a.schema_data_length.cmp(&b.schema_data_length),
            Self::SchemaMaxDataLength => a.schema_max_data_length.cmp(&b.schema_max_data_length),
            Self::SchemaIndexLength => a.schema_index_length.cmp(&b.schema_index_length),
            Self::SchemaLength => a.schema_length.cmp(&b.schema_length),
            Self::SchemaDataFree => a.schema_data_free.cmp(&b.schema_data_free),
        }
    }
}

impl std::str::FromStr for DatabaseSortColumn {
    type Err = crate::error::DbPanelError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "SCHEMA_NAME" => Ok(Self::SchemaName),
            "DEFAULT_COLLATION_NAME" => Ok(Self::DefaultCollationName),
            "SCHEMA_TABLES" => Ok(Self::SchemaTables),
            "SCHEMA_TABLE_ROWS" => Ok(Self::SchemaTableRows),
            "SCHEMA_DATA_LENGTH" => Ok(Self::SchemaDataLength),
            "SCHEMA_MAX_DATA_LENGTH" => Ok(Self::SchemaMaxDataLength),
            "SCHEMA_INDEX_LENGTH" => Ok(Self::SchemaIndexLength),
            "SCHEMA_LENGTH" => Ok(Self::SchemaLength),
            "SCHEMA_DATA_FREE" => Ok(Self::SchemaDataFree),
            other => Err(crate::error::DbPanelError::configuration(format!(
                "Unknown sort column: {}",
                other
            ))),
        }
    }
}

/// Sort direction for ordered listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    /// SQL keyword for the direction.
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = crate::error::DbPanelError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Ascending),
            "DESC" => Ok(Self::Descending),
            other => Err(crate::error::DbPanelError::configuration(format!(
                "Unknown sort direction: {}",
                other
            ))),
        }
    }
}

/// Sorts database aggregates by the requested column and direction, with the
/// schema name (ascending) as the stable tie-break.
pub fn sort_database_stats(
    stats: &mut [DatabaseStats],
    column: DatabaseSortColumn,
    direction: SortDirection,
    natural: bool,
) {
    stats.sort_by(|a, b| {
        let primary = match direction {
            SortDirection::Ascending => column.compare(a, b, natural),
            SortDirection::Descending => column.compare(a, b, natural).reverse(),
        };
        primary.then_with(|| a.schema_name.cmp(&b.schema_name))
    });
}

/// Compares names so that embedded numbers order by value: `a2` < `a10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let na = take_number(&mut left);
                    let nb = take_number(&mut right);
                    match na.cmp(&nb) {
                        Ordering::Equal => {}
                        other => return other,
                    }
                } else {
                    match ca.cmp(&cb) {
                        Ordering::Equal => {
                            left.next();
                            right.next();
                        }
                        other => return other,
                    }
                }
            }
        }
    }
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u128 {
    let mut number: u128 = 0;
    while let Some(c) = chars.peek().copied() {
        let Some(digit) = c.to_digit(10) else { break };
        number = number.saturating_mul(10).saturating_add(u128::from(digit));
        chars.next();
    }
    number
}

/// One column description from `SHOW FULL COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub field: String,
    pub column_type: String,
    pub collation: Option<String>,
    pub is_nullable: bool,
    pub key: String,
    pub default: Option<String>,
    pub extra: String,
    pub privileges: String,
    pub comment: String,
}

impl ColumnMetadata {
    /// Normalizes one `SHOW FULL COLUMNS` row.
    pub fn from_show_columns_row(row: &RowView<'_>) -> Option<Self> {
        let field = row.value("Field")?.to_string();

        Some(Self {
            field,
            column_type: row.value("Type").unwrap_or_default().to_string(),
            collation: owned(row.value("Collation")),
            is_nullable: row.value("Null").is_some_and(|v| v.eq_ignore_ascii_case("YES")),
            key: row.value("Key").unwrap_or_default().to_string(),
            default: owned(row.value("Default")),
            extra: row.value("Extra").unwrap_or_default().to_string(),
            privileges: row.value("Privileges").unwrap_or_default().to_string(),
            comment: row.value("Comment").unwrap_or_default().to_string(),
        })
    }
}
