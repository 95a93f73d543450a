//! Integration tests driving the facade over the scripted driver.
//!
//! Every test scripts the exact statements the facade is expected to issue
//! and asserts both the returned values and that no scripted statement was
//! left unconsumed.

use dbpanel_core::cache::KEY_IS_AMAZON_RDS;
use dbpanel_core::config::{ServerConfig, SessionSettings};
use dbpanel_core::driver::scripted::ScriptedDriver;
use dbpanel_core::driver::ConnectionRole;
use dbpanel_core::facade::metadata::{DatabaseSortColumn, SortDirection};
use dbpanel_core::facade::DatabaseFacade;
use std::collections::HashMap;
use std::sync::Arc;

fn facade_over(driver: &Arc<ScriptedDriver>, config: ServerConfig) -> DatabaseFacade {
    let driver: Arc<dyn dbpanel_core::driver::DriverAdapter> = driver.clone();
    DatabaseFacade::new(driver, config)
}

fn version_row(version: &str, comment: &str) -> HashMap<String, Option<String>> {
    HashMap::from([
        ("@@version".to_string(), Some(version.to_string())),
        ("@@version_comment".to_string(), Some(comment.to_string())),
    ])
}

// =============================================================================
// Current user
// =============================================================================

#[tokio::test]
async fn test_current_user_and_host() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT CURRENT_USER();",
        &["CURRENT_USER()"],
        vec![vec![Some("pma@localhost")]],
    );
    let dbi = facade_over(&driver, ServerConfig::default());

    assert_eq!(
        dbi.current_user_and_host().await,
        ("pma".to_string(), "localhost".to_string())
    );
    assert_eq!(dbi.current_user().await, "pma@localhost");

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_current_user_with_empty_user_part() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT CURRENT_USER();",
        &["CURRENT_USER()"],
        vec![vec![Some("@localhost")]],
    );
    let dbi = facade_over(&driver, ServerConfig::default());

    assert_eq!(
        dbi.current_user_and_host().await,
        (String::new(), "localhost".to_string())
    );
    assert_eq!(dbi.current_user().await, "@localhost");

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_current_user_query_failure_is_cached() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_failure("SELECT CURRENT_USER();");
    let dbi = facade_over(&driver, ServerConfig::default());

    assert_eq!(
        dbi.current_user_and_host().await,
        (String::new(), String::new())
    );
    // The failed lookup is cached too; no further query is issued.
    assert_eq!(dbi.current_user().await, "@");
    assert_eq!(
        dbi.current_user_and_host().await,
        (String::new(), String::new())
    );

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_current_user_is_cached_after_first_success() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT CURRENT_USER();",
        &["CURRENT_USER()"],
        vec![vec![Some("pma@localhost")]],
    );
    let dbi = facade_over(&driver, ServerConfig::default());

    assert_eq!(dbi.current_user().await, "pma@localhost");
    assert_eq!(dbi.current_user().await, "pma@localhost");
    assert_eq!(dbi.current_user().await, "pma@localhost");

    driver.assert_all_consumed();
}

// =============================================================================
// Post-connect and version state
// =============================================================================

#[tokio::test]
async fn test_post_connect_without_version_row_keeps_defaults() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_failure("SELECT @@version, @@version_comment");
    // Unknown version implies the conservative character set.
    driver.expect_ok("SET NAMES 'utf8' COLLATE 'utf8_general_ci';");
    let dbi = facade_over(&driver, ServerConfig::default());

    dbi.post_connect(&SessionSettings::default()).await;

    assert_eq!(dbi.version_int(), 0);
    assert_eq!(dbi.version_string(), "");
    assert!(!dbi.is_mariadb());
    assert!(!dbi.is_percona());

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_post_connect_sets_version_and_session_time_zone() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT @@version, @@version_comment",
        &["@@version", "@@version_comment"],
        vec![vec![
            Some("10.20.7-MariaDB-1:10.9.3+maria~ubu2204"),
            Some("mariadb.org binary distribution"),
        ]],
    );
    driver.expect_ok("SET NAMES 'utf8mb4' COLLATE 'utf8mb4_general_ci';");
    driver.expect_ok("SET time_zone = '+00:00';");
    let dbi = facade_over(&driver, ServerConfig::default());

    dbi.post_connect(&SessionSettings::with_time_zone("+00:00")).await;

    assert_eq!(dbi.version_int(), 102007);
    assert!(dbi.is_mariadb());

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_post_connect_time_zone_failure_is_soft() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT @@version, @@version_comment",
        &["@@version", "@@version_comment"],
        vec![vec![Some("8.0.30"), Some("MySQL Community Server - GPL")]],
    );
    driver.expect_ok("SET NAMES 'utf8mb4' COLLATE 'utf8mb4_general_ci';");
    driver.expect_failure("SET time_zone = 'Mars/Olympus';");
    let dbi = facade_over(&driver, ServerConfig::default());

    dbi.post_connect(&SessionSettings::with_time_zone("Mars/Olympus")).await;

    assert_eq!(dbi.version_int(), 80030);
    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_post_connect_version_matrix() {
    let cases: &[(&str, &str, u32, bool, bool)] = &[
        (
            "6.1.0",
            "Percona Server (GPL), Release '11', Revision 'c1y2gr1df4a'",
            60100,
            false,
            true,
        ),
        (
            "10.01.40-MariaDB-1:10.01.40+maria~ubu2204",
            "mariadb.org binary distribution",
            100140,
            true,
            false,
        ),
        ("7.10.3", "MySQL Community Server (GPL)", 71003, false, false),
        ("5.5.0", "", 50500, false, false),
    ];

    for &(version, comment, version_int, is_mariadb, is_percona) in cases {
        let driver = Arc::new(ScriptedDriver::new());
        driver.expect_query(
            "SELECT @@version, @@version_comment",
            &["@@version", "@@version_comment"],
            vec![vec![Some(version), Some(comment)]],
        );
        let charset = if version_int >= 50504 { "utf8mb4" } else { "utf8" };
        driver.expect_ok(&format!(
            "SET NAMES '{0}' COLLATE '{0}_general_ci';",
            charset
        ));
        let dbi = facade_over(&driver, ServerConfig::default());

        dbi.post_connect(&SessionSettings::default()).await;

        assert_eq!(dbi.version_int(), version_int, "version of {}", version);
        assert_eq!(dbi.is_mariadb(), is_mariadb, "mariadb flag of {}", version);
        assert_eq!(dbi.is_percona(), is_percona, "percona flag of {}", version);
        assert_eq!(dbi.version_string(), version);

        driver.assert_all_consumed();
    }
}

// =============================================================================
// Cached server facts
// =============================================================================

#[tokio::test]
async fn test_is_amazon_rds_matrix() {
    let cases: &[(&str, bool)] = &[
        ("/usr", false),
        ("E:/mysql", false),
        ("/rdsdbbin/mysql/", true),
        ("/rdsdbbin/mysql-5.7.18/", true),
    ];

    for &(basedir, expected) in cases {
        let driver = Arc::new(ScriptedDriver::new());
        driver.expect_query("SELECT @@basedir", &["@@basedir"], vec![vec![Some(basedir)]]);
        let dbi = facade_over(&driver, ServerConfig::default());

        assert_eq!(dbi.is_amazon_rds().await, expected, "basedir {}", basedir);

        driver.assert_all_consumed();
    }
}

#[tokio::test]
async fn test_is_amazon_rds_is_cached_until_invalidated() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT @@basedir",
        &["@@basedir"],
        vec![vec![Some("/rdsdbbin/mysql/")]],
    );
    driver.expect_query("SELECT @@basedir", &["@@basedir"], vec![vec![Some("/usr")]]);
    let dbi = facade_over(&driver, ServerConfig::default());

    assert!(dbi.is_amazon_rds().await);
    assert!(dbi.is_amazon_rds().await); // cache hit, no query

    dbi.invalidate_cached(KEY_IS_AMAZON_RDS);
    assert!(!dbi.is_amazon_rds().await);

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_lower_case_table_names_matrix() {
    let cases: &[(Option<&str>, u8)] = &[
        (Some("0"), 0),
        (Some("1"), 1),
        (Some("2"), 2),
        (Some("-1"), 0),
        (Some("3"), 0),
        (Some(""), 0),
        (None, 0),
    ];

    for &(value, expected) in cases {
        let driver = Arc::new(ScriptedDriver::new());
        driver.expect_query(
            "SELECT @@lower_case_table_names",
            &["@@lower_case_table_names"],
            vec![vec![value]],
        );
        let dbi = facade_over(&driver, ServerConfig::default());

        assert_eq!(
            dbi.lower_case_table_names().await,
            expected,
            "input {:?}",
            value
        );

        driver.assert_all_consumed();
    }
}

#[tokio::test]
async fn test_lower_case_table_names_no_row_and_failure() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT @@lower_case_table_names",
        &["@@lower_case_table_names"],
        vec![],
    );
    let dbi = facade_over(&driver, ServerConfig::default());
    assert_eq!(dbi.lower_case_table_names().await, 0);
    driver.assert_all_consumed();

    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_failure("SELECT @@lower_case_table_names");
    let dbi = facade_over(&driver, ServerConfig::default());
    assert_eq!(dbi.lower_case_table_names().await, 0);
    // The default is cached; no second query.
    assert_eq!(dbi.lower_case_table_names().await, 0);
    driver.assert_all_consumed();
}

// =============================================================================
// Collations
// =============================================================================

#[tokio::test]
async fn test_db_collation_information_schema_path() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT DEFAULT_COLLATION_NAME FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = 'pma_test'",
        &["DEFAULT_COLLATION_NAME"],
        vec![vec![Some("utf8_general_ci")]],
    );
    let dbi = facade_over(&driver, ServerConfig::default());

    assert_eq!(dbi.db_collation("pma_test").await.unwrap(), "utf8_general_ci");
    assert!(driver.selected_databases().is_empty());

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_db_collation_legacy_path_selects_and_restores() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT @@collation_database",
        &["@@collation_database"],
        vec![vec![Some("utf8mb3_general_ci")]],
    );
    let config = ServerConfig {
        disable_is: true,
        ..Default::default()
    };
    let dbi = facade_over(&driver, config);

    assert_eq!(
        dbi.db_collation("information_schema").await.unwrap(),
        "utf8mb3_general_ci"
    );
    // Target selected, previous (none) restored.
    assert_eq!(
        driver.selected_databases(),
        vec!["information_schema".to_string(), String::new()]
    );

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_db_collation_legacy_path_skips_restore_when_already_selected() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT @@collation_database",
        &["@@collation_database"],
        vec![vec![Some("utf8mb3_general_ci")]],
    );
    let config = ServerConfig {
        disable_is: true,
        ..Default::default()
    };
    let dbi = facade_over(&driver, config);

    dbi.select_db("information_schema", ConnectionRole::User)
        .await
        .unwrap();
    assert_eq!(
        dbi.db_collation("information_schema").await.unwrap(),
        "utf8mb3_general_ci"
    );
    // One select for the caller, one for the collation read, no restore.
    assert_eq!(
        driver.selected_databases(),
        vec![
            "information_schema".to_string(),
            "information_schema".to_string()
        ]
    );

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_server_collation_with_debug_sql() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SELECT @@collation_server",
        &["@@collation_server"],
        vec![vec![Some("utf8_general_ci")]],
    );
    let config = ServerConfig {
        debug_sql: true,
        ..Default::default()
    };
    let dbi = facade_over(&driver, config);

    // Debug logging changes verbosity, never the value.
    assert_eq!(dbi.server_collation().await.unwrap(), "utf8_general_ci");

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_set_collation_is_version_gated() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_ok("SET collation_connection = 'utf8_czech_ci';");
    driver.expect_ok("SET collation_connection = 'utf8mb4_bin_ci';");
    driver.expect_ok("SET collation_connection = 'utf8_czech_ci';");
    driver.expect_ok("SET collation_connection = 'utf8_bin_ci';");
    let dbi = facade_over(&driver, ServerConfig::default());

    dbi.set_version(&version_row("5.5.4", ""));
    assert_eq!(dbi.version_int(), 50504);
    dbi.set_collation("utf8_czech_ci").await.unwrap();
    dbi.set_collation("utf8mb4_bin_ci").await.unwrap();

    dbi.set_version(&version_row("5.5.3", ""));
    assert_eq!(dbi.version_int(), 50503);
    dbi.set_collation("utf8_czech_ci").await.unwrap();
    dbi.set_collation("utf8mb4_bin_ci").await.unwrap();

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_set_collation_rejects_malformed_names() {
    let driver = Arc::new(ScriptedDriver::new());
    let dbi = facade_over(&driver, ServerConfig::default());

    assert!(dbi.set_collation("utf8'; DROP TABLE x; --").await.is_err());
    driver.assert_all_consumed();
}

// =============================================================================
// Table metadata
// =============================================================================

const STATUS_COLUMNS: &[&str] = &[
    "Name",
    "Engine",
    "Version",
    "Row_format",
    "Rows",
    "Avg_row_length",
    "Data_length",
    "Max_data_length",
    "Index_length",
    "Data_free",
    "Auto_increment",
    "Create_time",
    "Update_time",
    "Check_time",
    "Collation",
    "Checksum",
    "Create_options",
    "Comment",
    "Max_index_length",
    "Temporary",
];

fn status_fixture_row() -> Vec<Option<&'static str>> {
    vec![
        Some("test_table"),
        Some("InnoDB"),
        Some("10"),
        Some("Dynamic"),
        Some("3"),
        Some("5461"),
        Some("16384"),
        Some("0"),
        Some("0"),
        Some("0"),
        Some("4"),
        Some("2011-12-13 14:15:16"),
        None,
        None,
        Some("utf8mb4_general_ci"),
        None,
        Some(""),
        Some(""),
        Some("0"),
        Some("N"),
    ]
}

const IS_TABLES_QUERY: &str = "SELECT TABLE_SCHEMA, TABLE_NAME, TABLE_TYPE, ENGINE, VERSION, \
     ROW_FORMAT, TABLE_ROWS, AVG_ROW_LENGTH, DATA_LENGTH, MAX_DATA_LENGTH, INDEX_LENGTH, \
     DATA_FREE, AUTO_INCREMENT, CREATE_TIME, UPDATE_TIME, CHECK_TIME, TABLE_COLLATION, \
     CHECKSUM, CREATE_OPTIONS, TABLE_COMMENT FROM information_schema.TABLES \
     WHERE TABLE_SCHEMA = 'test_db' ORDER BY TABLE_NAME";

const IS_COLUMNS: &[&str] = &[
    "TABLE_SCHEMA",
    "TABLE_NAME",
    "TABLE_TYPE",
    "ENGINE",
    "VERSION",
    "ROW_FORMAT",
    "TABLE_ROWS",
    "AVG_ROW_LENGTH",
    "DATA_LENGTH",
    "MAX_DATA_LENGTH",
    "INDEX_LENGTH",
    "DATA_FREE",
    "AUTO_INCREMENT",
    "CREATE_TIME",
    "UPDATE_TIME",
    "CHECK_TIME",
    "TABLE_COLLATION",
    "CHECKSUM",
    "CREATE_OPTIONS",
    "TABLE_COMMENT",
    "MAX_INDEX_LENGTH",
    "TEMPORARY",
];

fn is_fixture_row() -> Vec<Option<&'static str>> {
    vec![
        Some("test_db"),
        Some("test_table"),
        Some("BASE TABLE"),
        Some("InnoDB"),
        Some("10"),
        Some("Dynamic"),
        Some("3"),
        Some("5461"),
        Some("16384"),
        Some("0"),
        Some("0"),
        Some("0"),
        Some("4"),
        Some("2011-12-13 14:15:16"),
        None,
        None,
        Some("utf8mb4_general_ci"),
        None,
        Some(""),
        Some(""),
        Some("0"),
        Some("N"),
    ]
}

#[tokio::test]
async fn test_get_tables_full_legacy_path() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SHOW TABLE STATUS FROM `test_db`",
        STATUS_COLUMNS,
        vec![status_fixture_row()],
    );
    let config = ServerConfig {
        disable_is: true,
        ..Default::default()
    };
    let dbi = facade_over(&driver, config);

    let tables = dbi.get_tables_full("test_db").await.unwrap();
    let table = &tables["test_table"];

    assert_eq!(table.schema, "test_db");
    assert_eq!(table.engine.as_deref(), Some("InnoDB"));
    assert_eq!(table.rows, Some(3));
    assert_eq!(table.auto_increment, Some(4));
    assert_eq!(table.update_time, None);

    let row = table.combined_row();
    assert_eq!(row["Name"], Some("test_table".to_string()));
    assert_eq!(row["TABLE_NAME"], Some("test_table".to_string()));
    assert_eq!(row["Type"], Some("InnoDB".to_string()));
    assert_eq!(row["ENGINE"], Some("InnoDB".to_string()));
    assert_eq!(row["Rows"], Some("3".to_string()));
    assert_eq!(row["TABLE_ROWS"], Some("3".to_string()));
    assert_eq!(row["Create_time"], Some("2011-12-13 14:15:16".to_string()));
    assert_eq!(row["CREATE_TIME"], Some("2011-12-13 14:15:16".to_string()));
    assert_eq!(row["UPDATE_TIME"], None);
    assert_eq!(row["TEMPORARY"], Some("N".to_string()));
    assert_eq!(row["TABLE_TYPE"], Some("BASE TABLE".to_string()));

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_get_tables_full_paths_are_equivalent() {
    let legacy_driver = Arc::new(ScriptedDriver::new());
    legacy_driver.expect_query(
        "SHOW TABLE STATUS FROM `test_db`",
        STATUS_COLUMNS,
        vec![status_fixture_row()],
    );
    let legacy_dbi = facade_over(
        &legacy_driver,
        ServerConfig {
            disable_is: true,
            ..Default::default()
        },
    );

    let catalog_driver = Arc::new(ScriptedDriver::new());
    catalog_driver.expect_query(IS_TABLES_QUERY, IS_COLUMNS, vec![is_fixture_row()]);
    let catalog_dbi = facade_over(&catalog_driver, ServerConfig::default());

    let legacy = legacy_dbi.get_tables_full("test_db").await.unwrap();
    let catalog = catalog_dbi.get_tables_full("test_db").await.unwrap();

    assert_eq!(
        legacy.keys().collect::<Vec<_>>(),
        catalog.keys().collect::<Vec<_>>()
    );
    assert_eq!(legacy["test_table"], catalog["test_table"]);
    assert_eq!(
        legacy["test_table"].combined_row(),
        catalog["test_table"].combined_row()
    );

    legacy_driver.assert_all_consumed();
    catalog_driver.assert_all_consumed();
}

#[tokio::test]
async fn test_get_tables_full_with_numeric_table_names() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SHOW TABLE STATUS FROM `test_db`",
        &["Name", "Engine"],
        vec![
            vec![Some("0"), Some("")],
            vec![Some("1"), Some("")],
            vec![Some("42"), Some("")],
        ],
    );
    let config = ServerConfig {
        disable_is: true,
        ..Default::default()
    };
    let dbi = facade_over(&driver, config);

    let tables = dbi.get_tables_full("test_db").await.unwrap();

    // Purely numeric names stay string keys.
    assert_eq!(
        tables.keys().cloned().collect::<Vec<_>>(),
        vec!["0".to_string(), "1".to_string(), "42".to_string()]
    );

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_get_tables_ordering() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SHOW TABLES FROM `test_db`",
        &["Tables_in_test_db"],
        vec![vec![Some("a10")], vec![Some("a2")]],
    );
    driver.expect_query(
        "SHOW TABLES FROM `test_db`",
        &["Tables_in_test_db"],
        vec![vec![Some("a10")], vec![Some("a2")]],
    );

    let lexical = facade_over(&driver, ServerConfig::default());
    assert_eq!(
        lexical.get_tables("test_db").await.unwrap(),
        vec!["a10".to_string(), "a2".to_string()]
    );

    let natural = facade_over(
        &driver,
        ServerConfig {
            natural_order: true,
            ..Default::default()
        },
    );
    assert_eq!(
        natural.get_tables("test_db").await.unwrap(),
        vec!["a2".to_string(), "a10".to_string()]
    );

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_get_columns() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        "SHOW FULL COLUMNS FROM `test_db`.`test_table`",
        &[
            "Field",
            "Type",
            "Collation",
            "Null",
            "Key",
            "Default",
            "Extra",
            "Privileges",
            "Comment",
        ],
        vec![
            vec![
                Some("id"),
                Some("int(11)"),
                None,
                Some("NO"),
                Some("PRI"),
                None,
                Some("auto_increment"),
                Some("select,insert,update,references"),
                Some(""),
            ],
            vec![
                Some("name"),
                Some("varchar(20)"),
                Some("utf8mb4_general_ci"),
                Some("YES"),
                Some(""),
                None,
                Some(""),
                Some("select,insert,update,references"),
                Some(""),
            ],
        ],
    );
    let dbi = facade_over(&driver, ServerConfig::default());

    let columns = dbi.get_columns("test_db", "test_table").await.unwrap();

    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].field, "id");
    assert!(!columns[0].is_nullable);
    assert_eq!(columns[0].key, "PRI");
    assert_eq!(columns[1].field, "name");
    assert!(columns[1].is_nullable);
    assert_eq!(columns[1].collation.as_deref(), Some("utf8mb4_general_ci"));

    driver.assert_all_consumed();
}

// =============================================================================
// Database aggregates
// =============================================================================

const AGGREGATE_COLUMNS: &[&str] = &[
    "Name",
    "Engine",
    "Version",
    "Row_format",
    "Rows",
    "Avg_row_length",
    "Data_length",
    "Max_data_length",
    "Index_length",
    "Data_free",
    "Auto_increment",
    "Create_time",
    "Update_time",
    "Check_time",
    "Collation",
    "Checksum",
    "Create_options",
    "Comment",
];

fn bookmark_row(data_length: &'static str) -> Vec<Option<&'static str>> {
    vec![
        Some("pma__bookmark"),
        Some("InnoDB"),
        Some("10"),
        Some("Dynamic"),
        Some("0"),
        Some("0"),
        Some(data_length),
        Some("0"),
        Some("0"),
        Some("0"),
        Some("1"),
        Some("2021-08-27 14:11:52"),
        None,
        None,
        Some("utf8_bin"),
        None,
        Some(""),
        Some("Bookmarks"),
    ]
}

fn central_columns_row(data_length: &'static str) -> Vec<Option<&'static str>> {
    vec![
        Some("pma__central_columns"),
        Some("InnoDB"),
        Some("10"),
        Some("Dynamic"),
        Some("0"),
        Some("0"),
        Some(data_length),
        Some("0"),
        Some("0"),
        Some("0"),
        None,
        Some("2021-08-27 14:11:52"),
        None,
        None,
        Some("utf8_bin"),
        None,
        Some(""),
        Some("Central list of columns"),
    ]
}

#[tokio::test]
async fn test_get_databases_full_legacy_sorted_by_numeric_column() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query("SHOW DATABASES", &["Database"], vec![
        vec![Some("db1")],
        vec![Some("db2")],
    ]);
    driver.expect_query(
        "SELECT @@collation_database",
        &["@@collation_database"],
        vec![vec![Some("utf8_general_ci")]],
    );
    driver.expect_query(
        "SHOW TABLE STATUS FROM `db1`",
        AGGREGATE_COLUMNS,
        vec![bookmark_row("16384"), central_columns_row("16384")],
    );
    driver.expect_query(
        "SELECT @@collation_database",
        &["@@collation_database"],
        vec![vec![Some("utf8_general_ci")]],
    );
    driver.expect_query(
        "SHOW TABLE STATUS FROM `db2`",
        AGGREGATE_COLUMNS,
        vec![bookmark_row("16324"), central_columns_row("14384")],
    );
    let config = ServerConfig {
        disable_is: true,
        natural_order: true,
        ..Default::default()
    };
    let dbi = facade_over(&driver, config);

    let databases = dbi
        .get_databases_full(
            None,
            true,
            ConnectionRole::User,
            DatabaseSortColumn::SchemaDataLength,
            SortDirection::Ascending,
            0,
            100,
        )
        .await
        .unwrap();

    assert_eq!(databases.len(), 2);

    assert_eq!(databases[0].schema_name, "db2");
    assert_eq!(
        databases[0].default_collation_name.as_deref(),
        Some("utf8_general_ci")
    );
    assert_eq!(databases[0].schema_tables, 2);
    assert_eq!(databases[0].schema_table_rows, 0);
    assert_eq!(databases[0].schema_data_length, 30708);
    assert_eq!(databases[0].schema_length, 30708);

    assert_eq!(databases[1].schema_name, "db1");
    assert_eq!(databases[1].schema_data_length, 32768);
    assert_eq!(databases[1].schema_length, 32768);

    let row = databases[0].row();
    assert_eq!(row["SCHEMA_NAME"], Some("db2".to_string()));
    assert_eq!(row["SCHEMA_DATA_LENGTH"], Some("30708".to_string()));
    assert_eq!(row["SCHEMA_DATA_FREE"], Some("0".to_string()));

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_get_databases_full_sorts_numerically_not_lexically() {
    // Lexically "10000" < "9000"; the facade must order by value.
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query("SHOW DATABASES", &["Database"], vec![
        vec![Some("big")],
        vec![Some("small")],
    ]);
    driver.expect_query(
        "SELECT @@collation_database",
        &["@@collation_database"],
        vec![vec![Some("utf8_general_ci")]],
    );
    driver.expect_query(
        "SHOW TABLE STATUS FROM `big`",
        AGGREGATE_COLUMNS,
        vec![bookmark_row("10000")],
    );
    driver.expect_query(
        "SELECT @@collation_database",
        &["@@collation_database"],
        vec![vec![Some("utf8_general_ci")]],
    );
    driver.expect_query(
        "SHOW TABLE STATUS FROM `small`",
        AGGREGATE_COLUMNS,
        vec![bookmark_row("9000")],
    );
    let config = ServerConfig {
        disable_is: true,
        ..Default::default()
    };
    let dbi = facade_over(&driver, config);

    let databases = dbi
        .get_databases_full(
            None,
            false,
            ConnectionRole::User,
            DatabaseSortColumn::SchemaDataLength,
            SortDirection::Ascending,
            0,
            0,
        )
        .await
        .unwrap();

    assert_eq!(databases[0].schema_name, "small");
    assert_eq!(databases[0].schema_data_length, 9000);
    assert_eq!(databases[1].schema_name, "big");
    assert_eq!(databases[1].schema_data_length, 10000);

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_get_databases_full_catalog_path() {
    const AGGREGATE_QUERY: &str = "SELECT s.SCHEMA_NAME, s.DEFAULT_COLLATION_NAME, \
         COUNT(t.TABLE_SCHEMA) AS SCHEMA_TABLES, \
         SUM(t.TABLE_ROWS) AS SCHEMA_TABLE_ROWS, \
         SUM(t.DATA_LENGTH) AS SCHEMA_DATA_LENGTH, \
         SUM(t.MAX_DATA_LENGTH) AS SCHEMA_MAX_DATA_LENGTH, \
         SUM(t.INDEX_LENGTH) AS SCHEMA_INDEX_LENGTH, \
         SUM(t.DATA_LENGTH + t.INDEX_LENGTH) AS SCHEMA_LENGTH, \
         SUM(t.DATA_FREE) AS SCHEMA_DATA_FREE \
         FROM information_schema.SCHEMATA s \
         LEFT JOIN information_schema.TABLES t ON t.TABLE_SCHEMA = s.SCHEMA_NAME \
         GROUP BY s.SCHEMA_NAME, s.DEFAULT_COLLATION_NAME \
         ORDER BY SCHEMA_DATA_LENGTH ASC, s.SCHEMA_NAME ASC LIMIT 0, 100";

    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_query(
        AGGREGATE_QUERY,
        &[
            "SCHEMA_NAME",
            "DEFAULT_COLLATION_NAME",
            "SCHEMA_TABLES",
            "SCHEMA_TABLE_ROWS",
            "SCHEMA_DATA_LENGTH",
            "SCHEMA_MAX_DATA_LENGTH",
            "SCHEMA_INDEX_LENGTH",
            "SCHEMA_LENGTH",
            "SCHEMA_DATA_FREE",
        ],
        vec![
            vec![
                Some("db2"),
                Some("utf8_general_ci"),
                Some("2"),
                Some("0"),
                Some("30708"),
                Some("0"),
                Some("0"),
                Some("30708"),
                Some("0"),
            ],
            vec![
                Some("db1"),
                Some("utf8_general_ci"),
                Some("2"),
                Some("0"),
                Some("32768"),
                Some("0"),
                Some("0"),
                Some("32768"),
                Some("0"),
            ],
        ],
    );
    let dbi = facade_over(&driver, ServerConfig::default());

    let databases = dbi
        .get_databases_full(
            None,
            true,
            ConnectionRole::User,
            DatabaseSortColumn::SchemaDataLength,
            SortDirection::Ascending,
            0,
            100,
        )
        .await
        .unwrap();

    assert_eq!(databases.len(), 2);
    assert_eq!(databases[0].schema_name, "db2");
    assert_eq!(databases[0].schema_data_length, 30708);
    assert_eq!(databases[1].schema_name, "db1");

    driver.assert_all_consumed();
}

// =============================================================================
// Control user and prepared statements
// =============================================================================

#[tokio::test]
async fn test_query_as_control_user_variants() {
    let sql = "insert into pma__bookmark A,B values(1, 2)";
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_ok(sql);
    driver.expect_ok(sql);
    driver.expect_failure("Invalid query");
    driver.expect_failure("Invalid query");
    let dbi = facade_over(&driver, ServerConfig::default());

    assert!(dbi.query_as_control_user(sql).await.is_ok());
    assert!(dbi.try_query_as_control_user(sql).await.is_some());

    // Same underlying failure, two signaling conventions.
    assert!(dbi.try_query_as_control_user("Invalid query").await.is_none());
    assert!(dbi.query_as_control_user("Invalid query").await.is_err());

    driver.assert_all_consumed();
}

#[tokio::test]
async fn test_control_user_queries_run_on_control_role() {
    let driver = Arc::new(ScriptedDriver::new());
    driver.expect_ok("SELECT 1");
    let dbi = facade_over(&driver, ServerConfig::default());

    dbi.query_as_control_user("SELECT 1").await.unwrap();

    assert_eq!(
        driver.issued_queries(),
        vec![(ConnectionRole::ControlUser, "SELECT 1".to_string())]
    );
}

#[tokio::test]
async fn test_prepare_delegates_to_driver_once() {
    let sql = "SELECT * FROM `mysql`.`user` WHERE `User` = ? AND `Host` = ?;";
    let driver = Arc::new(ScriptedDriver::new());
    let dbi = facade_over(&driver, ServerConfig::default());

    let statement = dbi.prepare(sql, ConnectionRole::ControlUser).await.unwrap();

    assert_eq!(statement.sql(), sql);
    assert_eq!(statement.role(), ConnectionRole::ControlUser);
    assert_eq!(
        driver.prepared_statements(),
        vec![(ConnectionRole::ControlUser, sql.to_string())]
    );
}
