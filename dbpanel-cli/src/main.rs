//! Server inspection tool for the dbpanel database abstraction core.
//!
//! Connects to a MySQL-family server and reports the facts the web panel
//! works from: server version and vendor, hosting environment, database
//! aggregates and per-table metadata. Credentials are sanitized in every
//! log line.

use clap::{Args, Parser, Subcommand};
use dbpanel_core::{
    ConnectionRole, DatabaseFacade, DatabaseSortColumn, Result, ServerConfig, SessionSettings,
    SortDirection, driver::mysql::MySqlDriver, init_logging, redact_database_url,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "dbpanel")]
#[command(about = "Database server inspection for dbpanel")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,

    /// Use legacy SHOW commands instead of information_schema
    #[arg(long, help = "Disable information_schema based metadata retrieval")]
    pub disable_is: bool,

    /// Session time zone to apply after connecting
    #[arg(long, default_value = "", help = "Session time zone (empty = server default)")]
    pub time_zone: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Connect and report server version, vendor and environment
    Test(ConnectArgs),
    /// List databases with aggregate metadata
    Databases(DatabasesArgs),
    /// List one database's tables with full metadata
    Tables(TablesArgs),
}

#[derive(Args)]
pub struct ConnectArgs {
    /// Database connection URL
    #[arg(env = "DATABASE_URL", help = "Connection string (credentials sanitized in logs)")]
    pub database_url: String,
}

#[derive(Args)]
pub struct DatabasesArgs {
    /// Database connection URL
    #[arg(env = "DATABASE_URL")]
    pub database_url: String,

    /// Column to sort by
    #[arg(long, default_value = "SCHEMA_NAME", help = "Sort column, e.g. SCHEMA_DATA_LENGTH")]
    pub sort: String,

    /// Sort direction
    #[arg(long, default_value = "ASC", help = "ASC or DESC")]
    pub order: String,
}

#[derive(Args)]
pub struct TablesArgs {
    /// Database connection URL
    #[arg(env = "DATABASE_URL")]
    pub database_url: String,

    /// Database to inspect
    pub database: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match &cli.command {
        Command::Test(args) => test_connection(&cli, &args.database_url).await,
        Command::Databases(args) => list_databases(&cli, args).await,
        Command::Tables(args) => list_tables(&cli, args).await,
    }
}

/// Builds a facade over a fresh connection and runs the post-connect setup.
async fn connect(cli: &Cli, database_url: &str) -> Result<DatabaseFacade> {
    info!("Connecting to {}", redact_database_url(database_url));

    let driver = Arc::new(MySqlDriver::connect(database_url)?);
    let config = ServerConfig {
        disable_is: cli.global.disable_is,
        ..Default::default()
    };
    let facade = DatabaseFacade::new(driver, config);

    facade
        .post_connect(&SessionSettings::with_time_zone(cli.global.time_zone.clone()))
        .await;

    Ok(facade)
}

/// Reports version, vendor and environment facts.
async fn test_connection(cli: &Cli, database_url: &str) -> Result<()> {
    let facade = connect(cli, database_url).await?;

    let (user, host) = facade.current_user_and_host().await;

    println!("Connection successful");
    println!("User:        {}@{}", user, host);
    println!("Version:     {}", facade.version_string());
    println!("Version int: {}", facade.version_int());
    if facade.is_mariadb() {
        println!("Vendor:      MariaDB");
    } else if facade.is_percona() {
        println!("Vendor:      Percona Server");
    } else {
        println!("Vendor:      MySQL");
    }
    println!("Amazon RDS:  {}", facade.is_amazon_rds().await);
    if facade.is_upgrade_required() {
        println!("Warning: the server version is older than the supported minimum");
    }

    Ok(())
}

/// Prints the database aggregate listing.
async fn list_databases(cli: &Cli, args: &DatabasesArgs) -> Result<()> {
    let facade = connect(cli, &args.database_url).await?;

    let sort_by: DatabaseSortColumn = args.sort.parse()?;
    let sort_order: SortDirection = args.order.parse()?;

    let databases = facade
        .get_databases_full(
            None,
            false,
            ConnectionRole::User,
            sort_by,
            sort_order,
            0,
            0,
        )
        .await?;

    println!(
        "{:<32} {:>8} {:>14} {:>14} {:>12}",
        "DATABASE", "TABLES", "ROWS", "DATA", "INDEX"
    );
    for db in &databases {
        println!(
            "{:<32} {:>8} {:>14} {:>14} {:>12}",
            db.schema_name,
            db.schema_tables,
            db.schema_table_rows,
            db.schema_data_length,
            db.schema_index_length
        );
    }
    println!("{} databases", databases.len());

    Ok(())
}

/// Prints one database's table metadata.
async fn list_tables(cli: &Cli, args: &TablesArgs) -> Result<()> {
    let facade = connect(cli, &args.database_url).await?;

    let collation = facade.db_collation(&args.database).await?;
    let tables = facade.get_tables_full(&args.database).await?;

    println!("Database:  {}", args.database);
    println!("Collation: {}", collation);
    println!();
    println!(
        "{:<32} {:<10} {:>12} {:>14} {:<20}",
        "TABLE", "ENGINE", "ROWS", "DATA", "COLLATION"
    );
    for table in tables.values() {
        println!(
            "{:<32} {:<10} {:>12} {:>14} {:<20}",
            table.name,
            table.engine.as_deref().unwrap_or("-"),
            table.rows.unwrap_or(0),
            table.data_length.unwrap_or(0),
            table.collation.as_deref().unwrap_or("-")
        );
    }
    println!();
    println!("{} tables", tables.len());

    Ok(())
}
