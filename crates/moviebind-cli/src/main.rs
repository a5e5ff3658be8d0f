mod config;
mod logging;
mod pg;
mod provision;
mod redaction;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use moviebind_core::{Catalog, Error as CoreError, FkGraphReport, build_fk_graph_report};
use moviebind_generate::{BatchRunner, GenerationError, SeedOptions, SeedReport, TracingReporter};
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::info;

use crate::config::resolve_connection;
use crate::logging::init_logging;
use crate::pg::PgStore;
use crate::provision::{create_statements, provision};
use crate::redaction::redact_connection_string;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("catalog error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logging error: {0}")]
    Logging(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unsupported engine: {0}")]
    UnsupportedEngine(String),
    #[error("seeding worker failed: {0}")]
    Worker(String),
}

#[derive(Parser, Debug)]
#[command(name = "moviebind", version, about = "MovieBind database seeder")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
    /// Append JSON logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Provision the schema and fill it with synthetic data.
    Seed(SeedArgs),
    /// Print or apply the schema DDL.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Database connection string; defaults to DB_* environment variables.
    #[arg(long, value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    /// Drop existing tables before creating them.
    #[arg(long, default_value_t = false)]
    reset: bool,
}

#[derive(Args, Debug)]
struct SeedArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    /// TOML file with seed options.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Number of users to create.
    #[arg(long)]
    users: Option<u32>,
    /// RNG seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
    /// Also write the run report to this path.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    /// Execute the DDL instead of printing it.
    #[arg(long, default_value_t = false)]
    apply: bool,
    /// Print the catalog and its dependency graph as JSON instead of DDL.
    #[arg(long, default_value_t = false, conflicts_with = "apply")]
    json: bool,
}

#[derive(Serialize)]
struct SchemaDocument<'a> {
    catalog: &'a Catalog,
    dependencies: FkGraphReport,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.log_json, cli.log_file.as_deref())?;

    match cli.command {
        Command::Seed(args) => run_seed(args).await,
        Command::Schema(args) => run_schema(args).await,
    }
}

async fn run_seed(args: SeedArgs) -> Result<(), CliError> {
    let mut options = match &args.config {
        Some(path) => SeedOptions::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => SeedOptions::default(),
    };
    if let Some(users) = args.users {
        options.users = users;
    }
    if let Some(seed) = args.seed {
        options.seed = Some(seed);
    }
    options.validate()?;

    let catalog = Catalog::moviebind();
    let pool = connect(args.connection.conn).await?;
    provision(&pool, &catalog, args.connection.reset).await?;

    let runner = BatchRunner::with_catalog(options, catalog.clone());
    let mut store = PgStore::new(pool.clone(), catalog, Handle::current());
    let report = tokio::task::spawn_blocking(move || {
        let mut reporter = TracingReporter::new();
        runner.run(&mut store, &mut reporter)
    })
    .await
    .map_err(|err| CliError::Worker(err.to_string()))??;

    pool.close().await;
    emit_report(&report, args.report.as_deref())
}

async fn run_schema(args: SchemaArgs) -> Result<(), CliError> {
    let catalog = Catalog::moviebind();

    if args.json {
        let document = SchemaDocument {
            dependencies: build_fk_graph_report(&catalog),
            catalog: &catalog,
        };
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    if !args.apply {
        if args.connection.reset {
            return Err(CliError::InvalidConfig(
                "--reset only applies together with --apply".to_string(),
            ));
        }
        for statement in create_statements(&catalog)? {
            println!("{statement};\n");
        }
        return Ok(());
    }

    let pool = connect(args.connection.conn).await?;
    let executed = provision(&pool, &catalog, args.connection.reset).await?;
    pool.close().await;
    info!(
        statements = executed,
        reset = args.connection.reset,
        "schema applied"
    );
    Ok(())
}

async fn connect(conn: Option<String>) -> Result<PgPool, CliError> {
    let conn = resolve_connection(conn)?;
    let engine = detect_engine(&conn)?;
    let redacted = redact_connection_string(&conn);
    info!(
        engine,
        connection = %redacted.redacted,
        host = redacted.host.as_deref().unwrap_or("-"),
        database = redacted.database.as_deref().unwrap_or("-"),
        "connecting"
    );

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&conn)
        .await?;
    Ok(pool)
}

fn emit_report(report: &SeedReport, path: Option<&std::path::Path>) -> Result<(), CliError> {
    let json = report.to_json_pretty()?;
    if let Some(path) = path {
        std::fs::write(path, &json)?;
        info!(path = %path.display(), "report written");
    }
    println!("{json}");
    Ok(())
}

fn detect_engine(conn: &str) -> Result<&'static str, CliError> {
    if conn.starts_with("postgres://") || conn.starts_with("postgresql://") {
        Ok("postgres")
    } else {
        Err(CliError::UnsupportedEngine(
            redact_connection_string(conn).redacted,
        ))
    }
}
