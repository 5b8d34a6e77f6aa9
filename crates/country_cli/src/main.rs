//! Country service launcher.
//!
//! Usage:
//!   countries serve --port 8000 --seed
//!   countries seed --database ./country_app.db
//!
//! Configuration is resolved once here (defaults, `--config` JSON file,
//! `COUNTRY_API_*` environment, then flags) and passed down explicitly.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use country_api::ApiConfig;
use country_core::db::open_db;
use country_core::{default_log_level, init_logging, seed_sample_countries, SeedOutcome};
use log::info;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "countries")]
#[command(about = "Country information HTTP service", version)]
struct Cli {
    /// JSON config file; `COUNTRY_API_*` variables override it
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; stderr when omitted
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Populate an empty database with sample countries
    Seed(DatabaseArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Seed sample countries before serving when the database is empty
    #[arg(long)]
    seed: bool,

    #[command(flatten)]
    database: DatabaseArgs,
}

#[derive(Args, Debug)]
struct DatabaseArgs {
    /// SQLite database file
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, cli.log_dir.as_deref()).map_err(anyhow::Error::msg)?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Serve(args) => serve(config, args).await,
        Command::Seed(args) => {
            let config = apply_database(config, &args);
            seed(&config.database_path)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<ApiConfig> {
    let base = match path {
        Some(path) => ApiConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ApiConfig::default(),
    };
    base.with_env_overrides(|key| std::env::var(key).ok())
        .context("Invalid COUNTRY_API_* environment")
}

fn apply_database(mut config: ApiConfig, args: &DatabaseArgs) -> ApiConfig {
    if let Some(database) = &args.database {
        config.database_path = database.clone();
    }
    config
}

async fn serve(config: ApiConfig, args: ServeArgs) -> Result<()> {
    let mut config = apply_database(config, &args.database);
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate().context("Invalid server configuration")?;

    // Creates the file and applies migrations before the first request.
    open_db(&config.database_path)
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;

    if args.seed {
        seed(&config.database_path)?;
    }

    println!("\n========================================");
    println!("  Country Information API");
    println!("========================================");
    println!("  Listening: http://{}", config.socket_addr());
    println!("  Countries: http://{}{}/countries", config.socket_addr(), config.normalized_prefix());
    println!("  Database:  {}", config.database_path.display());
    println!("========================================\n");

    country_api::serve(config)
        .await
        .context("HTTP server failed")
}

fn seed(database_path: &Path) -> Result<()> {
    let conn = open_db(database_path)
        .with_context(|| format!("Failed to open {}", database_path.display()))?;
    match seed_sample_countries(&conn).context("Failed to seed database")? {
        SeedOutcome::Skipped { existing } => {
            info!("event=seed module=cli status=skipped existing={existing}");
            println!("Database already contains {existing} countries. Skipping seed.");
        }
        SeedOutcome::Seeded { inserted } => {
            info!("event=seed module=cli status=ok inserted={inserted}");
            println!("Successfully seeded database with {inserted} countries.");
        }
    }
    Ok(())
}
