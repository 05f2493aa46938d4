//! swapi-sync CLI - load SWAPI people into SQLite

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use swapi_sync::config::{self, Settings, SwapiConfig};
use swapi_sync::ui::{self, Icons, ProgressManager, Spinner, TableBuilder};
use swapi_sync::{FailurePolicy, PeopleSink, Pipeline, SqliteStore, SwapiClient};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "swapi-sync")]
#[command(version)]
#[command(about = "Fetch Star Wars API people, resolve their relations, store them in SQLite")]
#[command(long_about = r#"
swapi-sync pulls people from the Star Wars API, resolves every homeworld,
film, species, starship and vehicle URL to its name, and stores the flattened
records in a SQLite table.

Configuration is layered: defaults, then swapi-sync.toml (or --config), then
SWAPI_* environment variables, then command-line flags.

Example usage:
  swapi-sync init-db
  swapi-sync sync --chunk-size 10
  swapi-sync list --limit 20
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the people table if it does not exist
    InitDb {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Fetch, resolve and store people
    Sync {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        #[command(flatten)]
        source: SourceArgs,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show statistics about stored people
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// List stored people
    List {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Maximum number of people
        #[arg(short, long, default_value = "100")]
        limit: usize,

        /// Print people as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a config file with the default settings
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Default)]
struct SourceArgs {
    /// API root, e.g. https://swapi.dev/api/
    #[arg(long)]
    base_url: Option<String>,

    /// First person id to fetch
    #[arg(long)]
    first_id: Option<u32>,

    /// Last person id to fetch (inclusive)
    #[arg(long)]
    last_id: Option<u32>,

    /// People fetched concurrently per chunk
    #[arg(short, long)]
    chunk_size: Option<usize>,

    /// Maximum HTTP requests in flight
    #[arg(long)]
    max_connections: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Verify TLS certificates (off by default)
    #[arg(long)]
    verify_tls: bool,

    /// What to do when a person's relations fail to resolve (fail-fast, skip-entity)
    #[arg(long)]
    failure_policy: Option<FailurePolicy>,
}

impl SourceArgs {
    fn into_layer(self, database: Option<PathBuf>) -> SwapiConfig {
        SwapiConfig {
            database: database.map(|p| p.to_string_lossy().into_owned()),
            base_url: self.base_url,
            first_id: self.first_id,
            last_id: self.last_id,
            chunk_size: self.chunk_size,
            max_connections: self.max_connections,
            request_timeout_secs: self.request_timeout,
            accept_invalid_certs: self.verify_tls.then_some(false),
            failure_policy: self.failure_policy,
        }
    }
}

/// Resolve settings: defaults < config file < environment < flags.
fn load_settings(config_path: Option<&Path>, flags: SwapiConfig) -> anyhow::Result<Settings> {
    let file = config::load_config(config_path)?.unwrap_or_default();
    let env = SwapiConfig::from_env()?;
    file.merge(env).merge(flags).resolve()
}

fn elapsed_line(elapsed: Duration) -> String {
    format!("Total elapsed: {:.2?}", elapsed)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::InitDb { database } => {
            let settings = load_settings(config_path, SourceArgs::default().into_layer(database))?;
            let spinner = Spinner::new("Creating schema...");

            let store = SqliteStore::open(&settings.database)?;
            store.create_schema_if_absent().await?;
            store.shutdown()?;

            spinner.finish_with_message("Schema ready");
            ui::success(&format!("Database ready at {}", settings.database.display()));
        }

        Commands::Sync {
            database,
            source,
            json,
        } => {
            let started = Instant::now();
            let settings = load_settings(config_path, source.into_layer(database))?;

            if !json {
                ui::header("Syncing SWAPI people");
                ui::status(Icons::LINK, "Source", &settings.base_url);
                ui::status(Icons::DATABASE, "Database", &settings.database.display().to_string());
                ui::status(
                    Icons::PERSON,
                    "Ids",
                    &format!(
                        "{}..={} in chunks of {}",
                        settings.plan.ids.start(),
                        settings.plan.ids.end(),
                        settings.plan.chunk_size
                    ),
                );
                if settings.http.accept_invalid_certs {
                    ui::warn("TLS certificate verification is disabled (use --verify-tls)");
                }
            }

            let store = SqliteStore::open(&settings.database)?;
            store.create_schema_if_absent().await?;

            let client = SwapiClient::new(settings.base_url.clone(), &settings.http)?;
            let (progress, tx) = ProgressManager::new();
            let pipeline = Pipeline::new(client, Arc::new(store.clone()))
                .with_policy(settings.failure_policy)
                .with_progress(tx);

            let result = pipeline.run(&settings.plan).await;
            drop(pipeline);
            progress.clear();

            // Release the database whether or not the run succeeded.
            let closed = store.shutdown();
            let report = result?;
            closed?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                eprintln!("{}", elapsed_line(started.elapsed()));
            } else {
                progress.finish_with_summary(&report);
                if !report.skipped.is_empty() {
                    ui::warn(&format!("Skipped ids: {:?}", report.skipped));
                }
                ui::timing(&elapsed_line(started.elapsed()));
            }
        }

        Commands::Stats { database } => {
            let settings = load_settings(config_path, SourceArgs::default().into_layer(database))?;
            let store = SqliteStore::open(&settings.database)?;
            let stats = store.stats()?;

            ui::section(&format!("{} Stored people ({})", Icons::STATS, settings.database.display()));
            let mut table = TableBuilder::new();
            table.add_row("People", &stats.people.to_string());
            table.add_row("Distinct homeworlds", &stats.homeworlds.to_string());
            table.add_row("With films", &stats.with_films.to_string());
            if let (Some(min), Some(max)) = (stats.min_id, stats.max_id) {
                table.add_row("Id range", &format!("{}..={}", min, max));
            }
            println!("{}", table.build());
        }

        Commands::List {
            database,
            limit,
            json,
        } => {
            let settings = load_settings(config_path, SourceArgs::default().into_layer(database))?;
            let store = SqliteStore::open(&settings.database)?;
            let people = store.list_people(limit)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&people)?);
            } else if people.is_empty() {
                ui::info("People", "none stored yet (run `swapi-sync sync`)");
            } else {
                println!("{}", ui::people_table(&people));
            }
        }

        Commands::InitConfig { force } => {
            let path = config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(config::default_config_path);
            config::write_config(&path, &SwapiConfig::defaults(), force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }
    }

    Ok(())
}
