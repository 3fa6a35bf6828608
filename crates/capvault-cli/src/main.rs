use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use capvault_client::{HtmlCardExtractor, ReqwestFetcher};
use capvault_core::catalog::DEFAULT_BASE_URL;
use capvault_core::models::{CollectionItemUpdate, Drops, NewCollectionItem};
use capvault_core::{DropService, ScrapeService, ScraperConfig, compare_with_collection};
use capvault_db::{Database, DatabaseConfig};

const DEFAULT_LOG_FILTER: &str =
    "capvault=info,capvault_core=info,capvault_client=info,capvault_db=info";

#[derive(Parser)]
#[command(name = "capvault", version, about = "S-Craft group-buy tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print current group-buy drops, scraping if nothing is stored yet
    Scrape {
        /// Scrape even if a stored snapshot exists
        #[arg(short, long, default_value_t = false)]
        force: bool,

        #[command(flatten)]
        scraper: ScraperArgs,
    },

    /// Print the latest stored snapshot
    Latest,

    /// Show stored snapshots, newest first
    History {
        /// Number of snapshots to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Compare the latest snapshot with the collection
    Compare,

    /// Manage the keycap collection
    Collection {
        #[command(subcommand)]
        command: CollectionCommand,
    },
}

#[derive(Subcommand)]
enum CollectionCommand {
    /// List keycaps in the collection
    List {
        /// Only show keycaps from this vendor
        #[arg(long)]
        vendor: Option<String>,
    },

    /// Add a keycap
    Add {
        #[arg(short, long)]
        name: String,

        #[arg(long)]
        vendor: Option<String>,

        /// Extra field as key=value; values are parsed as JSON when possible
        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, Value)>,
    },

    /// Update a keycap; extra fields are merged into the existing ones
    Update {
        #[arg(long)]
        id: Uuid,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(long)]
        vendor: Option<String>,

        #[arg(long = "attr", value_parser = parse_attr)]
        attrs: Vec<(String, Value)>,
    },

    /// Remove a keycap
    Remove {
        #[arg(long)]
        id: Uuid,
    },
}

#[derive(Args)]
struct ScraperArgs {
    /// Group-buy catalog URL
    #[arg(long, env = "CAPVAULT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "CAPVAULT_TIMEOUT_SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// Catalog pages fetched at once
    #[arg(long, env = "CAPVAULT_CONCURRENCY", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    concurrency: u64,

    /// Ceiling on the whole scrape, in seconds
    #[arg(long, env = "CAPVAULT_RUN_DEADLINE_SECS", default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..))]
    run_deadline_secs: u64,
}

impl ScraperArgs {
    fn to_config(&self) -> ScraperConfig {
        ScraperConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            concurrency: usize::try_from(self.concurrency).unwrap_or(usize::MAX),
            run_deadline: Duration::from_secs(self.run_deadline_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db = connect_db().await?;

    let result = match cli.command {
        Commands::Scrape { force, scraper } => cmd_scrape(&db, force, &scraper.to_config()).await,
        Commands::Latest => cmd_latest(&db).await,
        Commands::History { limit } => cmd_history(&db, limit).await,
        Commands::Compare => cmd_compare(&db).await,
        Commands::Collection { command } => cmd_collection(&db, command).await,
    };

    db.close().await;
    result
}

/// Open the database named by DATABASE_URL.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env()?;
    Database::open(&config)
        .await
        .context("Failed to connect to database")
}

/// Parse `key=value`, reading the value as JSON if it is valid JSON.
fn parse_attr(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn attributes(attrs: Vec<(String, Value)>) -> Map<String, Value> {
    attrs.into_iter().collect()
}

async fn cmd_scrape(db: &Database, force: bool, config: &ScraperConfig) -> Result<()> {
    let fetcher = ReqwestFetcher::with_timeout(config.timeout)?;
    let extractor = HtmlCardExtractor::new(&config.base_url)?;
    let scraper = ScrapeService::from_config(fetcher, extractor, config);
    let service = DropService::new(scraper, db.snapshot_repo());

    let drops = service.run_scrape(force).await?;
    let json = match &drops {
        Drops::Stored(snapshot) => {
            tracing::info!(
                snapshot_id = %snapshot.id,
                scraped_at = %snapshot.scraped_at,
                "Showing stored snapshot (use --force to scrape again)"
            );
            serde_json::to_string_pretty(&snapshot.products)?
        }
        Drops::Scraped {
            snapshot_id,
            products,
        } => {
            match snapshot_id {
                Some(id) => tracing::info!(%id, products = products.len(), "Scraped and stored"),
                None => tracing::warn!(
                    products = products.len(),
                    "Scrape results not stored: nothing found or run deadline reached"
                ),
            }
            serde_json::to_string_pretty(products)?
        }
    };

    println!("{json}");
    Ok(())
}

async fn cmd_latest(db: &Database) -> Result<()> {
    let Some(snapshot) = db.snapshot_repo().load_latest().await? else {
        println!("No snapshot yet. Run `capvault scrape` first.");
        return Ok(());
    };

    println!(
        "Snapshot {} from {} ({} products)\n",
        snapshot.id,
        snapshot.scraped_at.format("%Y-%m-%d %H:%M:%S UTC"),
        snapshot.products.len()
    );
    println!("{}", serde_json::to_string_pretty(&snapshot.products)?);
    Ok(())
}

async fn cmd_history(db: &Database, limit: usize) -> Result<()> {
    let history = db.snapshot_repo().history(limit).await?;

    if history.is_empty() {
        println!("No snapshots stored yet");
        return Ok(());
    }

    println!("Snapshot history:\n");
    for summary in &history {
        println!(
            "  {}  {}  ({} products)",
            summary.scraped_at.format("%Y-%m-%d %H:%M:%S UTC"),
            summary.id,
            summary.product_count,
        );
    }
    println!("\nTotal: {} snapshots", history.len());

    Ok(())
}

async fn cmd_compare(db: &Database) -> Result<()> {
    let result = compare_with_collection(&db.snapshot_repo(), &db.keycap_repo()).await?;

    println!(
        "Owned: {}  Missing: {}\n",
        result.matches.len(),
        result.missing.len()
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn cmd_collection(db: &Database, command: CollectionCommand) -> Result<()> {
    let repo = db.keycap_repo();

    match command {
        CollectionCommand::List { vendor } => {
            let items = repo.list(vendor.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        CollectionCommand::Add {
            name,
            vendor,
            attrs,
        } => {
            let item = NewCollectionItem {
                name,
                vendor,
                attributes: attributes(attrs),
            };
            let id = repo.insert(&item).await?;
            println!("{id}");
        }
        CollectionCommand::Update {
            id,
            name,
            vendor,
            attrs,
        } => {
            let update = CollectionItemUpdate {
                name,
                vendor,
                attributes: attributes(attrs),
            };
            if update.is_empty() {
                anyhow::bail!("Nothing to update: pass --name, --vendor or --attr");
            }
            if !repo.update(id, &update).await? {
                anyhow::bail!("No keycap with id {id}");
            }
            println!("Updated {id}");
        }
        CollectionCommand::Remove { id } => {
            if !repo.delete(id).await? {
                anyhow::bail!("No keycap with id {id}");
            }
            println!("Removed {id}");
        }
    }

    Ok(())
}
