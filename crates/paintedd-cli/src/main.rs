//! Paintedd CLI - load gallery data, price products, and warm the offline cache.

mod commands;

use std::io;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use paintedd_core::Config;

/// Directory for a daily rolling log file, in addition to stderr
const LOG_DIR_ENV: &str = "PAINTEDD_LOG_DIR";

#[derive(Parser)]
#[command(name = "paintedd", version, about = "Paintedd gallery tools")]
struct Cli {
    /// Site root to load data from (overrides the config file)
    #[arg(long, global = true, env = "PAINTEDD_SITE_URL")]
    site: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List events, live ones first
    Events,
    /// Hydrate an event and print every artwork with its products
    Hydrate {
        /// Event folder under event/
        folder: String,
        /// Print the hydrated event as JSON
        #[arg(long)]
        json: bool,
    },
    /// Price one product configuration, optionally as a checkout link
    Quote {
        folder: String,
        art_id: String,
        /// Product type or label, defaults to the first product
        #[arg(long)]
        product: Option<String>,
        /// Variant choice as DIMENSION=OPTION, e.g. Size=A3
        #[arg(long = "option", value_name = "DIMENSION=OPTION")]
        options: Vec<String>,
        /// Also print a WhatsApp checkout link for this single line
        #[arg(long)]
        link: bool,
    },
    /// WhatsApp inquiry link for a gallery artwork
    Inquire { art_id: String },
    /// Shuffle the catalog and roll for reveals
    Reveal {
        #[arg(long, default_value_t = 1)]
        rolls: u32,
        /// Seed for a reproducible shuffle
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show or change this device's identity and region
    Device {
        #[arg(long)]
        toggle_region: bool,
    },
    /// Drive the offline cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Show the configuration, or save a new site URL
    Config {
        #[arg(long)]
        set_site: Option<String>,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Install the app shell into the current generation and activate it
    Sync,
    /// List stored generations and their entries
    Status,
    /// Answer a request through the cache, as the site would
    Fetch {
        /// Site path, e.g. /pallet/data/art.json
        path: String,
        /// Treat the request as a page navigation
        #[arg(long)]
        navigate: bool,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "paintedd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing();
    info!("Paintedd CLI starting");

    let mut config = Config::load()?;
    if let Some(site) = cli.site.as_deref() {
        config.set_site_url(site);
    }

    match cli.command {
        Command::Events => commands::events(&config).await,
        Command::Hydrate { folder, json } => commands::hydrate(&config, &folder, json).await,
        Command::Quote {
            folder,
            art_id,
            product,
            options,
            link,
        } => commands::quote(&config, &folder, &art_id, product.as_deref(), &options, link).await,
        Command::Inquire { art_id } => commands::inquire(&config, &art_id).await,
        Command::Reveal { rolls, seed } => commands::reveal(&config, rolls, seed).await,
        Command::Device { toggle_region } => commands::device(&config, toggle_region),
        Command::Cache { action } => match action {
            CacheAction::Sync => commands::cache_sync(&config).await,
            CacheAction::Status => commands::cache_status(&config),
            CacheAction::Fetch { path, navigate } => commands::cache_fetch(&config, &path, navigate).await,
        },
        Command::Config { set_site } => commands::config(config, set_site.as_deref()),
    }
}
