//! Subcommand implementations. Each loads what it needs and prints to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;

use paintedd_core::api::{DataClient, EventBundle};
use paintedd_core::cache::{CacheManager, CacheStorage, FileStorage, Request};
use paintedd_core::catalog::HydratedEvent;
use paintedd_core::checkout;
use paintedd_core::device::DeviceStore;
use paintedd_core::models::{live_count, Metadata};
use paintedd_core::reveal::{RevealDeck, POINTS_PER_ROLL};
use paintedd_core::session::Session;
use paintedd_core::utils::{format_price, truncate_string};
use paintedd_core::Config;

/// Offline cache generations live here, under the cache directory
const OFFLINE_DIR: &str = "offline";

const TITLE_WIDTH: usize = 32;

fn client(config: &Config) -> Result<DataClient> {
    DataClient::new(&config.site_url)
}

fn offline_storage(config: &Config) -> Result<FileStorage> {
    let dir: PathBuf = config.cache_dir()?.join(OFFLINE_DIR);
    Ok(FileStorage::new(dir)?)
}

async fn load_event(config: &Config, folder: &str) -> Result<HydratedEvent> {
    let bundle: EventBundle = client(config)?
        .load_event_bundle(folder)
        .await
        .with_context(|| format!("Failed to load event {}", folder))?;
    let mut event = bundle.hydrate();
    if let Some(number) = &config.whatsapp_number {
        event.meta.whatsapp_default = Some(number.clone());
    }
    for id in &event.missing {
        warn!(id = %id, "Listed in event but not in the catalog");
    }
    Ok(event)
}

pub async fn events(config: &Config) -> Result<()> {
    let events = client(config)?.fetch_events_index().await?;
    println!("{} events, {} live", events.len(), live_count(&events));
    for event in &events {
        println!(
            "  {:<10} {:<28} {:<20} {:<16} {}",
            event.status.action_label(),
            truncate_string(&event.name, 28),
            truncate_string(&event.location, 20),
            event.dates,
            if event.is_enterable() { event.href() } else { "-".to_string() }
        );
    }
    Ok(())
}

pub async fn hydrate(config: &Config, folder: &str, json: bool) -> Result<()> {
    let event = load_event(config, folder).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&event)?);
        return Ok(());
    }

    let cur = event.meta.currency();
    println!(
        "{}: {} artworks, {} missing from catalog",
        event.meta.event_name(),
        event.artworks.len(),
        event.missing.len()
    );
    for art in &event.artworks {
        let flag = if art.artwork.is_sensitive() { " [NSFW]" } else { "" };
        println!("{}  {}{}", art.id(), truncate_string(art.artwork.display_title(), TITLE_WIDTH), flag);
        if art.products.is_empty() {
            println!("    (display only)");
        }
        for product in &art.products {
            let starting = paintedd_core::catalog::quote(product, &product.default_choices());
            println!(
                "    {:<20} {:>10}  {:<10} {}{}",
                product.label,
                format_price(cur, starting.price),
                product.display_tag(),
                product.sku_base,
                if product.available { "" } else { "  SOLD OUT" }
            );
            for dim in &product.variants {
                let options: Vec<String> = dim
                    .options
                    .iter()
                    .map(|o| match o.modifier.hint(cur) {
                        Some(hint) => format!("{} ({})", o.label, hint),
                        None => o.label.clone(),
                    })
                    .collect();
                println!("        {}: {}", dim.name, options.join(", "));
            }
        }
    }
    Ok(())
}

pub async fn quote(
    config: &Config,
    folder: &str,
    art_id: &str,
    product: Option<&str>,
    options: &[String],
    link: bool,
) -> Result<()> {
    let mut session = Session::new(load_event(config, folder).await?)?;
    session.select_artwork(art_id)?;
    if let Some(product) = product {
        session.select_product(product)?;
    }
    for choice in options {
        let (dimension, option) = choice
            .split_once('=')
            .with_context(|| format!("Expected DIMENSION=OPTION, got {}", choice))?;
        session.choose_option(dimension.trim(), option.trim())?;
    }

    let quote = session
        .current_quote()
        .with_context(|| format!("{} is display only", art_id))?;
    let cur = session.meta().currency().to_string();
    println!("{}  {}  {}", quote.sku, quote.details, format_price(&cur, quote.price));

    if link {
        session.add_to_cart()?;
        if let Some(url) = session.checkout_link() {
            println!("{}", url);
        }
    }
    Ok(())
}

pub async fn inquire(config: &Config, art_id: &str) -> Result<()> {
    let client = client(config)?;
    let (catalog, store) = tokio::join!(client.fetch_catalog(), client.fetch_store());
    let catalog = catalog?;
    let artwork = catalog
        .artworks
        .iter()
        .find(|a| a.id == art_id)
        .with_context(|| format!("No artwork {} in the catalog", art_id))?;

    let number = match &config.whatsapp_number {
        Some(number) => number.clone(),
        None => match client.fetch_global().await {
            Ok(global) => global.business.whatsapp_number().to_string(),
            Err(e) => {
                warn!(error = %e, "No global data, using default contact");
                Metadata::default().whatsapp_number().to_string()
            }
        },
    };

    let status = store.status_of(art_id);
    println!("{}", checkout::InquiryKind::from(status).subject());
    println!("{}", checkout::inquiry_link(&number, artwork, status));
    Ok(())
}

pub async fn reveal(config: &Config, rolls: u32, seed: Option<u64>) -> Result<()> {
    let catalog = client(config)?.fetch_catalog().await?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut deck = RevealDeck::new(catalog.artworks, &mut rng);
    for art in deck.start() {
        println!("  {}  {}", art.id, art.display_title());
    }

    for _ in 0..rolls {
        let Some(roll) = deck.roll(&mut rng) else {
            println!("Collection complete");
            break;
        };
        println!("{} (+{})", roll.tier.label, POINTS_PER_ROLL);
        for art in &deck.items()[roll.revealed] {
            println!("  {}  {}", art.id, art.display_title());
        }
    }

    println!("Score {}, {} left to reveal", deck.score(), deck.remaining());
    Ok(())
}

pub fn device(config: &Config, toggle_region: bool) -> Result<()> {
    let mut store = DeviceStore::open(config.device_path()?)?;
    let uid = store.ensure_identity(&mut rand::thread_rng())?;
    let region = if toggle_region {
        store.toggle_region()?
    } else {
        store.region()
    };
    println!("{}  {}", uid, region);
    Ok(())
}

pub async fn cache_sync(config: &Config) -> Result<()> {
    let storage = Arc::new(offline_storage(config)?);
    let mut manager = CacheManager::new(config.cache.clone(), Arc::new(client(config)?), storage);

    let count = manager.install().await.context("Offline cache install failed")?;
    let report = manager.activate()?;
    println!("Cached {} app shell files in {}", count, manager.generation());
    for name in &report.purged {
        println!("  purged {}", name);
    }
    Ok(())
}

pub fn cache_status(config: &Config) -> Result<()> {
    let storage = offline_storage(config)?;
    let generations = storage.generations()?;
    if generations.is_empty() {
        println!("No offline cache in {}", storage.cache_dir().display());
        return Ok(());
    }
    for name in &generations {
        let marker = if *name == config.cache.generation { "*" } else { " " };
        let keys = storage.keys(name)?;
        println!("{} {} ({} entries)", marker, name, keys.len());
        for url in keys {
            let age = storage
                .lookup(name, &url)?
                .map(|entry| entry.age_display())
                .unwrap_or_default();
            println!("    {:<60} {}", truncate_string(&url, 60), age);
        }
    }
    Ok(())
}

pub async fn cache_fetch(config: &Config, path: &str, navigate: bool) -> Result<()> {
    let storage = Arc::new(offline_storage(config)?);
    let mut manager = CacheManager::new(config.cache.clone(), Arc::new(client(config)?), storage);
    if !manager.resume()? {
        warn!(generation = %manager.generation(), "Offline cache not installed, going to the network");
    }

    let url = manager.policy().resolve(path)?;
    let request = if navigate { Request::navigate(url) } else { Request::infer(url) };
    let served = manager.handle(&request).await?;

    let age = served
        .cached_at
        .map(|at| format!(", stored {}", at.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();
    println!(
        "{} {:?} {} bytes{}",
        served.response.status,
        served.source,
        served.response.body.len(),
        age
    );

    if let Some(revalidation) = served.revalidation {
        match revalidation.await {
            Ok(Ok(fresh)) => println!("Refreshed in background: {}", fresh.status),
            Ok(Err(e)) => warn!(error = %e, "Background refresh failed"),
            Err(e) => warn!(error = %e, "Background refresh task panicked"),
        }
    }
    Ok(())
}

pub fn config(mut config: Config, set_site: Option<&str>) -> Result<()> {
    if let Some(url) = set_site {
        config.set_site_url(url);
        config.save()?;
        println!("Saved {}", Config::config_path()?.display());
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
