//! Client for the site's JSON data files.
//!
//! The site is static: every "endpoint" is a JSON file under the site root.
//! Loads are retried a fixed number of times with a fixed delay, then fail.

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::ApiError;
use crate::cache::{Fetcher, Request, Response};
use crate::catalog::{hydrate_event, HydratedEvent};
use crate::models::{parse_each, sort_events, ArtCatalog, EventData, EventListing, GlobalData, StoreInventory};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Attempts per data file before giving up.
const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Fixed delay between attempts in milliseconds.
const RETRY_DELAY_MS: u64 = 1000;

/// Global business metadata and pricing blueprints
pub const GLOBAL_PATH: &str = "pallet/data/global.json";

/// Master artwork catalog
pub const CATALOG_PATH: &str = "pallet/data/art.json";

/// Index of all events
pub const EVENTS_INDEX_PATH: &str = "pallet/data/events.json";

/// Gallery stock status
pub const STORE_PATH: &str = "pallet/data/store.json";

/// The three files an event page needs.
#[derive(Debug, Clone)]
pub struct EventBundle {
    pub global: GlobalData,
    pub catalog: ArtCatalog,
    pub event: EventData,
}

impl EventBundle {
    pub fn hydrate(&self) -> HydratedEvent {
        hydrate_event(&self.global, &self.catalog, &self.event)
    }
}

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct DataClient {
    client: Client,
    base_url: Url,
    attempts: u32,
    retry_delay: Duration,
}

impl DataClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        // Url::join drops the last segment unless the base ends with a slash
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)
            .with_context(|| format!("Invalid site URL: {}", base_url))?;

        Ok(Self {
            client,
            base_url,
            attempts: MAX_FETCH_ATTEMPTS,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        })
    }

    /// Override the retry schedule
    pub fn with_retry(mut self, attempts: u32, delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .with_context(|| format!("Invalid data path: {}", path))
    }

    /// GET with a fixed number of attempts. Transport errors and
    /// unsuccessful statuses both count as failed attempts.
    async fn fetch_with_retry(&self, url: &Url) -> Result<reqwest::Response, ApiError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.client.get(url.clone()).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    ApiError::from_status(status, &body)
                }
                Err(e) => ApiError::NetworkError(e),
            };

            if attempt >= self.attempts {
                return Err(ApiError::RetriesExhausted {
                    url: url.to_string(),
                    attempts: attempt,
                    last: error.to_string(),
                });
            }
            warn!(url = %url, attempt = attempt, error = %error, "Fetch failed, retrying");
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path)?;
        let response = self.fetch_with_retry(&url).await?;
        let text = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;
        debug!(url = %url, bytes = text.len(), "Fetched data file");
        serde_json::from_str(&text).with_context(|| format!("Failed to parse JSON from {}", url))
    }

    // ===== Data Files =====

    pub async fn fetch_global(&self) -> Result<GlobalData> {
        self.get_json(GLOBAL_PATH).await
    }

    pub async fn fetch_catalog(&self) -> Result<ArtCatalog> {
        self.get_json(CATALOG_PATH).await
    }

    /// Per-event inventory, relative to the event's folder
    pub async fn fetch_event(&self, folder: &str) -> Result<EventData> {
        let path = format!("event/{}/pallet/data/eventdetails.json", folder.trim_matches('/'));
        self.get_json(&path).await
    }

    /// Events index, sorted live-first
    /// Malformed entries are logged and left out.
    pub async fn fetch_events_index(&self) -> Result<Vec<EventListing>> {
        let entries: Vec<serde_json::Value> = self.get_json(EVENTS_INDEX_PATH).await?;
        let mut events: Vec<EventListing> = parse_each(entries);
        sort_events(&mut events);
        Ok(events)
    }

    /// Gallery stock status. The file is optional; failures yield an empty store.
    pub async fn fetch_store(&self) -> StoreInventory {
        match self.get_json(STORE_PATH).await {
            Ok(store) => store,
            Err(e) => {
                debug!(error = %e, "No store data, treating everything as unlisted");
                StoreInventory::default()
            }
        }
    }

    /// Load the global rules, master catalog and event file together.
    /// Fails as a whole if any of them cannot be loaded.
    pub async fn load_event_bundle(&self, folder: &str) -> Result<EventBundle> {
        let (global, catalog, event) = tokio::try_join!(
            self.fetch_global(),
            self.fetch_catalog(),
            self.fetch_event(folder),
        )?;
        Ok(EventBundle { global, catalog, event })
    }
}

impl Fetcher for DataClient {
    async fn fetch(&self, request: &Request) -> Result<Response, ApiError> {
        let response = self.client.get(&request.url).send().await?;
        let status = response.status().as_u16();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(Response {
            url: request.url.clone(),
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Destination;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> DataClient {
        DataClient::new(&server.uri())
            .unwrap()
            .with_retry(3, Duration::from_millis(10))
    }

    async fn mount_json(server: &MockServer, at: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_url_joins_relative_to_site_root() {
        let client = DataClient::new("https://paintedd.art/site").unwrap();
        assert_eq!(
            client.url("/pallet/data/art.json").unwrap().as_str(),
            "https://paintedd.art/site/pallet/data/art.json"
        );
    }

    #[tokio::test]
    async fn test_load_event_bundle_and_hydrate() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/pallet/data/global.json",
            serde_json::json!({
                "business": {"currency": "R"},
                "defaults": {"blueprints": {
                    "print_sizes": {"A4": {"label": "A4", "base": 50, "code": "A4"}},
                    "print_papers": {"matte": {"label": "Matte", "tier": 1.0}},
                    "loot": {"sticker": {"label": "Sticker", "price": 40}}
                }}
            }),
        )
        .await;
        mount_json(
            &server,
            "/pallet/data/art.json",
            serde_json::json!({"artworks": [{"id": "PDD-001", "title": "Red Balloon"}]}),
        )
        .await;
        mount_json(
            &server,
            "/event/ccctown26/pallet/data/eventdetails.json",
            serde_json::json!({
                "meta": {"event_name": "CCC Town 26"},
                "pricing_overrides": {"sticker": 75},
                "inventory": [{"id": "PDD-001", "config": {"prints": ["A4"], "sticker": true}}]
            }),
        )
        .await;

        let bundle = client(&server).load_event_bundle("ccctown26").await.unwrap();
        let hydrated = bundle.hydrate();
        let art = hydrated.artwork("PDD-001").unwrap();
        assert_eq!(art.products.len(), 2);
        assert_eq!(art.product("Sticker").unwrap().base_price, 75.0);
    }

    #[tokio::test]
    async fn test_fetch_retries_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pallet/data/art.json"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        mount_json(&server, "/pallet/data/art.json", serde_json::json!([{"id": "a"}])).await;

        let catalog = client(&server).fetch_catalog().await.unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_fixed_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pallet/data/global.json"))
            .respond_with(ResponseTemplate::new(404))
            .expect(3)
            .mount(&server)
            .await;

        let err = client(&server).fetch_global().await.unwrap_err();
        match err.downcast_ref::<ApiError>() {
            Some(ApiError::RetriesExhausted { attempts, .. }) => assert_eq!(*attempts, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_store_is_empty() {
        let server = MockServer::start().await;
        let store = client(&server).fetch_store().await;
        assert!(store.inventory.is_empty());
    }

    #[tokio::test]
    async fn test_events_index_sorted_live_first() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "/pallet/data/events.json",
            serde_json::json!([
                {"name": "Old", "folder": "old", "status": "archived"},
                {"name": "TBA", "folder": "tba"},
                {"name": "Soon", "folder": "soon", "status": "upcomming"},
                {"folder": "nameless", "status": "active"},
                {"name": "Now", "folder": "now", "status": "active"}
            ]),
        )
        .await;

        let events = client(&server).fetch_events_index().await.unwrap();
        let names: Vec<_> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Now", "Soon", "Old", "TBA"]);
    }

    #[tokio::test]
    async fn test_fetcher_returns_any_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/offline.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<offline>", "text/html")
                    .insert_header("x-served-by", "edge"),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let ok = client
            .fetch(&Request::navigate(format!("{}/offline.html", server.uri())))
            .await
            .unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.text(), "<offline>");
        assert_eq!(ok.header("Content-Type"), Some("text/html"));
        assert_eq!(ok.header("X-Served-By"), Some("edge"));

        let missing = client
            .fetch(&Request::fetch(format!("{}/nope.png", server.uri()), Destination::Image))
            .await
            .unwrap();
        assert_eq!(missing.status, 404);
    }
}
