use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{CacheError, CachePolicy, CacheStorage, CachedData, Request, Response, Strategy};
use crate::api::ApiError;

/// Network access used by the cache manager.
pub trait Fetcher: Send + Sync + 'static {
    /// Issue the request. Any HTTP status is a successful fetch here;
    /// `Err` means no response arrived at all.
    fn fetch(&self, request: &Request) -> impl Future<Output = Result<Response, ApiError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    New,
    Installing,
    Installed,
    Activating,
    Active,
    /// Install failed; the previous worker stays in charge
    Redundant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    Cache,
    OfflinePage,
}

/// Background refresh started by stale-while-revalidate
pub type Revalidation = JoinHandle<Result<Response, ApiError>>;

#[derive(Debug)]
pub struct Served {
    pub response: Response,
    pub source: ResponseSource,
    /// When the served copy was stored, for cached responses
    pub cached_at: Option<DateTime<Utc>>,
    /// Still-running refresh of the entry, if one was started
    pub revalidation: Option<Revalidation>,
}

impl Served {
    fn network(response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
            cached_at: None,
            revalidation: None,
        }
    }

    fn cached(entry: CachedData<Response>, source: ResponseSource) -> Self {
        Self {
            response: entry.data,
            source,
            cached_at: Some(entry.cached_at),
            revalidation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    /// Generations deleted because they are not the live one
    pub purged: Vec<String>,
    pub clients_claimed: bool,
}

/// Offline cache in front of the site, modelled on a service worker:
/// install pre-caches the app shell, activate purges old generations,
/// and every request is then answered by the strategy of its class.
pub struct CacheManager<F, S> {
    policy: CachePolicy,
    fetcher: Arc<F>,
    storage: Arc<S>,
    state: LifecycleState,
}

impl<F: Fetcher, S: CacheStorage> CacheManager<F, S> {
    pub fn new(policy: CachePolicy, fetcher: Arc<F>, storage: Arc<S>) -> Self {
        Self {
            policy,
            fetcher,
            storage,
            state: LifecycleState::New,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    pub fn generation(&self) -> &str {
        &self.policy.generation
    }

    fn expect_state(&self, expected: LifecycleState) -> Result<(), CacheError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CacheError::InvalidState {
                expected,
                actual: self.state,
            })
        }
    }

    /// Fetch the whole app shell and store it under the current generation.
    /// Nothing is stored unless every fetch succeeds.
    pub async fn install(&mut self) -> Result<usize, CacheError> {
        self.expect_state(LifecycleState::New)?;
        self.state = LifecycleState::Installing;
        info!(generation = %self.policy.generation, "Installing offline cache");

        match self.precache().await {
            Ok(count) => {
                self.state = LifecycleState::Installed;
                info!(generation = %self.policy.generation, count = count, "App shell cached");
                Ok(count)
            }
            Err(e) => {
                self.state = LifecycleState::Redundant;
                warn!(generation = %self.policy.generation, error = %e, "Install failed");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<usize, CacheError> {
        let urls = self.policy.app_shell_urls()?;
        let fetches = urls.iter().map(|url| {
            let request = Request::infer(url.clone());
            async move {
                self.network(&request)
                    .await
                    .map_err(|source| CacheError::InstallFailed {
                        url: request.url.clone(),
                        source,
                    })
            }
        });

        let responses = futures::future::try_join_all(fetches).await?;
        let count = responses.len();
        self.storage.put_all(&self.policy.generation, responses)?;
        Ok(count)
    }

    /// Delete every generation but the current one, then take over clients.
    pub fn activate(&mut self) -> Result<ActivationReport, CacheError> {
        self.expect_state(LifecycleState::Installed)?;
        self.state = LifecycleState::Activating;

        let mut purged = Vec::new();
        for name in self.storage.generations()? {
            if name == self.policy.generation {
                continue;
            }
            if self.storage.delete_generation(&name)? {
                info!(generation = %name, "Purged old cache generation");
                purged.push(name);
            }
        }

        self.state = LifecycleState::Active;
        info!(generation = %self.policy.generation, "Offline cache active, clients claimed");
        Ok(ActivationReport {
            purged,
            clients_claimed: true,
        })
    }

    /// Take over a generation installed by an earlier run without fetching
    /// anything. Returns `false` (and stays `New`) if it is not in storage.
    pub fn resume(&mut self) -> Result<bool, CacheError> {
        self.expect_state(LifecycleState::New)?;
        let installed = self
            .storage
            .generations()?
            .iter()
            .any(|name| *name == self.policy.generation);
        if installed {
            self.state = LifecycleState::Active;
            info!(generation = %self.policy.generation, "Resumed offline cache");
        }
        Ok(installed)
    }

    /// Answer an intercepted request.
    /// Before activation requests go straight to the network.
    pub async fn handle(&self, request: &Request) -> Result<Served, CacheError> {
        if self.state != LifecycleState::Active {
            debug!(url = %request.url, state = ?self.state, "Not active, passing through");
            return Ok(Served::network(self.fetcher.fetch(request).await?));
        }

        let class = self.policy.classify(request);
        debug!(url = %request.url, class = ?class, "Handling request");

        match class.strategy() {
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::NetworkFirstWithFallback => self.navigate(request).await,
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: &Request) -> Result<Served, CacheError> {
        match self.network(request).await {
            Ok(response) => {
                self.store(response.clone());
                Ok(Served::network(response))
            }
            Err(e) => match self.cached(&request.url) {
                Some(entry) => {
                    info!(url = %request.url, error = %e, "Network failed, serving cached data");
                    Ok(Served::cached(entry, ResponseSource::Cache))
                }
                None => Err(e.into()),
            },
        }
    }

    async fn navigate(&self, request: &Request) -> Result<Served, CacheError> {
        let error = match self.network(request).await {
            Ok(response) => return Ok(Served::network(response)),
            Err(e) => e,
        };

        if let Some(entry) = self.cached(&request.url) {
            info!(url = %request.url, error = %error, "Offline, serving cached page");
            return Ok(Served::cached(entry, ResponseSource::Cache));
        }

        let offline_url = self.policy.offline_url()?;
        match self.cached(&offline_url) {
            Some(entry) => {
                info!(url = %request.url, error = %error, "Offline, serving offline page");
                Ok(Served::cached(entry, ResponseSource::OfflinePage))
            }
            None => Err(error.into()),
        }
    }

    async fn stale_while_revalidate(&self, request: &Request) -> Result<Served, CacheError> {
        let cached = self.cached(&request.url);
        let revalidation = self.spawn_revalidation(request.clone());

        match cached {
            Some(entry) => {
                let mut served = Served::cached(entry, ResponseSource::Cache);
                served.revalidation = Some(revalidation);
                Ok(served)
            }
            None => {
                let response = revalidation
                    .await
                    .map_err(|e| CacheError::Background(e.to_string()))??;
                Ok(Served::network(response))
            }
        }
    }

    /// Fetch in a separate task and overwrite the cache entry on success.
    /// The task outlives the request that started it.
    fn spawn_revalidation(&self, request: Request) -> Revalidation {
        let fetcher = Arc::clone(&self.fetcher);
        let storage = Arc::clone(&self.storage);
        let generation = self.policy.generation.clone();

        tokio::spawn(async move {
            let response = fetcher.fetch(&request).await?;
            if !response.is_success() {
                debug!(url = %request.url, status = response.status, "Not caching unsuccessful revalidation");
                return Err(ApiError::from_status(response.status, &response.text()));
            }
            if let Err(e) = storage.put(&generation, response.clone()) {
                warn!(url = %request.url, error = %e, "Failed to store revalidated response");
            }
            Ok(response)
        })
    }

    async fn cache_first(&self, request: &Request) -> Result<Served, CacheError> {
        if let Some(entry) = self.cached(&request.url) {
            return Ok(Served::cached(entry, ResponseSource::Cache));
        }
        Ok(Served::network(self.network(request).await?))
    }

    /// Fetch, treating unsuccessful statuses as failures.
    async fn network(&self, request: &Request) -> Result<Response, ApiError> {
        let response = self.fetcher.fetch(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.text()))
        }
    }

    /// Look up the live generation, logging storage errors as misses
    fn cached(&self, url: &str) -> Option<CachedData<Response>> {
        match self.storage.lookup(&self.policy.generation, url) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(url = url, error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    fn store(&self, response: Response) {
        let url = response.url.clone();
        if let Err(e) = self.storage.put(&self.policy.generation, response) {
            warn!(url = %url, error = %e, "Failed to cache response");
        }
    }
}
