//! Cache gatekeeper lifecycle and fetch policy.

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};
use url::Url;

use super::storage::CacheStorage;
use super::strategy::{classify, RequestKey, Strategy};
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::net::{Fetch, Request, Response};

/// Lifecycle of one gatekeeper version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Registered, precache not yet done.
    Installing,
    /// Installed, waiting to purge old generations and claim clients.
    Activating,
    /// Intercepting fetches.
    Active,
    /// Install failed; requests pass straight to the network.
    Redundant,
}

/// Sits between the catalog and the network, applying network-first or
/// cache-first per request and owning the cache generations.
pub struct Gatekeeper<N, S> {
    config: CacheConfig,
    base_url: Url,
    network: N,
    storage: S,
    state: WorkerState,
}

impl<N: Fetch, S: CacheStorage> Gatekeeper<N, S> {
    /// `base_url` anchors the relative precache entries.
    pub fn new(config: CacheConfig, base_url: Url, network: N, storage: S) -> Self {
        Self {
            config,
            base_url,
            network,
            storage,
            state: WorkerState::Installing,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn generation(&self) -> &str {
        &self.config.generation
    }

    /// Bring this version up: install unless the current generation already
    /// exists in storage, then activate.
    pub async fn register(&mut self) -> Result<()> {
        let existing = self.storage.keys().await?;
        if existing.iter().any(|name| name == &self.config.generation) {
            debug!(generation = %self.config.generation, "Generation already installed");
            self.state = WorkerState::Activating;
        } else {
            self.install().await?;
        }
        self.activate().await
    }

    /// Precache every configured asset into the current generation.
    ///
    /// All precache responses must succeed before anything is written. On
    /// failure the gatekeeper becomes `Redundant` and the generation is not
    /// created.
    pub async fn install(&mut self) -> Result<()> {
        if self.state != WorkerState::Installing {
            return Err(Error::InvalidTransition {
                from: self.state,
                action: "install",
            });
        }

        info!(
            generation = %self.config.generation,
            assets = self.config.precache.len(),
            "Pre-caching static assets"
        );

        match self.fetch_precache().await {
            Ok(entries) => {
                self.storage.open(&self.config.generation).await?;
                for (key, response) in &entries {
                    self.storage
                        .put(&self.config.generation, key, response)
                        .await?;
                }
                // Skip waiting: activate as soon as install completes
                self.state = WorkerState::Activating;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Install failed, passing requests through to the network");
                self.state = WorkerState::Redundant;
                Err(e)
            }
        }
    }

    async fn fetch_precache(&self) -> Result<Vec<(RequestKey, Response)>> {
        let requests = self
            .config
            .precache
            .iter()
            .map(|asset| Ok(Request::get(self.base_url.join(asset)?)))
            .collect::<Result<Vec<_>>>()?;

        let results = join_all(requests.iter().map(|r| self.network.fetch(r))).await;

        requests
            .iter()
            .zip(results)
            .map(|(request, result)| {
                let response = result.map_err(|e| Error::Precache {
                    url: request.url.to_string(),
                    reason: e.to_string(),
                })?;
                if !response.is_success() {
                    return Err(Error::Precache {
                        url: request.url.to_string(),
                        reason: format!("status {}", response.status),
                    });
                }
                Ok((RequestKey::new(request, &self.config.cache_bust_param), response))
            })
            .collect()
    }

    /// Delete every generation except the current one and start serving.
    pub async fn activate(&mut self) -> Result<()> {
        if self.state != WorkerState::Activating {
            return Err(Error::InvalidTransition {
                from: self.state,
                action: "activate",
            });
        }

        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != &self.config.generation)
            .collect();

        let deletions = join_all(stale.iter().map(|name| {
            info!(generation = %name, "Deleting old cache");
            self.storage.delete(name)
        }))
        .await;
        for result in deletions {
            result?;
        }

        // Claim clients: from here on every fetch is intercepted
        self.state = WorkerState::Active;
        info!(generation = %self.config.generation, "Gatekeeper active");
        Ok(())
    }

    pub fn strategy_for(&self, request: &Request) -> Strategy {
        classify(request.url.path(), &self.config.dynamic_resources)
    }

    async fn network_first(&self, request: &Request, key: &RequestKey) -> Result<Response> {
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_success() {
                    self.store(key, &response).await;
                }
                Ok(response)
            }
            Err(e) => {
                debug!(error = %e, key = %key, "Network failed, falling back to cache");
                self.lookup(key)
                    .await
                    .ok_or_else(|| Error::NotCached(request.url.to_string()))
            }
        }
    }

    async fn cache_first(&self, request: &Request, key: &RequestKey) -> Result<Response> {
        if let Some(cached) = self.lookup(key).await {
            return Ok(cached);
        }

        let response = self.network.fetch(request).await?;
        if self.config.backfill_static && response.is_success() {
            self.store(key, &response).await;
        }
        Ok(response)
    }

    /// Cache lookup; storage errors count as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<Response> {
        let cached = match self.storage.match_request(&self.config.generation, key).await {
            Ok(cached) => cached?,
            Err(e) => {
                warn!(error = %e, key = %key, "Failed to read cache entry");
                return None;
            }
        };
        match cached.into_response() {
            Ok(response) => Some(response),
            Err(e) => {
                warn!(error = %e, key = %key, "Discarding unreadable cache entry");
                None
            }
        }
    }

    /// Store a fresh response; failures never fail the fetch.
    async fn store(&self, key: &RequestKey, response: &Response) {
        if let Err(e) = self
            .storage
            .put(&self.config.generation, key, response)
            .await
        {
            warn!(error = %e, key = %key, "Failed to cache response");
        }
    }
}

#[async_trait]
impl<N: Fetch, S: CacheStorage> Fetch for Gatekeeper<N, S> {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        if self.state != WorkerState::Active {
            return self.network.fetch(request).await;
        }

        let key = RequestKey::new(request, &self.config.cache_bust_param);
        match self.strategy_for(request) {
            Strategy::NetworkFirst => self.network_first(request, &key).await,
            Strategy::CacheFirst => self.cache_first(request, &key).await,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
