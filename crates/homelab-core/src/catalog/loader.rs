//! Fetching and parsing `services.json`.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::models::Service;
use crate::net::{Fetch, Request};

/// Last stamp handed out, so two loads in the same millisecond still differ.
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// A freshly loaded catalog.
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    pub services: Vec<Service>,
    /// Set when the gatekeeper answered from its cache.
    pub cached_at: Option<DateTime<Utc>>,
}

/// Unique, increasing cache-bust value based on the current time in millis.
pub fn next_stamp() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut last = LAST_STAMP.load(Ordering::SeqCst);
    loop {
        let next = now.max(last + 1);
        match LAST_STAMP.compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return next,
            Err(actual) => last = actual,
        }
    }
}

/// `url` with `param=stamp`, replacing any existing value of `param`.
pub fn cache_busted(url: &Url, param: &str, stamp: i64) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut busted = url.clone();
    busted
        .query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(param, &stamp.to_string());
    busted
}

/// Parse a `services.json` document (a JSON array of services).
pub fn parse_services(body: &[u8]) -> Result<Vec<Service>> {
    serde_json::from_slice(body)
        .map_err(|e| Error::InvalidResponse(format!("services.json: {}", e)))
}

/// Fetch the catalog with a cache-busted GET and parse it.
///
/// Transport errors, non-success statuses, and malformed documents are all
/// errors; the caller decides how to present them.
pub async fn load_services<F: Fetch + ?Sized>(
    fetcher: &F,
    url: &Url,
    cache_bust_param: &str,
) -> Result<LoadedCatalog> {
    let request = Request::get(cache_busted(url, cache_bust_param, next_stamp()));
    debug!(url = %request.url, "Loading services");

    let response = fetcher.fetch(&request).await?;
    if !response.is_success() {
        warn!(status = response.status, url = %url, "Services request failed");
        return Err(Error::from_status(response.status, &response.text()));
    }

    let services = parse_services(&response.body)?;
    Ok(LoadedCatalog {
        services,
        cached_at: response.cached_at,
    })
}
