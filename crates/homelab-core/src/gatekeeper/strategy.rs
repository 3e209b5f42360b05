//! Resource classification and request identity.

use std::fmt;

use url::Url;

use crate::net::Request;

/// How a request is resolved against the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Try the network, store the fresh copy, fall back to the cache offline.
    NetworkFirst,
    /// Serve from the cache, only go to the network on a miss.
    CacheFirst,
}

/// Classify a request path. Any path containing one of the dynamic
/// fragments is network-first; everything else is cache-first.
pub fn classify(path: &str, dynamic_resources: &[String]) -> Strategy {
    if dynamic_resources
        .iter()
        .any(|fragment| !fragment.is_empty() && path.contains(fragment.as_str()))
    {
        Strategy::NetworkFirst
    } else {
        Strategy::CacheFirst
    }
}

/// Cache key for a request: method plus URL, minus the cache-bust
/// parameter and fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn new(request: &Request, cache_bust_param: &str) -> Self {
        let url = strip_query_param(&request.url, cache_bust_param);
        Self(format!("{} {}", request.method, url))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn strip_query_param(url: &Url, param: &str) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);

    if url.query().is_none() {
        return url;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != param)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url
}
