//! Generation-scoped response cache.
//!
//! Each cache generation is a directory under the storage root; each entry
//! is one JSON file named after the SHA-256 of its request identity.

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::debug;

use super::strategy::RequestKey;
use crate::error::{Error, Result};
use crate::net::Response;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        age_display(self.cached_at)
    }
}

/// Human-readable age of a timestamp: "just now", "5m ago", "2h ago", "3d ago"
pub fn age_display(cached_at: DateTime<Utc>) -> String {
    let minutes = (Utc::now() - cached_at).num_minutes();
    if minutes < 1 {
        // Also covers clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// A response as written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub key: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Base64-encoded body
    pub body: String,
}

impl StoredResponse {
    pub fn new(key: &RequestKey, response: &Response) -> Self {
        Self {
            key: key.as_str().to_string(),
            status: response.status,
            headers: response.headers.clone(),
            body: STANDARD.encode(&response.body),
        }
    }
}

impl CachedData<StoredResponse> {
    pub fn into_response(self) -> Result<Response> {
        let body = STANDARD
            .decode(self.data.body.as_bytes())
            .map_err(|e| Error::InvalidResponse(format!("cached body for {}: {}", self.data.key, e)))?;
        Ok(Response {
            status: self.data.status,
            headers: self.data.headers,
            body,
            cached_at: Some(self.cached_at),
        })
    }
}

/// The cache store collaborator: named generations of request/response pairs.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open the named generation, creating it if needed.
    async fn open(&self, generation: &str) -> Result<()>;

    /// Names of all existing generations.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Delete a generation. Returns false if it did not exist.
    async fn delete(&self, generation: &str) -> Result<bool>;

    async fn match_request(
        &self,
        generation: &str,
        key: &RequestKey,
    ) -> Result<Option<CachedData<StoredResponse>>>;

    /// Store (or replace) the entry for `key`.
    async fn put(&self, generation: &str, key: &RequestKey, response: &Response) -> Result<()>;
}

/// Disk-backed [`CacheStorage`].
pub struct DiskCacheStorage {
    root: PathBuf,
}

impl DiskCacheStorage {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn generation_dir(&self, generation: &str) -> PathBuf {
        self.root.join(generation)
    }

    fn entry_path(&self, generation: &str, key: &RequestKey) -> PathBuf {
        let digest = Sha256::digest(key.as_str().as_bytes());
        self.generation_dir(generation)
            .join(format!("{:x}.json", digest))
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    async fn open(&self, generation: &str) -> Result<()> {
        std::fs::create_dir_all(self.generation_dir(generation))?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, generation: &str) -> Result<bool> {
        let dir = self.generation_dir(generation);
        if !dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir)?;
        debug!(generation, "Cache generation deleted");
        Ok(true)
    }

    async fn match_request(
        &self,
        generation: &str,
        key: &RequestKey,
    ) -> Result<Option<CachedData<StoredResponse>>> {
        let path = self.entry_path(generation, key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let cached: CachedData<StoredResponse> = serde_json::from_str(&contents)?;
        Ok(Some(cached))
    }

    async fn put(&self, generation: &str, key: &RequestKey, response: &Response) -> Result<()> {
        let dir = self.generation_dir(generation);
        std::fs::create_dir_all(&dir)?;

        let cached = CachedData::new(StoredResponse::new(key, response));
        let contents = serde_json::to_string_pretty(&cached)?;

        // Each write gets its own temp file; the rename replaces the entry whole
        let path = self.entry_path(generation, key);
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.persist(&path).map_err(|e| e.error)?;

        debug!(generation, key = %key, status = response.status, "Cached response");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::Request;
    use chrono::Duration;
    use std::sync::Arc;
    use tempfile::TempDir;
    use url::Url;

    fn key(url: &str) -> RequestKey {
        RequestKey::new(&Request::get(Url::parse(url).unwrap()), "t")
    }

    fn storage() -> (TempDir, DiskCacheStorage) {
        let dir = TempDir::new().unwrap();
        let storage = DiskCacheStorage::new(dir.path().join("generations")).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
        assert!(cached.age_minutes() <= 1);
    }

    #[test]
    fn test_age_display_rounding() {
        let now = Utc::now();
        assert_eq!(age_display(now - Duration::minutes(5)), "5m ago");
        assert_eq!(age_display(now - Duration::minutes(90)), "2h ago");
        assert_eq!(age_display(now - Duration::minutes(70)), "1h ago");
        assert_eq!(age_display(now - Duration::hours(36)), "2d ago");
        // Clock skew
        assert_eq!(age_display(now + Duration::minutes(10)), "just now");
    }

    #[tokio::test]
    async fn test_put_then_match_round_trip() {
        let (_dir, storage) = storage();
        let k = key("http://hub.lan/services.json");
        let mut response = Response::new(200, b"[]".to_vec());
        response.headers.push(("content-type".into(), "application/json".into()));

        storage.put("homelab-v3", &k, &response).await.unwrap();

        let cached = storage.match_request("homelab-v3", &k).await.unwrap().unwrap();
        assert_eq!(cached.data.key, "GET http://hub.lan/services.json");
        let restored = cached.into_response().unwrap();
        assert_eq!(restored.status, 200);
        assert_eq!(restored.body, b"[]");
        assert_eq!(restored.header("Content-Type"), Some("application/json"));
        assert!(restored.cached_at.is_some());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_identity() {
        let (_dir, storage) = storage();
        let k = key("http://hub.lan/services.json");

        storage.put("v1", &k, &Response::new(200, "old")).await.unwrap();
        storage.put("v1", &k, &Response::new(200, "new")).await.unwrap();

        let restored = storage
            .match_request("v1", &k)
            .await
            .unwrap()
            .unwrap()
            .into_response()
            .unwrap();
        assert_eq!(restored.text(), "new");
    }

    #[tokio::test]
    async fn test_generations_are_isolated() {
        let (_dir, storage) = storage();
        let k = key("http://hub.lan/style.css");
        storage.put("v1", &k, &Response::new(200, "body{}")).await.unwrap();

        assert!(storage.match_request("v2", &k).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_and_delete() {
        let (_dir, storage) = storage();
        storage.open("homelab-v2").await.unwrap();
        storage.open("homelab-v3").await.unwrap();
        // Opening twice is harmless
        storage.open("homelab-v3").await.unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["homelab-v2", "homelab-v3"]);

        assert!(storage.delete("homelab-v2").await.unwrap());
        assert!(!storage.delete("homelab-v2").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["homelab-v3"]);
    }

    #[tokio::test]
    async fn test_binary_body_survives() {
        let (_dir, storage) = storage();
        let k = key("http://hub.lan/icon.png");
        let body: Vec<u8> = (0u8..=255).collect();
        storage.put("v1", &k, &Response::new(200, body.clone())).await.unwrap();

        let restored = storage
            .match_request("v1", &k)
            .await
            .unwrap()
            .unwrap()
            .into_response()
            .unwrap();
        assert_eq!(restored.body, body);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_puts_replace_entry_whole() {
        let (_dir, storage) = storage();
        let storage = Arc::new(storage);
        let k = key("http://hub.lan/services.json");
        let bodies: Vec<String> = (1..=8).map(|i| "x".repeat(i * 1000)).collect();

        for _ in 0..25 {
            let writes = bodies.iter().cloned().map(|body| {
                let storage = Arc::clone(&storage);
                let k = k.clone();
                tokio::spawn(async move { storage.put("v1", &k, &Response::new(200, body)).await })
            });
            for write in futures::future::join_all(writes).await {
                write.unwrap().unwrap();
            }

            let restored = storage
                .match_request("v1", &k)
                .await
                .unwrap()
                .unwrap()
                .into_response()
                .unwrap();
            assert!(bodies.contains(&restored.text()));
        }

        // No temp files left next to the entry
        let entries = std::fs::read_dir(storage.generation_dir("v1")).unwrap().count();
        assert_eq!(entries, 1);
    }
}
