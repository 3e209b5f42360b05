//! Offline cache gatekeeper.
//!
//! The gatekeeper intercepts every fetch the dashboard makes. Dynamic
//! resources (the service catalog) are resolved network-first so edits show
//! up immediately; everything else is cache-first. Cached responses live in
//! named generations, and activating a new generation purges the old ones.
//!
//! - `strategy`: pure request classification and cache keys
//! - `storage`: the generation-scoped cache store
//! - `worker`: the install / activate / fetch lifecycle

pub mod storage;
pub mod strategy;
pub mod worker;

pub use storage::{age_display, CacheStorage, CachedData, DiskCacheStorage, StoredResponse};
pub use strategy::{classify, RequestKey, Strategy};
pub use worker::{Gatekeeper, WorkerState};
