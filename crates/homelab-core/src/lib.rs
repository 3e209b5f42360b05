//! Core library for homelab-hub.
//!
//! Loads a static catalog of homelab services, decides which of them the
//! dashboard shows (tab view or global search), and routes every fetch
//! through an offline cache gatekeeper so the catalog keeps loading when the
//! network does not.
//!
//! - `catalog`: tab/search state machine and the catalog loader
//! - `gatekeeper`: versioned cache generations, network-first/cache-first policy
//! - `net`: the `Fetch` boundary and its reqwest implementation
//! - `models`: the `Service` record
//! - `config`: file and environment configuration

pub mod catalog;
pub mod config;
pub mod error;
pub mod gatekeeper;
pub mod models;
pub mod net;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
