//! Data models for the service catalog.
//!
//! - `Service`: one linked tool/application from `services.json`

pub mod service;

pub use service::{Service, DEFAULT_ICON};
