//! Service catalog: loading `services.json` and deciding what the grid shows.
//!
//! - `state`: the tab/search state machine and its pure view
//! - `loader`: cache-busted fetch and parse through any [`Fetch`](crate::net::Fetch)

pub mod loader;
pub mod state;

pub use loader::{cache_busted, load_services, parse_services, LoadedCatalog};
pub use state::{
    filter_services, normalize_query, Card, Catalog, CatalogView, Grid, LoadState, LoadToken,
    Message, Mode, LOAD_ERROR_TEXT,
};
