//! Application state management for homelab-hub.
//!
//! `App` wraps the catalog state machine with the terminal-side state: which
//! widget has focus, the raw search input, card selection, header clock, and
//! the channel that brings background catalog loads back to the UI loop.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use url::Url;

use homelab_core::catalog::{self, Catalog, CatalogView, LoadToken, LoadedCatalog, Message, Mode};
use homelab_core::config::Config;
use homelab_core::gatekeeper::age_display;
use homelab_core::net::Fetch;
use homelab_core::utils::{format_clock, greeting};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background load channel.
/// Loads are user-triggered, so a handful in flight is already a lot.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for search input.
const MAX_SEARCH_LENGTH: usize = 64;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    /// The search field has focus.
    Searching,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// One entry of the tab bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabEntry {
    pub key: String,
    pub label: String,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Completed catalog loads, sent from the spawned load task.
enum LoadResult {
    Loaded(LoadToken, LoadedCatalog),
    Failed(LoadToken, String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub config: Config,
    services_url: Url,
    fetcher: Arc<dyn Fetch>,

    pub catalog: Catalog,

    // UI State
    pub state: AppState,
    pub search_input: String,
    pub selection: usize,
    /// Card columns in the last rendered grid; drives up/down navigation.
    pub grid_columns: usize,

    // Header
    pub greeting: &'static str,
    pub clock: String,
    clock_minute: Option<i64>,

    // Background task channel
    load_rx: mpsc::Receiver<LoadResult>,
    load_tx: mpsc::Sender<LoadResult>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: Config, fetcher: Arc<dyn Fetch>) -> Result<Self> {
        let services_url = config.services_url()?;
        let catalog = Catalog::new(config.default_tab.clone());
        let (load_tx, load_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            config,
            services_url,
            fetcher,
            catalog,

            state: AppState::Normal,
            search_input: String::new(),
            selection: 0,
            grid_columns: 1,

            greeting: "Welcome",
            clock: String::new(),
            clock_minute: None,

            load_rx,
            load_tx,

            status_message: None,
        })
    }

    // =========================================================================
    // Catalog Loading
    // =========================================================================

    /// Spawn a background load of `services.json`.
    ///
    /// Repeated calls each run to completion; only the newest one is applied.
    pub fn load_services(&mut self) {
        let token = self.catalog.begin_load();
        info!(?token, url = %self.services_url, "Loading services");

        let fetcher = Arc::clone(&self.fetcher);
        let url = self.services_url.clone();
        let param = self.config.cache.cache_bust_param.clone();
        let tx = self.load_tx.clone();

        tokio::spawn(async move {
            let result = match catalog::load_services(fetcher.as_ref(), &url, &param).await {
                Ok(loaded) => LoadResult::Loaded(token, loaded),
                Err(e) => LoadResult::Failed(token, e.to_string()),
            };
            if tx.send(result).await.is_err() {
                error!("Failed to send load result - channel closed");
            }
        });

        self.status_message = Some("Loading services...".to_string());
    }

    /// Apply any loads that finished since the last call.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.load_rx.try_recv() {
            self.process_load_result(result);
        }
    }

    fn process_load_result(&mut self, result: LoadResult) {
        match result {
            LoadResult::Loaded(token, loaded) => {
                let count = loaded.services.len();
                let cached_at = loaded.cached_at;
                let applied = self.catalog.update(Message::LoadSucceeded {
                    token,
                    services: loaded.services,
                    cached_at,
                });
                if applied {
                    self.clamp_selection();
                    self.status_message = match cached_at {
                        Some(at) => Some(format!("Offline - catalog cached {}", age_display(at))),
                        None => None,
                    };
                    info!(count, from_cache = cached_at.is_some(), "Services loaded");
                }
            }
            LoadResult::Failed(token, message) => {
                if self.catalog.update(Message::LoadFailed {
                    token,
                    error: message.clone(),
                }) {
                    error!(error = %message, "Failed to load services");
                    self.selection = 0;
                    self.status_message = Some(format!("Error loading configuration: {}", message));
                }
            }
        }
    }

    // =========================================================================
    // Tabs
    // =========================================================================

    /// Tab bar entries: configured tabs, or tab keys found in the catalog.
    pub fn tabs(&self) -> Vec<TabEntry> {
        if !self.config.tabs.is_empty() {
            return self
                .config
                .tabs
                .iter()
                .map(|t| TabEntry {
                    key: t.key.clone(),
                    label: t.label().to_string(),
                })
                .collect();
        }
        self.catalog
            .tab_keys()
            .into_iter()
            .map(|key| TabEntry {
                key: key.to_string(),
                label: key.to_string(),
            })
            .collect()
    }

    /// Switch tab. Always drops the search, even for the current tab.
    pub fn select_tab(&mut self, key: &str) {
        debug!(tab = key, "Tab selected");
        self.catalog.set_tab(key);
        self.search_input.clear();
        self.selection = 0;
        self.status_message = None;
        if self.state == AppState::Searching {
            self.state = AppState::Normal;
        }
    }

    pub fn select_tab_index(&mut self, index: usize) {
        if let Some(tab) = self.tabs().get(index) {
            let key = tab.key.clone();
            self.select_tab(&key);
        }
    }

    pub fn next_tab(&mut self) {
        self.cycle_tab(1);
    }

    pub fn prev_tab(&mut self) {
        self.cycle_tab(-1);
    }

    fn cycle_tab(&mut self, step: isize) {
        let tabs = self.tabs();
        if tabs.is_empty() {
            return;
        }
        let len = tabs.len() as isize;
        let next = match tabs.iter().position(|t| t.key == self.catalog.current_tab()) {
            Some(i) => (i as isize + step).rem_euclid(len),
            None => 0,
        };
        let key = tabs[next as usize].key.clone();
        self.select_tab(&key);
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Give the search field focus.
    pub fn focus_search(&mut self) {
        self.state = AppState::Searching;
    }

    pub fn push_search_char(&mut self, c: char) {
        if can_add_search_char(self.search_input.chars().count(), c) {
            self.search_input.push(c);
            self.apply_search();
        }
    }

    pub fn pop_search_char(&mut self) {
        if self.search_input.pop().is_some() {
            self.apply_search();
        }
    }

    pub fn clear_search(&mut self) {
        self.search_input.clear();
        self.apply_search();
    }

    fn apply_search(&mut self) {
        self.catalog.set_query(self.search_input.as_str());
        self.selection = 0;
        self.status_message = None;
    }

    // =========================================================================
    // Grid
    // =========================================================================

    pub fn view(&self) -> CatalogView {
        self.catalog.view()
    }

    pub fn is_searching(&self) -> bool {
        self.catalog.mode() == Mode::Search
    }

    fn visible_count(&self) -> usize {
        self.catalog.visible().len()
    }

    fn clamp_selection(&mut self) {
        let count = self.visible_count();
        if self.selection >= count {
            self.selection = count.saturating_sub(1);
        }
    }

    /// Move the card selection by whole columns/rows, staying in bounds.
    pub fn move_selection(&mut self, dx: isize, dy: isize) {
        let count = self.visible_count();
        if count == 0 {
            self.selection = 0;
            return;
        }
        let columns = self.grid_columns.max(1) as isize;
        let target = self.selection as isize + dx + dy * columns;
        if (0..count as isize).contains(&target) {
            self.selection = target as usize;
        }
    }

    pub fn selected_url(&self) -> Option<String> {
        self.catalog
            .visible()
            .get(self.selection)
            .map(|s| s.url.clone())
    }

    /// Open the selected service in the system browser.
    pub fn open_selected(&mut self) {
        let Some(url) = self.selected_url() else {
            return;
        };
        match open::that_detached(&url) {
            Ok(()) => {
                info!(url = %url, "Opened service");
                self.status_message = Some(format!("Opened {}", url));
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to open service");
                self.status_message = Some(format!("Could not open {}: {}", url, e));
            }
        }
    }

    // =========================================================================
    // Header
    // =========================================================================

    /// Refresh greeting and clock when the minute changes.
    pub fn tick<Tz: TimeZone>(&mut self, now: DateTime<Tz>)
    where
        Tz::Offset: std::fmt::Display,
    {
        let minute = now.timestamp().div_euclid(60);
        if self.clock_minute == Some(minute) {
            return;
        }
        self.clock_minute = Some(minute);
        self.greeting = greeting(&now);
        self.clock = format_clock(&now);
    }

    pub fn tick_local(&mut self) {
        self.tick(Local::now());
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a search character should be accepted
pub fn can_add_search_char(current_len: usize, c: char) -> bool {
    current_len < MAX_SEARCH_LENGTH && !c.is_control()
}

// ============================================================================
// Tests
// ============================================================================
