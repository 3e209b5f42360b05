//! Catalog filter/render state machine.
//!
//! `Catalog` owns the loaded services, the active tab, and the search query.
//! Every user action or load completion is one [`Message`] applied through
//! [`Catalog::update`]; what the grid shows is always recomputed from the
//! state by [`Catalog::view`], never stored.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::Service;

/// Placeholder shown in the grid when the catalog could not be loaded.
pub const LOAD_ERROR_TEXT: &str = "Unable to load services. Check the services URL and try again.";

/// Identifies one `load_services` call so late results can be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadToken(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Which filtering rule is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Empty query: show the current tab.
    Tab,
    /// Non-empty query: search every service, ignoring tabs.
    Search,
}

/// Display data for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub url: String,
}

impl From<&Service> for Card {
    fn from(service: &Service) -> Self {
        Self {
            title: service.name.clone(),
            description: service.description.clone(),
            icon: service.icon().to_string(),
            url: service.url.clone(),
        }
    }
}

/// What the grid region shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grid {
    Cards(Vec<Card>),
    NoResults,
    LoadError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogView {
    pub mode: Mode,
    pub grid: Grid,
    /// "Found N service(s) globally" in search mode, `None` in tab mode.
    pub status: Option<String>,
}

/// State transitions.
#[derive(Debug, Clone)]
pub enum Message {
    SelectTab(String),
    SetQuery(String),
    LoadSucceeded {
        token: LoadToken,
        services: Vec<Service>,
        cached_at: Option<DateTime<Utc>>,
    },
    LoadFailed {
        token: LoadToken,
        error: String,
    },
}

#[derive(Debug, Clone)]
pub struct Catalog {
    services: Vec<Service>,
    current_tab: String,
    query: String,
    load: LoadState,
    latest_token: u64,
    cached_at: Option<DateTime<Utc>>,
    /// The grid shows the load error until the next recompute.
    show_error: bool,
}

/// Normalize raw search input: trimmed and lowercased.
pub fn normalize_query(text: &str) -> String {
    text.trim().to_lowercase()
}

/// The filtering rule. `query` must be normalized.
///
/// A non-empty query selects services whose name, description, or keywords
/// contain it, regardless of tab. An empty query selects the services of
/// `tab`. Original order is kept either way.
pub fn filter_services<'a>(services: &'a [Service], tab: &str, query: &str) -> Vec<&'a Service> {
    if query.is_empty() {
        services.iter().filter(|s| s.in_tab(tab)).collect()
    } else {
        services.iter().filter(|s| s.matches_query(query)).collect()
    }
}

impl Catalog {
    pub fn new(default_tab: impl Into<String>) -> Self {
        Self {
            services: Vec::new(),
            current_tab: default_tab.into(),
            query: String::new(),
            load: LoadState::Idle,
            latest_token: 0,
            cached_at: None,
            show_error: false,
        }
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn current_tab(&self) -> &str {
        &self.current_tab
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    /// When the current list was served from the offline cache, its age.
    pub fn cached_at(&self) -> Option<DateTime<Utc>> {
        self.cached_at
    }

    pub fn mode(&self) -> Mode {
        if self.query.is_empty() {
            Mode::Tab
        } else {
            Mode::Search
        }
    }

    /// Apply one transition. Returns true when the view may have changed.
    pub fn update(&mut self, message: Message) -> bool {
        match message {
            Message::SelectTab(tab) => {
                self.current_tab = tab;
                self.query.clear();
                self.show_error = false;
                true
            }
            Message::SetQuery(text) => {
                self.query = normalize_query(&text);
                self.show_error = false;
                true
            }
            Message::LoadSucceeded {
                token,
                services,
                cached_at,
            } => {
                if !self.is_current(token) {
                    debug!(?token, latest = self.latest_token, "Ignoring superseded load");
                    return false;
                }
                debug!(count = services.len(), from_cache = cached_at.is_some(), "Catalog loaded");
                self.services = services;
                self.cached_at = cached_at;
                self.load = LoadState::Loaded;
                self.show_error = false;
                true
            }
            Message::LoadFailed { token, error } => {
                if !self.is_current(token) {
                    debug!(?token, latest = self.latest_token, "Ignoring superseded load failure");
                    return false;
                }
                self.load = LoadState::Failed(error);
                self.show_error = true;
                true
            }
        }
    }

    /// Start a load. Only the most recent token's result is applied.
    pub fn begin_load(&mut self) -> LoadToken {
        self.latest_token += 1;
        self.load = LoadState::Loading;
        LoadToken(self.latest_token)
    }

    fn is_current(&self, token: LoadToken) -> bool {
        token.0 == self.latest_token
    }

    pub fn set_tab(&mut self, tab: impl Into<String>) -> bool {
        self.update(Message::SelectTab(tab.into()))
    }

    pub fn set_query(&mut self, text: impl Into<String>) -> bool {
        self.update(Message::SetQuery(text.into()))
    }

    /// Services currently visible, in catalog order.
    pub fn visible(&self) -> Vec<&Service> {
        filter_services(&self.services, &self.current_tab, &self.query)
    }

    /// Distinct tab keys in order of first appearance.
    pub fn tab_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for tab in self.services.iter().filter_map(|s| s.tab.as_deref()) {
            if !keys.contains(&tab) {
                keys.push(tab);
            }
        }
        keys
    }

    pub fn view(&self) -> CatalogView {
        let mode = self.mode();

        if self.show_error {
            return CatalogView {
                mode,
                grid: Grid::LoadError(LOAD_ERROR_TEXT.to_string()),
                status: None,
            };
        }

        let visible = self.visible();
        let status = match mode {
            Mode::Search => Some(format!("Found {} service(s) globally", visible.len())),
            Mode::Tab => None,
        };
        let grid = if visible.is_empty() {
            Grid::NoResults
        } else {
            Grid::Cards(visible.into_iter().map(Card::from).collect())
        };

        CatalogView { mode, grid, status }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn service(name: &str, tab: Option<&str>, description: &str, keywords: &[&str]) -> Service {
        Service {
            name: name.to_string(),
            description: description.to_string(),
            url: format!("http://{}.lan", name.to_lowercase()),
            icon: None,
            tab: tab.map(str::to_string),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn plex_and_pihole() -> Vec<Service> {
        vec![
            service("Plex", Some("library"), "Media server", &[]),
            service("Pi-hole", Some("network"), "DNS sinkhole", &[]),
        ]
    }

    fn homelab() -> Vec<Service> {
        vec![
            service("Plex", Some("library"), "Media server", &["movies"]),
            service("Pi-hole", Some("network"), "DNS sinkhole", &["adblock"]),
            service("Jellyfin", Some("library"), "Open media system", &[]),
            service("Unbound", Some("network"), "Recursive resolver", &["dns"]),
            service("Scratchpad", None, "Loose notes", &[]),
            service("Audiobookshelf", Some("library"), "Audiobooks", &[]),
        ]
    }

    fn loaded(services: Vec<Service>, tab: &str) -> Catalog {
        let mut catalog = Catalog::new(tab);
        let token = catalog.begin_load();
        catalog.update(Message::LoadSucceeded {
            token,
            services,
            cached_at: None,
        });
        catalog
    }

    fn names(catalog: &Catalog) -> Vec<&str> {
        catalog.visible().iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_plex_pihole_example() {
        let mut catalog = loaded(plex_and_pihole(), "network");

        catalog.set_tab("library");
        assert_eq!(names(&catalog), vec!["Plex"]);

        catalog.set_query("dns");
        assert_eq!(names(&catalog), vec!["Pi-hole"]);

        catalog.set_query("");
        assert_eq!(catalog.mode(), Mode::Tab);
        assert_eq!(names(&catalog), vec!["Plex"]);
    }

    #[test]
    fn test_tab_mode_keeps_catalog_order() {
        let catalog = loaded(homelab(), "library");
        assert_eq!(names(&catalog), vec!["Plex", "Jellyfin", "Audiobookshelf"]);
    }

    #[test]
    fn test_tabless_services_never_match_tab_mode() {
        let mut catalog = loaded(homelab(), "library");
        for tab in ["library", "network", ""] {
            catalog.set_tab(tab);
            assert!(!names(&catalog).contains(&"Scratchpad"));
        }
        // ...but search still finds them
        catalog.set_query("notes");
        assert_eq!(names(&catalog), vec!["Scratchpad"]);
    }

    #[test]
    fn test_search_ignores_tab_and_matches_all_fields() {
        let mut catalog = loaded(homelab(), "library");

        // keyword on a network service, description on another
        catalog.set_query("DNS");
        assert_eq!(names(&catalog), vec!["Pi-hole", "Unbound"]);

        catalog.set_query("media");
        assert_eq!(names(&catalog), vec!["Plex", "Jellyfin"]);

        catalog.set_query("adblock");
        assert_eq!(names(&catalog), vec!["Pi-hole"]);
    }

    #[test]
    fn test_query_is_trimmed_and_lowercased() {
        let mut catalog = loaded(homelab(), "network");
        catalog.set_query("  JELLY  ");
        assert_eq!(catalog.query(), "jelly");
        assert_eq!(names(&catalog), vec!["Jellyfin"]);

        // Whitespace-only is an empty query: back to tab mode
        catalog.set_query("   ");
        assert_eq!(catalog.mode(), Mode::Tab);
        assert_eq!(names(&catalog), vec!["Pi-hole", "Unbound"]);
    }

    #[test]
    fn test_every_search_result_matches() {
        let mut catalog = loaded(homelab(), "library");
        for query in ["e", "o", "dns", "server", "zzz", "-"] {
            catalog.set_query(query);
            for service in catalog.visible() {
                assert!(service.matches_query(query), "{} should not match {}", service.name, query);
            }
            let expected = homelab().iter().filter(|s| s.matches_query(query)).count();
            assert_eq!(catalog.visible().len(), expected);
        }
    }

    #[test]
    fn test_select_tab_clears_query_idempotently() {
        let mut catalog = loaded(homelab(), "library");

        catalog.set_query("dns");
        catalog.set_tab("network");
        assert_eq!(catalog.query(), "");
        let first = names(&catalog).join(",");

        catalog.set_query("plex");
        catalog.set_tab("network");
        assert_eq!(catalog.query(), "");
        assert_eq!(names(&catalog).join(","), first);
    }

    #[test]
    fn test_view_status_line() {
        let mut catalog = loaded(homelab(), "library");
        assert_eq!(catalog.view().status, None);

        catalog.set_query("dns");
        let view = catalog.view();
        assert_eq!(view.mode, Mode::Search);
        assert_eq!(view.status.as_deref(), Some("Found 2 service(s) globally"));

        catalog.set_query("nothing-matches");
        let view = catalog.view();
        assert_eq!(view.grid, Grid::NoResults);
        assert_eq!(view.status.as_deref(), Some("Found 0 service(s) globally"));
    }

    #[test]
    fn test_view_cards_apply_icon_fallback() {
        let mut services = plex_and_pihole();
        services[0].icon = Some("movie".into());
        let catalog = loaded(services, "library");

        match catalog.view().grid {
            Grid::Cards(cards) => {
                assert_eq!(cards.len(), 1);
                assert_eq!(cards[0].title, "Plex");
                assert_eq!(cards[0].icon, "movie");
                assert_eq!(cards[0].url, "http://plex.lan");
            }
            other => panic!("expected cards, got {:?}", other),
        }

        let catalog = loaded(plex_and_pihole(), "network");
        match catalog.view().grid {
            Grid::Cards(cards) => assert_eq!(cards[0].icon, "web"),
            other => panic!("expected cards, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_tab_renders_no_results() {
        let catalog = loaded(homelab(), "automation");
        assert_eq!(catalog.view().grid, Grid::NoResults);
    }

    #[test]
    fn test_failed_load_keeps_services_and_shows_error() {
        let mut catalog = loaded(plex_and_pihole(), "library");

        let token = catalog.begin_load();
        assert_eq!(catalog.load_state(), &LoadState::Loading);
        catalog.update(Message::LoadFailed {
            token,
            error: "connection refused".into(),
        });

        assert_eq!(catalog.services().len(), 2);
        assert_eq!(catalog.load_state(), &LoadState::Failed("connection refused".into()));
        assert_eq!(catalog.view().grid, Grid::LoadError(LOAD_ERROR_TEXT.to_string()));

        // The next successful load replaces the list and the placeholder
        let token = catalog.begin_load();
        catalog.update(Message::LoadSucceeded {
            token,
            services: vec![service("Grafana", Some("library"), "Dashboards", &[])],
            cached_at: None,
        });
        assert_eq!(names(&catalog), vec!["Grafana"]);
        assert!(matches!(catalog.view().grid, Grid::Cards(ref cards) if cards.len() == 1));
    }

    #[test]
    fn test_user_action_replaces_error_placeholder() {
        let mut catalog = loaded(plex_and_pihole(), "library");
        let token = catalog.begin_load();
        catalog.update(Message::LoadFailed {
            token,
            error: "timeout".into(),
        });

        catalog.set_tab("network");
        assert!(matches!(catalog.view().grid, Grid::Cards(_)));
        // The failure is still reported
        assert!(matches!(catalog.load_state(), LoadState::Failed(_)));
    }

    #[test]
    fn test_superseded_load_is_ignored() {
        let mut catalog = Catalog::new("library");
        let first = catalog.begin_load();
        let second = catalog.begin_load();

        assert!(catalog.update(Message::LoadSucceeded {
            token: second,
            services: plex_and_pihole(),
            cached_at: None,
        }));
        // The older request resolves last and must not overwrite
        assert!(!catalog.update(Message::LoadSucceeded {
            token: first,
            services: Vec::new(),
            cached_at: None,
        }));
        assert!(!catalog.update(Message::LoadFailed {
            token: first,
            error: "late".into(),
        }));

        assert_eq!(catalog.services().len(), 2);
        assert_eq!(catalog.load_state(), &LoadState::Loaded);
    }

    #[test]
    fn test_tab_keys_first_appearance_order() {
        let catalog = loaded(homelab(), "library");
        assert_eq!(catalog.tab_keys(), vec!["library", "network"]);
    }

    #[test]
    fn test_cached_at_tracks_last_load() {
        let mut catalog = Catalog::new("library");
        let stamp = Utc::now();
        let token = catalog.begin_load();
        catalog.update(Message::LoadSucceeded {
            token,
            services: plex_and_pihole(),
            cached_at: Some(stamp),
        });
        assert_eq!(catalog.cached_at(), Some(stamp));

        let token = catalog.begin_load();
        catalog.update(Message::LoadSucceeded {
            token,
            services: plex_and_pihole(),
            cached_at: None,
        });
        assert_eq!(catalog.cached_at(), None);
    }
}
