use serde::{Deserialize, Serialize};

use crate::utils::contains_ignore_case;

/// Icon shown for services that do not name one.
pub const DEFAULT_ICON: &str = "web";

/// One catalog entry, as listed in `services.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Service {
    pub name: String,
    pub description: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Service {
    /// Icon identifier with the fallback applied (empty counts as absent).
    pub fn icon(&self) -> &str {
        self.icon
            .as_deref()
            .filter(|icon| !icon.is_empty())
            .unwrap_or(DEFAULT_ICON)
    }

    /// Tab-mode membership. Services without a tab never match.
    pub fn in_tab(&self, tab: &str) -> bool {
        self.tab.as_deref() == Some(tab)
    }

    /// Search-mode membership. Query should already be lowercased.
    pub fn matches_query(&self, query: &str) -> bool {
        contains_ignore_case(&self.name, query)
            || contains_ignore_case(&self.description, query)
            || self.keywords.iter().any(|k| contains_ignore_case(k, query))
    }
}
