//! Static page configuration
//!
//! The page list is fixed at process start and never mutated at runtime.
//! `PAGECHAT_PAGES` may name a JSON file containing an array of page
//! entries; otherwise the compiled-in defaults are used.

use serde::{Deserialize, Serialize};

/// A configured chat page: a display label and the webhook that answers it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageConfig {
    pub id: String,
    pub name: String,
    pub webhook_url: String,
}

/// Ordered, immutable set of pages
#[derive(Debug, Clone)]
pub struct Pages {
    pages: Vec<PageConfig>,
}

impl Pages {
    pub fn new(pages: Vec<PageConfig>) -> Self {
        Self { pages }
    }

    /// Load from the file named by `PAGECHAT_PAGES`, falling back to the
    /// compiled-in defaults if unset or unreadable.
    pub fn from_env() -> Self {
        if let Ok(path) = std::env::var("PAGECHAT_PAGES") {
            match std::fs::read_to_string(&path) {
                Ok(raw) => match serde_json::from_str::<Vec<PageConfig>>(&raw) {
                    Ok(pages) if !pages.is_empty() => {
                        tracing::info!(path = %path, count = pages.len(), "Loaded page configuration");
                        return Self::new(pages);
                    }
                    Ok(_) => {
                        tracing::warn!(path = %path, "Page configuration is empty, using defaults");
                    }
                    Err(e) => {
                        tracing::warn!(path = %path, error = %e, "Invalid page configuration, using defaults");
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "Cannot read page configuration, using defaults");
                }
            }
        }
        Self::new(default_pages())
    }

    pub fn all(&self) -> &[PageConfig] {
        &self.pages
    }

    pub fn get(&self, id: &str) -> Option<&PageConfig> {
        self.pages.iter().find(|p| p.id == id)
    }
}

fn default_pages() -> Vec<PageConfig> {
    let entries = [
        ("page1", "الصفحة الأولى"),
        ("page2", "الصفحة الثانية"),
        ("page3", "الصفحة الثالثة"),
        ("page4", "الصفحة الرابعة"),
        ("page5", "الصفحة الخامسة"),
    ];
    entries
        .iter()
        .map(|(id, name)| PageConfig {
            id: (*id).to_string(),
            name: (*name).to_string(),
            webhook_url: format!("https://your-n8n-instance.com/webhook/{id}"),
        })
        .collect()
}
