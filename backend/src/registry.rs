//! App registry: read-only configuration describing which apps meter
//! usage via credits and their monthly allotment.
//!
//! The registry is owned and maintained outside this core; we load it
//! once at startup from a JSON file keyed by app id.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Configuration for a single app in the tool directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppEntry {
    /// Whether the app meters usage via credits
    pub has_credits: bool,
    /// Credits granted per period when a balance record is first created
    #[serde(default)]
    pub monthly_allotment: i64,
}

/// Read-only lookup table keyed by app id.
#[derive(Debug, Clone, Default)]
pub struct AppRegistry {
    apps: HashMap<String, AppEntry>,
}

impl AppRegistry {
    /// Load the registry from a JSON file of the form
    /// `{ "paco": { "has_credits": true, "monthly_allotment": 500 } }`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read app registry at {}", path.display()))?;
        let apps: HashMap<String, AppEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid app registry JSON at {}", path.display()))?;
        Ok(Self { apps })
    }

    /// Build a registry from literal entries (used by tests)
    pub fn from_entries(entries: impl IntoIterator<Item = (String, AppEntry)>) -> Self {
        Self {
            apps: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, app_id: &str) -> Option<&AppEntry> {
        self.apps.get(app_id)
    }
}
