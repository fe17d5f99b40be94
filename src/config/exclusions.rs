//! Domain exclusion sets.
//!
//! The exclusion file groups domain substrings by category purely for the
//! maintainer's benefit; at load time all categories are flattened into one
//! lowercase set that stays immutable for the process lifetime.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

/// Flattened set of lowercase URL substrings to reject.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    substrings: Vec<String>,
}

impl ExclusionSet {
    /// Build a set from a category -> substrings mapping.
    ///
    /// Substrings are lowercased and deduplicated; blank entries are dropped.
    #[must_use]
    pub fn from_categories(categories: HashMap<String, Vec<String>>) -> Self {
        let mut substrings: Vec<String> = Vec::new();
        for (category, entries) in categories {
            debug!(category, count = entries.len(), "loading exclusion category");
            for entry in entries {
                let entry = entry.trim().to_lowercase();
                if entry.is_empty() || substrings.contains(&entry) {
                    continue;
                }
                substrings.push(entry);
            }
        }
        Self { substrings }
    }

    /// Build a set from raw substrings, for callers that have no categories.
    #[must_use]
    pub fn from_substrings(entries: impl IntoIterator<Item = String>) -> Self {
        let mut categories = HashMap::new();
        categories.insert(String::new(), entries.into_iter().collect());
        Self::from_categories(categories)
    }

    /// Load an exclusion file, degrading to an empty set on any failure.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "exclusion list unreadable, continuing without exclusions"
                );
                return Self::default();
            }
        };

        match serde_json::from_str::<HashMap<String, Vec<String>>>(&raw) {
            Ok(categories) => Self::from_categories(categories),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "exclusion list malformed, continuing without exclusions"
                );
                Self::default()
            }
        }
    }

    /// Return the first configured substring that matches `url`,
    /// case-insensitively.
    #[must_use]
    pub fn matches(&self, url: &str) -> Option<&str> {
        if self.substrings.is_empty() {
            return None;
        }
        let url = url.to_lowercase();
        self.substrings
            .iter()
            .find(|s| url.contains(s.as_str()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.substrings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.substrings.is_empty()
    }
}
