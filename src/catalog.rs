//! Bundled prompt catalog.
//!
//! The catalog is a JSON array of `{ "category": ..., "text": ... }` records. A
//! copy ships inside the binary; an override file can replace it at startup.

use crate::types::Category;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const BUNDLED_CATALOG: &str = include_str!("../assets/catalog.json");

/// Used when a catalog leaves a category without any prompt
const FALLBACK_TRUTHS: &[&str] = &[
    "What is your biggest fear?",
    "Have you ever cheated?",
    "What's a secret you never told anyone?",
];
const FALLBACK_DARES: &[&str] = &[
    "Do a silly dance!",
    "Speak like a robot for 1 minute!",
    "Sing the chorus of your favorite song!",
];

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub category: Category,
    pub text: String,
}

/// Normalized set of built-in prompts
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Parse a catalog from its JSON text
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let raw: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(raw))
    }

    /// Read and parse a catalog file
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// The catalog compiled into the binary
    pub fn bundled() -> Self {
        Self::from_json(BUNDLED_CATALOG).unwrap_or_else(|e| {
            tracing::error!("Bundled catalog is invalid: {}", e);
            Self::from_entries(Vec::new())
        })
    }

    /// Load the override catalog if one is configured, falling back to the bundled copy
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::bundled();
        };

        match Self::from_path(path) {
            Ok(catalog) => {
                tracing::info!(
                    path = %path.display(),
                    count = catalog.len(),
                    "Loaded prompt catalog"
                );
                catalog
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load prompt catalog, using bundled prompts"
                );
                Self::bundled()
            }
        }
    }

    /// Trim, drop blanks and duplicates, then make sure both categories are populated
    pub fn from_entries(raw: Vec<CatalogEntry>) -> Self {
        let mut seen: HashSet<(Category, String)> = HashSet::new();
        let mut entries = Vec::with_capacity(raw.len());

        for entry in raw {
            let text = entry.text.trim();
            if text.is_empty() {
                continue;
            }
            if seen.insert((entry.category, text.to_string())) {
                entries.push(CatalogEntry {
                    category: entry.category,
                    text: text.to_string(),
                });
            }
        }

        for category in Category::ALL {
            if entries.iter().any(|e| e.category == category) {
                continue;
            }
            tracing::warn!(%category, "Catalog has no prompts for category, using fallback set");
            let fallback = match category {
                Category::Truth => FALLBACK_TRUTHS,
                Category::Dare => FALLBACK_DARES,
            };
            entries.extend(fallback.iter().map(|text| CatalogEntry {
                category,
                text: (*text).to_string(),
            }));
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Prompt texts for one category in catalog order
    pub fn texts(&self, category: Category) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(move |e| e.category == category)
            .map(|e| e.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
