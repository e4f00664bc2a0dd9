use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One statically configured affiliate product.
///
/// `title` and `image_url` are only used for degraded-mode rendering when
/// the live marketplace fetch is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffiliateEntry {
    pub item_id: String,
    pub affiliate_link: String,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<AffiliateEntry>,
}

/// The static id → affiliate-link mapping, indexed for lookup by item id.
///
/// Entry order is preserved: the carousel renders offers in catalog order
/// when no explicit id list is given.
#[derive(Debug, Clone, Default)]
pub struct AffiliateCatalog {
    entries: Vec<AffiliateEntry>,
    by_id: HashMap<String, usize>,
}

impl AffiliateCatalog {
    #[must_use]
    pub fn new(entries: Vec<AffiliateEntry>) -> Self {
        let by_id = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.item_id.clone(), i))
            .collect();
        Self { entries, by_id }
    }

    #[must_use]
    pub fn get(&self, item_id: &str) -> Option<&AffiliateEntry> {
        self.by_id.get(item_id).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn contains(&self, item_id: &str) -> bool {
        self.by_id.contains_key(item_id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &AffiliateEntry> {
        self.entries.iter()
    }

    /// All configured item ids, in catalog order.
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.item_id.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Load and validate the affiliate catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<AffiliateCatalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: CatalogFile = serde_yaml::from_str(&content)?;
    validate_entries(&file.products)?;

    Ok(AffiliateCatalog::new(file.products))
}

fn validate_entries(entries: &[AffiliateEntry]) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::new();

    for entry in entries {
        if entry.item_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "item_id must be non-empty".to_string(),
            ));
        }

        if !seen.insert(entry.item_id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate item_id: '{}'",
                entry.item_id
            )));
        }

        if !entry.affiliate_link.starts_with("https://")
            && !entry.affiliate_link.starts_with("http://")
        {
            return Err(ConfigError::Validation(format!(
                "item '{}' has a non-http(s) affiliate_link: '{}'",
                entry.item_id, entry.affiliate_link
            )));
        }
    }

    Ok(())
}
