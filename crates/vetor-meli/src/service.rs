//! Offer resolution orchestration: fetch → normalize → fallback.

use vetor_core::AffiliateCatalog;

use crate::client::MeliClient;
use crate::fallback::{fallback_catalog_offers, fallback_offers};
use crate::normalize::normalize;
use crate::types::Offer;

/// Resolves catalog ids into renderable offers. Infallible by design:
/// every failure mode degrades to the static catalog fallback.
pub struct OfferService {
    client: MeliClient,
    catalog: AffiliateCatalog,
    affiliate_id: Option<String>,
}

impl OfferService {
    #[must_use]
    pub fn new(client: MeliClient, catalog: AffiliateCatalog, affiliate_id: Option<String>) -> Self {
        Self {
            client,
            catalog,
            affiliate_id,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &AffiliateCatalog {
        &self.catalog
    }

    /// Resolves the given ids into offers.
    ///
    /// Live data when the fetch succeeds with at least one item; otherwise
    /// the catalog fallback for the same ids. Upstream errors are logged
    /// with their kind and swallowed — a page render must never 5xx because
    /// the marketplace is down.
    pub async fn resolve(&self, ids: &[String]) -> Vec<Offer> {
        match self.client.fetch_items(ids).await {
            Ok(items) if !items.is_empty() => {
                tracing::info!(
                    requested = ids.len(),
                    resolved = items.len(),
                    "live offers resolved"
                );
                items
                    .iter()
                    .map(|item| normalize(item, &self.catalog, self.affiliate_id.as_deref()))
                    .collect()
            }
            Ok(_) => {
                tracing::warn!(
                    requested = ids.len(),
                    "live fetch returned no items; serving catalog fallback"
                );
                fallback_offers(ids, &self.catalog)
            }
            Err(error) => {
                tracing::warn!(
                    requested = ids.len(),
                    error = %error,
                    "marketplace fetch failed; serving catalog fallback"
                );
                fallback_offers(ids, &self.catalog)
            }
        }
    }

    /// Resolves the full configured catalog (cache warm-up, CLI default).
    pub async fn resolve_catalog(&self) -> Vec<Offer> {
        let ids = self.catalog.ids();
        if ids.is_empty() {
            return Vec::new();
        }
        match self.client.fetch_items(&ids).await {
            Ok(items) if !items.is_empty() => items
                .iter()
                .map(|item| normalize(item, &self.catalog, self.affiliate_id.as_deref()))
                .collect(),
            Ok(_) => {
                tracing::warn!("catalog refresh returned no items; serving catalog fallback");
                fallback_catalog_offers(&self.catalog)
            }
            Err(error) => {
                tracing::warn!(error = %error, "catalog refresh failed; serving catalog fallback");
                fallback_catalog_offers(&self.catalog)
            }
        }
    }
}
