//! Terminal fallback: degraded offers built purely from the static catalog.
//!
//! This resolver never fails. When the live fetch errors out or returns
//! nothing, the page still renders the configured affiliate cards — with
//! `price: None`, the "price unavailable" sentinel, never a fake zero.

use vetor_core::{AffiliateCatalog, AffiliateEntry};

use crate::normalize::STORE_NAME;
use crate::types::Offer;

const FALLBACK_TITLE: &str = "Oferta Especial Hardware";

/// Degraded offers for the requested ids. Ids without a catalog entry are
/// omitted: an unmapped id has no affiliate link to render.
#[must_use]
pub fn fallback_offers(ids: &[String], catalog: &AffiliateCatalog) -> Vec<Offer> {
    ids.iter()
        .filter_map(|id| catalog.get(id))
        .map(degraded_offer)
        .collect()
}

/// Degraded offers for the whole catalog, in catalog order. Used by the
/// cache-warm job and the CLI when no explicit id list is given.
#[must_use]
pub fn fallback_catalog_offers(catalog: &AffiliateCatalog) -> Vec<Offer> {
    catalog.entries().map(degraded_offer).collect()
}

fn degraded_offer(entry: &AffiliateEntry) -> Offer {
    let image_url = entry.image_url.clone().unwrap_or_else(|| {
        // Public thumbnail URL derivable from the numeric part of the id,
        // available without authentication.
        format!(
            "https://http2.mlstatic.com/D_NQ_NP_2X_{}-F.jpg",
            entry.item_id.trim_start_matches("MLB")
        )
    });

    Offer {
        id: entry.item_id.clone(),
        title: entry
            .title
            .clone()
            .unwrap_or_else(|| FALLBACK_TITLE.to_string()),
        image_url,
        price: None,
        original_price: None,
        discount_percent: None,
        installment_text: None,
        affiliate_link: entry.affiliate_link.clone(),
        store_name: STORE_NAME.to_string(),
    }
}
