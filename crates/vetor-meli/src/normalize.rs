//! Maps raw marketplace items into the uniform [`Offer`] shape.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use vetor_core::AffiliateCatalog;

use crate::types::{Offer, RawInstallments, RawItem};

pub const STORE_NAME: &str = "Mercado Livre";

/// Normalizes one raw item into an [`Offer`].
///
/// Affiliate link resolution order: catalog mapping for the id, then the
/// item permalink tagged with `matt_tool=<affiliate_id>` when a global
/// affiliate id is configured, then the bare permalink, and as a last
/// resort the marketplace listing URL for the id — the link is never empty.
#[must_use]
pub fn normalize(raw: &RawItem, catalog: &AffiliateCatalog, affiliate_id: Option<&str>) -> Offer {
    let original_price = raw
        .original_price
        .filter(|original| raw.price.is_some_and(|price| *original > price));

    let discount = match (raw.price, original_price) {
        (Some(price), Some(original)) => discount_percent(price, original),
        _ => None,
    };

    Offer {
        id: raw.id.clone(),
        title: raw.title.clone(),
        image_url: resolve_image(raw),
        price: raw.price,
        original_price,
        discount_percent: discount,
        installment_text: raw.installments.as_ref().map(installment_text),
        affiliate_link: resolve_affiliate_link(raw, catalog, affiliate_id),
        store_name: STORE_NAME.to_string(),
    }
}

/// Percentage saved against the list price, rounded to the nearest integer.
/// `None` unless `original > price`.
#[must_use]
pub fn discount_percent(price: Decimal, original: Decimal) -> Option<u32> {
    if original <= price || original.is_zero() {
        return None;
    }
    let percent = (original - price) / original * Decimal::from(100);
    percent
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
}

/// Resolves the best available image URL.
///
/// Prefers the high-res template built from `thumbnail_id`; otherwise
/// upgrades the low-res `-I.jpg` thumbnail to its `-O.jpg` variant;
/// otherwise empty — the renderer handles a missing image.
fn resolve_image(raw: &RawItem) -> String {
    if let Some(thumbnail_id) = raw.thumbnail_id.as_deref().filter(|t| !t.is_empty()) {
        return format!("https://http2.mlstatic.com/D_NQ_NP_{thumbnail_id}-V.jpg");
    }
    raw.thumbnail
        .as_deref()
        .map(|t| t.replace("-I.jpg", "-O.jpg"))
        .unwrap_or_default()
}

fn resolve_affiliate_link(
    raw: &RawItem,
    catalog: &AffiliateCatalog,
    affiliate_id: Option<&str>,
) -> String {
    if let Some(entry) = catalog.get(&raw.id) {
        return entry.affiliate_link.clone();
    }

    match (raw.permalink.as_deref(), affiliate_id) {
        (Some(permalink), Some(affiliate_id)) => format!("{permalink}?matt_tool={affiliate_id}"),
        (Some(permalink), None) => permalink.to_string(),
        (None, _) => format!("https://lista.mercadolivre.com.br/{}", raw.id),
    }
}

fn installment_text(installments: &RawInstallments) -> String {
    format!(
        "{}x de R$ {:.2}",
        installments.quantity, installments.amount
    )
}
