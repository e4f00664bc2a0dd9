//! Mercado Livre API response types and the normalized [`Offer`] shape.
//!
//! The multi-item endpoint wraps each item in a `{"code": 200, "body": {...}}`
//! envelope where `code` is a per-item HTTP-like status; [`ItemEnvelope`]
//! models that. Single-item responses are bare [`RawItem`]s.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-item envelope in a multi-id `/items?ids=...` response.
#[derive(Debug, Deserialize)]
pub struct ItemEnvelope {
    /// HTTP-like status for this item (200 = found).
    pub code: u16,
    #[serde(default)]
    pub body: Option<RawItem>,
}

/// Raw marketplace item as returned by the items endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct RawItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    /// Low-res thumbnail URL (the `-I.jpg` variant).
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Picture id usable with the high-res URL template.
    #[serde(default)]
    pub thumbnail_id: Option<String>,
    pub permalink: Option<String>,
    #[serde(default)]
    pub installments: Option<RawInstallments>,
}

/// Installment terms attached to an item.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInstallments {
    pub quantity: u32,
    pub amount: Decimal,
}

/// OAuth token-exchange response from `/oauth/token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
}

/// Normalized marketplace product for display and affiliate monetization.
///
/// `price: None` means "price unavailable" — the degraded-mode sentinel.
/// Renderers must show a call-to-action without a price, never `R$ 0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Offer {
    pub id: String,
    pub title: String,
    /// High-res image URL; empty string when no image could be resolved.
    pub image_url: String,
    pub price: Option<Decimal>,
    /// Previous/list price; present only when strictly above `price`.
    pub original_price: Option<Decimal>,
    pub discount_percent: Option<u32>,
    pub installment_text: Option<String>,
    /// Always non-empty: configured affiliate link, tagged permalink,
    /// or the marketplace listing URL as last resort.
    pub affiliate_link: String,
    pub store_name: String,
}
