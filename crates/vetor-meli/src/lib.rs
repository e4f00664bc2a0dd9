//! Mercado Livre offer-sync client.
//!
//! Resolves catalog item ids into normalized, affiliate-linked [`Offer`]s:
//! an optional OAuth credential manager ([`TokenManager`]), a catalog
//! fetcher ([`MeliClient`]) with single-call and per-item strategies, a
//! normalizer, and a terminal fallback resolver that keeps the page
//! renderable when everything upstream fails.

mod client;
mod error;
mod fallback;
mod normalize;
mod retry;
mod service;
mod token;
mod types;

pub use client::{MeliClient, DEFAULT_BASE_URL};
pub use error::MeliError;
pub use fallback::{fallback_catalog_offers, fallback_offers};
pub use normalize::{discount_percent, normalize, STORE_NAME};
pub use service::OfferService;
pub use token::{Credentials, TokenManager};
pub use types::{ItemEnvelope, Offer, RawInstallments, RawItem, TokenResponse};
