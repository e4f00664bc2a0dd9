//! HTTP client for the Mercado Livre items API.
//!
//! Wraps `reqwest` with envelope parsing, optional bearer auth from the
//! [`TokenManager`], and two fetch strategies selected once at startup:
//! one multi-id call, or N bounded-concurrency single-item calls where a
//! failing id cannot fail the others.

use std::collections::HashMap;
use std::time::Duration;

use futures::{stream, StreamExt};
use reqwest::{Client, Url};

use vetor_core::{AppConfig, BatchMode};

use crate::error::MeliError;
use crate::retry::retry_with_backoff;
use crate::token::TokenManager;
use crate::types::{ItemEnvelope, RawItem};

pub const DEFAULT_BASE_URL: &str = "https://api.mercadolibre.com/";

/// Attributes requested from the multi-id endpoint; keeps the payload to
/// the fields the normalizer actually reads.
const ITEM_ATTRIBUTES: &str =
    "id,title,price,original_price,thumbnail,thumbnail_id,permalink,installments";

const USER_AGENT: &str = "vetor/0.1 (ofertas-sync)";

/// Client for the Mercado Livre items API.
///
/// Use [`MeliClient::new`] for production or [`MeliClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Debug)]
pub struct MeliClient {
    client: Client,
    base_url: Url,
    tokens: TokenManager,
    batch_mode: BatchMode,
    concurrency: usize,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl MeliClient {
    /// Creates a new client pointed at the production marketplace API.
    ///
    /// # Errors
    ///
    /// Returns [`MeliError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, MeliError> {
        Self::with_base_url(config, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    /// The token endpoint is derived from the same base.
    ///
    /// # Errors
    ///
    /// Returns [`MeliError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`MeliError::Config`] if `base_url`
    /// is not a valid URL.
    pub fn with_base_url(config: &AppConfig, base_url: &str) -> Result<Self, MeliError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        // Normalise: ensure the base URL ends with exactly one slash so that
        // Url::join appends path segments instead of replacing the last one.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .map_err(|e| MeliError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        let token_url = base_url
            .join("oauth/token")
            .map_err(|e| MeliError::Config(format!("invalid token URL: {e}")))?
            .to_string();
        let tokens = TokenManager::from_config(client.clone(), token_url, config);

        Ok(Self {
            client,
            base_url,
            tokens,
            batch_mode: config.batch_mode,
            concurrency: config.fetch_concurrency.max(1),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
        })
    }

    /// Resolves the given catalog ids into raw items using the configured
    /// strategy. The result length is at most `ids.len()`: per-item misses
    /// (404, delisted, malformed) are dropped, not errors.
    ///
    /// # Errors
    ///
    /// - [`MeliError::Http`] on network failure or non-2xx status for the
    ///   whole request (single-call mode only — per-item mode is fail-soft).
    /// - [`MeliError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn fetch_items(&self, ids: &[String]) -> Result<Vec<RawItem>, MeliError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        match self.batch_mode {
            BatchMode::SingleCall => self.fetch_items_batch(ids).await,
            BatchMode::PerItem => Ok(self.fetch_items_each(ids).await),
        }
    }

    /// One `GET /items?ids=..&attributes=..` resolving all ids at once.
    /// Per-item envelopes with a non-200 `code` are dropped with a warn.
    async fn fetch_items_batch(&self, ids: &[String]) -> Result<Vec<RawItem>, MeliError> {
        let mut url = self
            .base_url
            .join("items")
            .map_err(|e| MeliError::Config(format!("invalid items URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("ids", &ids.join(","))
            .append_pair("attributes", ITEM_ATTRIBUTES);

        let token = self.tokens.access_token().await;
        let envelopes: Vec<ItemEnvelope> = retry_with_backoff(
            self.max_retries,
            self.backoff_base_ms,
            || self.request_json(url.clone(), token.clone()),
        )
        .await?;

        let items = envelopes
            .into_iter()
            .filter_map(|envelope| {
                if envelope.code == 200 {
                    envelope.body
                } else {
                    tracing::warn!(code = envelope.code, "dropping item with non-200 code");
                    None
                }
            })
            .collect();
        Ok(items)
    }

    /// N concurrent `GET /items/{id}` calls, joined. Each id is
    /// independently fail-soft: a failing id yields nothing instead of
    /// failing the whole batch. Results keep the input id order.
    async fn fetch_items_each(&self, ids: &[String]) -> Vec<RawItem> {
        let token = self.tokens.access_token().await;

        let fetched: Vec<Option<RawItem>> = stream::iter(ids.iter().cloned())
            .map(|id| {
                let token = token.clone();
                async move { self.fetch_one(&id, token).await }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut by_id: HashMap<String, RawItem> = fetched
            .into_iter()
            .flatten()
            .map(|item| (item.id.clone(), item))
            .collect();

        ids.iter().filter_map(|id| by_id.remove(id)).collect()
    }

    async fn fetch_one(&self, id: &str, token: Option<String>) -> Option<RawItem> {
        let url = match self.base_url.join(&format!("items/{id}")) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(item_id = %id, error = %e, "skipping id that does not form a valid URL");
                return None;
            }
        };

        let result = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_json::<RawItem>(url.clone(), token.clone())
        })
        .await;

        match result {
            Ok(item) => Some(item),
            Err(error) => {
                tracing::warn!(item_id = %id, error = %error, "dropping item after failed fetch");
                None
            }
        }
    }

    /// Sends a GET request with optional bearer auth, asserts a 2xx HTTP
    /// status, and parses the response body as JSON.
    async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        token: Option<String>,
    ) -> Result<T, MeliError> {
        let mut request = self.client.get(url.clone());
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| MeliError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetor_core::AuthMode;

    fn test_config(batch_mode: BatchMode) -> AppConfig {
        AppConfig {
            env: vetor_core::Environment::Test,
            bind_addr: "127.0.0.1:0".parse().expect("addr"),
            log_level: "info".to_string(),
            catalog_path: "./config/products.yaml".into(),
            meli_app_id: None,
            meli_app_secret: None,
            meli_refresh_token: None,
            meli_affiliate_id: None,
            webhook_secret: None,
            batch_mode,
            auth_mode: AuthMode::None,
            http_timeout_secs: 5,
            fetch_concurrency: 4,
            cache_ttl_secs: 3600,
            token_safety_margin_secs: 120,
            max_retries: 0,
            retry_backoff_base_ms: 0,
            rate_limit_per_min: 120,
        }
    }

    #[test]
    fn with_base_url_strips_trailing_slashes() {
        let config = test_config(BatchMode::SingleCall);
        let client =
            MeliClient::with_base_url(&config, "https://api.mercadolibre.com//").expect("client");
        assert_eq!(client.base_url.as_str(), "https://api.mercadolibre.com/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = test_config(BatchMode::SingleCall);
        let err = MeliClient::with_base_url(&config, "not a url").unwrap_err();
        assert!(matches!(err, MeliError::Config(_)));
    }

    #[tokio::test]
    async fn empty_id_list_short_circuits() {
        let config = test_config(BatchMode::SingleCall);
        // Unroutable base URL: any network attempt would fail the test.
        let client = MeliClient::with_base_url(&config, "http://127.0.0.1:1").expect("client");
        let items = client.fetch_items(&[]).await.expect("empty fetch");
        assert!(items.is_empty());
    }
}
