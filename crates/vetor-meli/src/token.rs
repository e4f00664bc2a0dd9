//! OAuth credential manager for the marketplace API.
//!
//! Owns the cached access token behind a [`tokio::sync::Mutex`] held across
//! the refresh call, so concurrent cold-start requests share one in-flight
//! token exchange instead of issuing duplicates. Token acquisition never
//! fails the caller: `None` is the error signal, and the fetch path proceeds
//! unauthenticated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Mutex;

use vetor_core::{AppConfig, AuthMode};

use crate::error::MeliError;
use crate::types::TokenResponse;

/// Marketplace application secrets for the token exchange.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    /// Required for [`AuthMode::RefreshToken`], unused otherwise.
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Acquires and caches marketplace access tokens.
///
/// A missing credential set is a deliberate fail-fast: no network call is
/// made and the condition is logged once per process to avoid log spam.
#[derive(Debug)]
pub struct TokenManager {
    http: Client,
    token_url: String,
    auth_mode: AuthMode,
    credentials: Option<Credentials>,
    safety_margin: Duration,
    cache: Mutex<Option<CachedToken>>,
    warned_missing: AtomicBool,
}

impl TokenManager {
    #[must_use]
    pub fn new(
        http: Client,
        token_url: String,
        auth_mode: AuthMode,
        credentials: Option<Credentials>,
        safety_margin: Duration,
    ) -> Self {
        Self {
            http,
            token_url,
            auth_mode,
            credentials,
            safety_margin,
            cache: Mutex::new(None),
            warned_missing: AtomicBool::new(false),
        }
    }

    /// Builds a manager from application config, validating that the
    /// configured auth mode has the secrets it needs. Incomplete secrets
    /// leave the manager in the degraded no-token state rather than failing.
    #[must_use]
    pub fn from_config(http: Client, token_url: String, config: &AppConfig) -> Self {
        let credentials = match config.auth_mode {
            AuthMode::None => None,
            AuthMode::ClientCredentials => {
                match (&config.meli_app_id, &config.meli_app_secret) {
                    (Some(id), Some(secret)) => Some(Credentials {
                        client_id: id.clone(),
                        client_secret: secret.clone(),
                        refresh_token: None,
                    }),
                    _ => None,
                }
            }
            AuthMode::RefreshToken => match (
                &config.meli_app_id,
                &config.meli_app_secret,
                &config.meli_refresh_token,
            ) {
                (Some(id), Some(secret), Some(refresh)) => Some(Credentials {
                    client_id: id.clone(),
                    client_secret: secret.clone(),
                    refresh_token: Some(refresh.clone()),
                }),
                _ => None,
            },
        };

        Self::new(
            http,
            token_url,
            config.auth_mode,
            credentials,
            Duration::from_secs(config.token_safety_margin_secs),
        )
    }

    /// Returns a bearer token, or `None` when auth is disabled, secrets are
    /// missing, or the token exchange fails.
    ///
    /// A cached token is reused without I/O while more than the safety
    /// margin remains before expiry. On exchange failure the cache keeps its
    /// previous value.
    pub async fn access_token(&self) -> Option<String> {
        if self.auth_mode == AuthMode::None {
            return None;
        }

        let Some(credentials) = &self.credentials else {
            if !self.warned_missing.swap(true, Ordering::Relaxed) {
                tracing::warn!(
                    auth_mode = %self.auth_mode,
                    "marketplace credentials missing; proceeding unauthenticated"
                );
            }
            return None;
        };

        // Held across the refresh: concurrent callers await one exchange.
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            let still_fresh = cached
                .expires_at
                .checked_sub(self.safety_margin)
                .is_some_and(|deadline| Instant::now() < deadline);
            if still_fresh {
                return Some(cached.access_token.clone());
            }
        }

        match self.exchange(credentials).await {
            Ok(response) if !response.access_token.is_empty() => {
                let token = response.access_token.clone();
                *cache = Some(CachedToken {
                    access_token: response.access_token,
                    expires_at: Instant::now() + Duration::from_secs(response.expires_in),
                });
                tracing::debug!(expires_in = response.expires_in, "access token refreshed");
                Some(token)
            }
            Ok(_) => {
                tracing::warn!("token exchange returned an empty access_token");
                None
            }
            Err(error) => {
                tracing::warn!(error = %error, "token exchange failed; proceeding unauthenticated");
                None
            }
        }
    }

    async fn exchange(&self, credentials: &Credentials) -> Result<TokenResponse, MeliError> {
        let mut form = vec![
            ("grant_type", grant_type(self.auth_mode).to_string()),
            ("client_id", credentials.client_id.clone()),
            ("client_secret", credentials.client_secret.clone()),
        ];
        if self.auth_mode == AuthMode::RefreshToken {
            if let Some(refresh) = &credentials.refresh_token {
                form.push(("refresh_token", refresh.clone()));
            }
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await?
            .error_for_status()?;

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| MeliError::Deserialize {
            context: "oauth/token".to_string(),
            source: e,
        })
    }
}

fn grant_type(mode: AuthMode) -> &'static str {
    match mode {
        // AuthMode::None never reaches the exchange.
        AuthMode::None | AuthMode::ClientCredentials => "client_credentials",
        AuthMode::RefreshToken => "refresh_token",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auth_mode_none_yields_no_token() {
        let manager = TokenManager::new(
            Client::new(),
            "http://127.0.0.1:1/oauth/token".to_string(),
            AuthMode::None,
            None,
            Duration::from_secs(60),
        );
        assert!(manager.access_token().await.is_none());
    }

    #[tokio::test]
    async fn missing_credentials_yield_no_token_without_network() {
        // Unroutable token URL: any network attempt would error loudly,
        // but the fail-fast path must not even try.
        let manager = TokenManager::new(
            Client::new(),
            "http://127.0.0.1:1/oauth/token".to_string(),
            AuthMode::ClientCredentials,
            None,
            Duration::from_secs(60),
        );
        assert!(manager.access_token().await.is_none());
        // Second call takes the same path; the warn latch fires only once.
        assert!(manager.access_token().await.is_none());
    }
}
