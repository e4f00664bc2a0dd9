use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How catalog ids are resolved against the marketplace API.
///
/// `SingleCall` issues one multi-id request and parses the per-item
/// `{code, body}` envelopes; `PerItem` issues one request per id with
/// bounded concurrency, so one bad id cannot fail the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    SingleCall,
    PerItem,
}

impl std::fmt::Display for BatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchMode::SingleCall => write!(f, "single-call"),
            BatchMode::PerItem => write!(f, "per-item"),
        }
    }
}

/// OAuth grant used when acquiring a marketplace access token.
///
/// `None` skips token acquisition entirely and calls the public read
/// endpoints unauthenticated (lower rate limit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    None,
    ClientCredentials,
    RefreshToken,
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::None => write!(f, "none"),
            AuthMode::ClientCredentials => write!(f, "client-credentials"),
            AuthMode::RefreshToken => write!(f, "refresh-token"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub catalog_path: PathBuf,
    pub meli_app_id: Option<String>,
    pub meli_app_secret: Option<String>,
    pub meli_refresh_token: Option<String>,
    pub meli_affiliate_id: Option<String>,
    pub webhook_secret: Option<String>,
    pub batch_mode: BatchMode,
    pub auth_mode: AuthMode,
    pub http_timeout_secs: u64,
    pub fetch_concurrency: usize,
    pub cache_ttl_secs: u64,
    pub token_safety_margin_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub rate_limit_per_min: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("catalog_path", &self.catalog_path)
            .field("meli_app_id", &self.meli_app_id)
            .field(
                "meli_app_secret",
                &self.meli_app_secret.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "meli_refresh_token",
                &self.meli_refresh_token.as_ref().map(|_| "[redacted]"),
            )
            .field("meli_affiliate_id", &self.meli_affiliate_id)
            .field(
                "webhook_secret",
                &self.webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("batch_mode", &self.batch_mode)
            .field("auth_mode", &self.auth_mode)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("token_safety_margin_secs", &self.token_safety_margin_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("rate_limit_per_min", &self.rate_limit_per_min)
            .finish()
    }
}
