use thiserror::Error;

/// Errors returned by the Mercado Livre API client.
#[derive(Debug, Error)]
pub enum MeliError {
    /// Network or TLS failure from the underlying HTTP client,
    /// including non-2xx statuses surfaced via `error_for_status`.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Client-side construction problem, e.g. an invalid base URL.
    #[error("client configuration error: {0}")]
    Config(String),
}
