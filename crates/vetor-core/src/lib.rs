//! Shared configuration for the vetor offer-sync service: env-driven
//! application config and the static affiliate catalog.

mod app_config;
mod catalog;
mod config;

use thiserror::Error;

pub use app_config::{AppConfig, AuthMode, BatchMode, Environment};
pub use catalog::{load_catalog, AffiliateCatalog, AffiliateEntry};
pub use config::{load_app_config, load_app_config_from_env};

/// Errors raised while loading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
