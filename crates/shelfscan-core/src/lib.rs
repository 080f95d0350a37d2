pub mod app_config;
pub mod config;
pub mod products;
pub mod session;

pub use app_config::{AppConfig, Credentials};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{CanonicalRecord, IdentityKey, ProductId, RawRow, CANONICAL_FIELDS};
pub use session::{
    load_snapshot, merge, merge_and_persist, CookieEntry, OriginEntry, StorageStateSnapshot,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("no reusable session and no credentials configured (set SHELFSCAN_USERNAME and SHELFSCAN_PASSWORD)")]
    MissingCredentials,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session state I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session state serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
