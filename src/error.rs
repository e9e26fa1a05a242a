use thiserror::Error;

use crate::domain::error::DomainError;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Record store errors.
///
/// `Duplicate` is how uniqueness invariants surface, so callers can tell a
/// redelivered create apart from a backend outage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("duplicate {collection} record: {key}")]
    Duplicate {
        collection: &'static str,
        key: String,
    },

    #[error("{collection} record not found: {key}")]
    NotFound {
        collection: &'static str,
        key: String,
    },

    #[error("store backend error: {0}")]
    Backend(String),
}

/// Workload deployer errors.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("failed to launch packaging engine: {0}")]
    Launch(#[source] std::io::Error),

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: &'static str,
        status: String,
        stderr: String,
    },

    #[error("failed to write release values: {0}")]
    Values(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("broker error: {0}")]
    Broker(#[from] lapin::Error),

    #[error("cluster error: {0}")]
    Cluster(Box<kube::Error>),

    #[error("key generation failed: {0}")]
    Keys(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("inventory error: {0}")]
    Inventory(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<kube::Error> for Error {
    fn from(err: kube::Error) -> Self {
        Error::Cluster(Box::new(err))
    }
}

impl From<ssh_key::Error> for Error {
    fn from(err: ssh_key::Error) -> Self {
        Error::Keys(err.to_string())
    }
}
