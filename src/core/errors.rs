//! Error handling for the engine
//!
//! This module defines all error types used throughout the engine, plus the
//! transient/terminal classification that drives the retry policies.

use crate::core::types::{ChangeType, Integration};
use thiserror::Error;

/// Result type alias for the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record-level validation failures; terminal, never retried
    #[error("Validation error: {0}")]
    Validation(String),

    /// Credential/session acquisition failures; job-level, abort the batch
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Transient carrier-side failures (timeouts, 5xx); retried under the
    /// network policy
    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// Transient store failures (deadlock, pool exhaustion); retried under
    /// the store policy
    #[error("Transient store error: {0}")]
    TransientStore(String),

    /// Carrier rejected the request outright (4xx-class business rejection);
    /// terminal for the record
    #[error("Carrier rejected request: {0}")]
    CarrierRejected(String),

    /// No handler registered for a (change type, integration) pair
    #[error("Unsupported operation: no handler for {change_type} changes on {integration}")]
    UnsupportedOperation {
        change_type: ChangeType,
        integration: Integration,
    },

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether the transient-network retry policy may re-attempt the call.
    pub fn is_transient_network(&self) -> bool {
        match self {
            EngineError::TransientNetwork(_) => true,
            EngineError::HttpClient(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Whether the transient-store retry policy may re-attempt the call.
    pub fn is_transient_store(&self) -> bool {
        match self {
            EngineError::TransientStore(_) => true,
            EngineError::Database(e) => matches!(
                e,
                sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_)
            ),
            _ => false,
        }
    }

    /// Terminal record-level failures: no retry budget is ever spent on these.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_)
                | EngineError::CarrierRejected(_)
                | EngineError::UnsupportedOperation { .. }
        )
    }
}
