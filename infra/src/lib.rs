//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for PhoneVerify. It
//! provides the concrete collaborators the OTP engine in `pv_core` is
//! written against:
//!
//! - **Cache**: Redis client and the Redis-backed `RecordStore`
//! - **SMS**: dry-run and HTTP gateway implementations of `SmsGateway`
//! - **Settings**: layered configuration loading (`.env`, file, environment)
//! - **Telemetry**: `tracing` subscriber initialisation
//!
//! ## Features
//!
//! - `redis-cache`: Enable the Redis record store (default)

use pv_core::errors::DomainError;

/// Cache module - Redis client and record store
#[cfg(feature = "redis-cache")]
pub mod cache;

/// SMS gateway module - dry-run and HTTP providers
pub mod sms;

/// Configuration loading
pub mod settings;

/// Logging initialisation
pub mod telemetry;

/// Wiring of the engine from configuration
pub mod bootstrap;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Redis cache error
    #[cfg(feature = "redis-cache")]
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// HTTP request error for external services
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stored data could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMS service error
    #[error("SMS service error: {0}")]
    Sms(String),

    /// Error raised by the engine while it was being assembled
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<InfrastructureError> for DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            #[cfg(feature = "redis-cache")]
            InfrastructureError::Cache(e) => DomainError::Storage {
                message: e.to_string(),
            },
            InfrastructureError::Serialization(e) => DomainError::Storage {
                message: format!("unreadable record: {}", e),
            },
            InfrastructureError::Config(message) => DomainError::Configuration { message },
            InfrastructureError::Http(e) => DomainError::Internal {
                message: e.to_string(),
            },
            InfrastructureError::Sms(message) => DomainError::Internal { message },
            InfrastructureError::Domain(e) => e,
        }
    }
}

impl From<config::ConfigError> for InfrastructureError {
    fn from(err: config::ConfigError) -> Self {
        InfrastructureError::Config(err.to_string())
    }
}

impl From<pv_shared::ConfigError> for InfrastructureError {
    fn from(err: pv_shared::ConfigError) -> Self {
        InfrastructureError::Config(err.to_string())
    }
}
