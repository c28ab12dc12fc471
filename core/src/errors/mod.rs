//! Domain-specific error types and error handling.

pub(crate) mod otp_error;

#[cfg(test)]
mod tests;

pub use otp_error::OtpError;

use thiserror::Error;

/// Core domain errors (general purpose)
///
/// Messages never carry the server secret, a passcode or its hash.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Concurrent modification: {message}")]
    Conflict { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<pv_shared::ConfigError> for DomainError {
    fn from(err: pv_shared::ConfigError) -> Self {
        DomainError::Configuration {
            message: err.to_string(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
