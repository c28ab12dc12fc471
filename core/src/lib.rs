//! # PhoneVerify Core
//!
//! Core business logic for the PhoneVerify SMS one-time passcode engine.
//! This crate contains the domain entities and value objects, the OTP
//! services (rate limiting, hashing, lockout, dispatch), the record store
//! abstraction with its in-memory implementation, and the error types the
//! rest of the workspace builds on.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
