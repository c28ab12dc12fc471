//! Cache module for Redis-backed records
//!
//! This module provides the Redis client with connection retry logic and the
//! `RecordStore` implementation the OTP engine persists its records through.

pub mod redis_client;
pub mod redis_store;

#[cfg(test)]
mod tests;

pub use redis_client::RedisClient;
pub use redis_store::RedisRecordStore;

// Re-export commonly used types
pub use pv_shared::config::CacheConfig;
