//! Record store trait defining versioned persistence for engine records.

use async_trait::async_trait;

use crate::errors::DomainResult;

/// Opaque per-key version, changed by every write
///
/// Revisions are unique per store for the lifetime of the backing data, so
/// a key that is deleted and recreated never reuses an earlier revision.
pub type Revision = u64;

/// A record together with the revision it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored<R> {
    pub value: R,
    pub revision: Revision,
}

/// Repository trait for OTP and rate-limit records
///
/// Read-modify-write flows read a `Stored<R>`, compute the next state and
/// commit it with `compare_and_swap`. A `false` result means another writer
/// got there first and the caller should re-read.
///
/// Implementations must make `compare_and_swap` atomic with respect to every
/// other writer of the same key, including writers in other processes.
#[async_trait]
pub trait RecordStore<R>: Send + Sync
where
    R: Send + Sync + 'static,
{
    /// Load a record and its revision
    ///
    /// # Returns
    /// * `Ok(Some(Stored))` - Record found
    /// * `Ok(None)` - No record under `key`
    /// * `Err(DomainError)` - Backend unreachable or data unreadable
    async fn get(&self, key: &str) -> DomainResult<Option<Stored<R>>>;

    /// Unconditionally write a record, returning its new revision
    async fn put(&self, key: &str, record: &R) -> DomainResult<Revision>;

    /// Delete a record, returning whether one existed
    async fn delete(&self, key: &str) -> DomainResult<bool>;

    /// Write `next` (or delete when `None`) only if the stored revision is
    /// still `expected`
    ///
    /// `expected = None` requires the key to be absent.
    ///
    /// # Returns
    /// * `Ok(true)` - The write was applied
    /// * `Ok(false)` - Revision mismatch, nothing written
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Revision>,
        next: Option<&R>,
    ) -> DomainResult<bool>;
}
