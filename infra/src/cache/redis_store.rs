//! Redis implementation of RecordStore
//!
//! Each record lives in a hash `{rev, data}` where `data` is the JSON record
//! and `rev` its revision. Revisions come from one per-prefix sequence
//! counter, so a recreated key never repeats an earlier revision. Writes run
//! as Lua scripts, making compare-and-swap atomic across processes.

use async_trait::async_trait;
use redis::Script;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::time::Duration;
use tracing::{debug, error};

use pv_core::errors::{DomainError, DomainResult};
use pv_core::repositories::{RecordStore, Revision, Stored};

use crate::InfrastructureError;

use super::redis_client::RedisClient;

/// KEYS[1] record, KEYS[2] sequence; ARGV[1] data, ARGV[2] retention ms
const PUT_SCRIPT: &str = r#"
local rev = redis.call('INCR', KEYS[2])
redis.call('HSET', KEYS[1], 'rev', rev, 'data', ARGV[1])
redis.call('PEXPIRE', KEYS[1], ARGV[2])
return rev
"#;

/// KEYS[1] record, KEYS[2] sequence; ARGV[1] expected revision ('' = absent),
/// ARGV[2] data ('' = delete), ARGV[3] retention ms
const CAS_SCRIPT: &str = r#"
local current = redis.call('HGET', KEYS[1], 'rev')
if not current then current = '' end
if current ~= ARGV[1] then return 0 end
if ARGV[2] == '' then
  redis.call('DEL', KEYS[1])
  return 1
end
local rev = redis.call('INCR', KEYS[2])
redis.call('HSET', KEYS[1], 'rev', rev, 'data', ARGV[2])
redis.call('PEXPIRE', KEYS[1], ARGV[3])
return 1
"#;

/// Suffix of the revision sequence key
const SEQUENCE_KEY: &str = "__revision_seq";

/// Record store persisting JSON records in Redis hashes
///
/// `retention` is applied on every write as a storage expiry. It only keeps
/// Redis tidy; expiry and lockout decisions are made from record fields.
pub struct RedisRecordStore<R> {
    client: RedisClient,
    retention: Duration,
    put_script: Script,
    cas_script: Script,
    _record: PhantomData<fn() -> R>,
}

impl<R> RedisRecordStore<R> {
    pub fn new(client: RedisClient, retention: Duration) -> Self {
        Self {
            client,
            retention,
            put_script: Script::new(PUT_SCRIPT),
            cas_script: Script::new(CAS_SCRIPT),
            _record: PhantomData,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    fn sequence_key(&self) -> String {
        self.client.prefixed(SEQUENCE_KEY)
    }

    fn retention_ms(&self) -> u64 {
        (self.retention.as_millis() as u64).max(1)
    }
}

impl<R> Clone for RedisRecordStore<R> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone(), self.retention)
    }
}

fn encode<R: Serialize>(record: &R) -> Result<String, InfrastructureError> {
    Ok(serde_json::to_string(record)?)
}

fn decode<R: DeserializeOwned>(
    rev: Option<String>,
    data: Option<String>,
) -> DomainResult<Option<Stored<R>>> {
    let (Some(rev), Some(data)) = (rev, data) else {
        return Ok(None);
    };
    let revision = rev.parse::<Revision>().map_err(|e| DomainError::Storage {
        message: format!("corrupt revision '{}': {}", rev, e),
    })?;
    let value = serde_json::from_str(&data).map_err(InfrastructureError::from)?;
    Ok(Some(Stored { value, revision }))
}

#[async_trait]
impl<R> RecordStore<R> for RedisRecordStore<R>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> DomainResult<Option<Stored<R>>> {
        let key = self.client.prefixed(key);
        let (rev, data): (Option<String>, Option<String>) = self
            .client
            .execute_with_retry(|mut conn| {
                let key = key.clone();
                Box::pin(async move {
                    redis::cmd("HMGET")
                        .arg(key)
                        .arg("rev")
                        .arg("data")
                        .query_async(&mut conn)
                        .await
                })
            })
            .await
            .map_err(InfrastructureError::from)?;

        decode(rev, data).map_err(|e| {
            error!(key = %key, error = %e, "Failed to decode stored record");
            e
        })
    }

    async fn put(&self, key: &str, record: &R) -> DomainResult<Revision> {
        let key = self.client.prefixed(key);
        let data = encode(record)?;
        let sequence = self.sequence_key();
        let retention_ms = self.retention_ms();

        let revision: Revision = self
            .client
            .execute_with_retry(|mut conn| {
                let script = self.put_script.clone();
                let key = key.clone();
                let sequence = sequence.clone();
                let data = data.clone();
                Box::pin(async move {
                    script
                        .key(key)
                        .key(sequence)
                        .arg(data)
                        .arg(retention_ms)
                        .invoke_async(&mut conn)
                        .await
                })
            })
            .await
            .map_err(InfrastructureError::from)?;

        debug!(key = %key, revision = revision, "Stored record");
        Ok(revision)
    }

    async fn delete(&self, key: &str) -> DomainResult<bool> {
        let key = self.client.prefixed(key);
        let removed: i64 = self
            .client
            .execute_with_retry(|mut conn| {
                let key = key.clone();
                Box::pin(async move { redis::cmd("DEL").arg(key).query_async(&mut conn).await })
            })
            .await
            .map_err(InfrastructureError::from)?;
        Ok(removed > 0)
    }

    // Single attempt: replaying a swap whose reply was lost would report a
    // false conflict.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<Revision>,
        next: Option<&R>,
    ) -> DomainResult<bool> {
        let key = self.client.prefixed(key);
        let expected = expected.map(|rev| rev.to_string()).unwrap_or_default();
        let data = match next {
            Some(record) => encode(record)?,
            None => String::new(),
        };

        let mut conn = self.client.connection();
        let applied: i64 = self
            .cas_script
            .key(&key)
            .key(self.sequence_key())
            .arg(expected)
            .arg(data)
            .arg(self.retention_ms())
            .invoke_async(&mut conn)
            .await
            .map_err(InfrastructureError::from)?;

        Ok(applied == 1)
    }
}
