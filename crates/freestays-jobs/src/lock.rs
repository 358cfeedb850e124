//! Per-job mutual exclusion across instances.

use crate::error::JobResult;
use async_trait::async_trait;
use deadpool_redis::Pool;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// Releases only the holder's own lock.
const RELEASE_SCRIPT: &str = r#"
    if redis.call("get", KEYS[1]) == ARGV[1] then
        return redis.call("del", KEYS[1])
    else
        return 0
    end
"#;

/// Pushes back the expiry of the holder's own lock.
const EXTEND_SCRIPT: &str = r#"
    if redis.call("get", KEYS[1]) == ARGV[1] then
        return redis.call("expire", KEYS[1], ARGV[2])
    else
        return 0
    end
"#;

/// Proof of holding a job lock, needed to release it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockToken(String);

impl LockToken {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A named lock with a lifetime, held by at most one run at a time.
///
/// The TTL bounds how long a crashed holder keeps others out. A running job
/// extends it periodically.
#[async_trait]
pub trait JobLock: Send + Sync {
    /// Takes the lock for `ttl`; `None` if someone else holds it.
    async fn try_acquire(&self, name: &str, ttl: Duration) -> JobResult<Option<LockToken>>;

    /// Resets the lock to expire `ttl` from now. Returns `false` if it had
    /// already expired or was taken over.
    async fn extend(&self, name: &str, token: &LockToken, ttl: Duration) -> JobResult<bool>;

    /// Gives the lock back. Returns `false` if it had expired or was taken over.
    async fn release(&self, name: &str, token: &LockToken) -> JobResult<bool>;
}

/// Lock shared by every instance using the same Redis.
pub struct RedisJobLock {
    pool: Pool,
    key_prefix: String,
}

impl RedisJobLock {
    pub fn new(pool: Pool, key_prefix: impl Into<String>) -> Self {
        Self {
            pool,
            key_prefix: key_prefix.into(),
        }
    }

    fn key(&self, name: &str) -> String {
        format!("{}:{}", self.key_prefix, name)
    }
}

#[async_trait]
impl JobLock for RedisJobLock {
    async fn try_acquire(&self, name: &str, ttl: Duration) -> JobResult<Option<LockToken>> {
        let mut conn = self.pool.get().await?;
        let token = LockToken::generate();

        let result: Option<String> = redis::cmd("SET")
            .arg(self.key(name))
            .arg(token.as_str())
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut *conn)
            .await?;

        if result.is_some() {
            debug!(job = name, "Acquired job lock");
            Ok(Some(token))
        } else {
            Ok(None)
        }
    }

    async fn extend(&self, name: &str, token: &LockToken, ttl: Duration) -> JobResult<bool> {
        let mut conn = self.pool.get().await?;

        let extended: i32 = redis::Script::new(EXTEND_SCRIPT)
            .key(self.key(name))
            .arg(token.as_str())
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut *conn)
            .await?;

        Ok(extended > 0)
    }

    async fn release(&self, name: &str, token: &LockToken) -> JobResult<bool> {
        let mut conn = self.pool.get().await?;

        let deleted: i32 = redis::Script::new(RELEASE_SCRIPT)
            .key(self.key(name))
            .arg(token.as_str())
            .invoke_async(&mut *conn)
            .await?;

        if deleted == 0 {
            warn!(job = name, "Job lock expired or was taken over before release");
        }
        Ok(deleted > 0)
    }
}

/// Lock for a single instance, used when no Redis is configured.
#[derive(Default)]
pub struct LocalJobLock {
    held: Mutex<HashMap<String, (LockToken, Instant)>>,
}

impl LocalJobLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobLock for LocalJobLock {
    async fn try_acquire(&self, name: &str, ttl: Duration) -> JobResult<Option<LockToken>> {
        let now = Instant::now();
        let mut held = self.held.lock();
        if held.get(name).is_some_and(|(_, expires_at)| *expires_at > now) {
            return Ok(None);
        }
        let token = LockToken::generate();
        held.insert(name.to_string(), (token.clone(), now + ttl));
        Ok(Some(token))
    }

    async fn extend(&self, name: &str, token: &LockToken, ttl: Duration) -> JobResult<bool> {
        let now = Instant::now();
        let mut held = self.held.lock();
        match held.get_mut(name) {
            Some((owner, expires_at)) if owner == token && *expires_at > now => {
                *expires_at = now + ttl;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, name: &str, token: &LockToken) -> JobResult<bool> {
        let mut held = self.held.lock();
        match held.get(name) {
            Some((owner, expires_at)) if owner == token && *expires_at > Instant::now() => {
                held.remove(name);
                Ok(true)
            }
            Some((owner, _)) if owner == token => {
                held.remove(name);
                warn!(job = name, "Job lock expired before release");
                Ok(false)
            }
            _ => Ok(false),
        }
    }
}
