use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager};

use super::InfraError;
use crate::app_error::{AppError, AppResult};

/// Trait for rate limiting implementations.
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Returns Ok(()) if within limits, Err(AppError::RateLimited) if exceeded.
    async fn check(&self, ip: &str) -> AppResult<()>;
}

/// Atomic increment; the first hit in a window sets the TTL.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
elseif redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
"#;

/// Fixed-window per-IP limiter backed by Redis.
#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    window_secs: u64,
    max_per_ip: u64,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(redis_url: &str, window_secs: u64, max_per_ip: u64) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        Ok(Self {
            manager,
            window_secs,
            max_per_ip,
            script: Script::new(INCR_WITH_TTL_SCRIPT),
        })
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check(&self, ip: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let current: u64 = self
            .script
            .key(format!("entitlement-api:rate:ip:{ip}"))
            .arg(self.window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Upstream(format!("rate limiter unavailable: {e}")))?;

        if current > self.max_per_ip {
            tracing::warn!(ip, current, limit = self.max_per_ip, "Rate limit exceeded");
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}
