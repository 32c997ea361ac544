use redis::RedisResult;

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Fixed-window counter. The window starts with the first request and
    /// its expiry is set only then, so later hits do not extend it. Returns
    /// whether the caller is still within `limit` requests for the window.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count, ttl): (i64, i64) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .ttl(key)
            .query_async(&mut conn)
            .await?;

        if window_unset(ttl) {
            let _: () = redis::cmd("EXPIRE")
                .arg(key)
                .arg(window_seconds)
                .query_async(&mut conn)
                .await?;
        }

        Ok(count <= limit)
    }
}

/// `TTL` answers -1 for a key that exists without an expiry: the first hit of
/// a window, or a counter whose `EXPIRE` was lost.
fn window_unset(ttl: i64) -> bool {
    ttl == -1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_only_set_when_window_unset() {
        assert!(window_unset(-1));
        assert!(!window_unset(59));
        assert!(!window_unset(0));
        // -2: key missing, nothing to expire
        assert!(!window_unset(-2));
    }
}
