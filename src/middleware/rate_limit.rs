use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use redis::AsyncCommands;

use crate::{cache::keys::rate_limit_key, config::Config, error::AppError};

/// 按客户端 IP 的固定窗口限流，计数存在 Redis
#[derive(Clone)]
pub struct RateLimiter {
    redis: Arc<redis::Client>,
    config: Arc<Config>,
}

/// 反向代理头优先，其次是连接地址
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').map(str::trim).find(|ip| !ip.is_empty()))
                .map(str::to_string)
        })
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

impl RateLimiter {
    pub fn new(redis: Arc<redis::Client>, config: Config) -> Self {
        Self {
            redis,
            config: Arc::new(config),
        }
    }

    // 使用 Redis 的 INCR 和 EXPIRE 命令实现计数器
    async fn incr_window(&self, key: &str) -> redis::RedisResult<i64> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let count: i64 = conn.incr(key, 1).await?;
        if count == 1 {
            // 如果是第一次请求，设置过期时间
            let _: () = conn
                .expire(key, self.config.rate_limit_window().as_secs() as i64)
                .await?;
        }
        Ok(count)
    }

    pub async fn check_rate_limit(
        self: Arc<Self>,
        req: Request<Body>,
        next: Next,
    ) -> Result<Response, AppError> {
        let remote = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0);
        let ip = client_ip(req.headers(), remote);
        let key = rate_limit_key(&ip);

        // Redis 不可用时放行，只记日志
        let count = match self.incr_window(&key).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Rate limiter unavailable, letting {} through: {}", ip, e);
                return Ok(next.run(req).await);
            }
        };

        if count > self.config.rate_limit_requests as i64 {
            tracing::debug!("Rate limit exceeded for {}", ip);
            return Err(AppError::RateLimited(
                self.config.rate_limit_window().as_secs(),
            ));
        }

        Ok(next.run(req).await)
    }
}

pub async fn rate_limit(
    State(limiter): State<Arc<RateLimiter>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    limiter.check_rate_limit(req, next).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn real_ip_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static(" 1.2.3.4 "));
        headers.insert("x-forwarded-for", HeaderValue::from_static("5.6.7.8"));
        assert_eq!(client_ip(&headers, None), "1.2.3.4");
    }

    #[test]
    fn first_forwarded_address_is_used() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" , 5.6.7.8, 9.9.9.9"));
        assert_eq!(client_ip(&headers, None), "5.6.7.8");
    }

    #[test]
    fn falls_back_to_connection_then_unknown() {
        let headers = HeaderMap::new();
        let remote: SocketAddr = "10.0.0.2:5555".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(remote)), "10.0.0.2");
        assert_eq!(client_ip(&headers, None), "unknown");
    }
}
