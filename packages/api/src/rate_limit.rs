//! # Per-IP request rate limiting
//!
//! A fixed-window counter keyed by client IP: each address may make
//! `max_requests` requests per `window`. Excess requests get
//! `429 Too Many Requests` before reaching any handler.
//!
//! The client address comes from axum's `ConnectInfo<SocketAddr>` extension when
//! the server is started with connect info; otherwise every request is counted
//! against the unspecified address.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::MessageResponse;

pub const RATE_LIMIT_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Window settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    /// 100 requests per 15 minutes.
    fn default() -> Self {
        Self {
            window: Duration::from_secs(15 * 60),
            max_requests: 100,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Shared fixed-window limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

/// Entries beyond this many trigger a sweep of expired windows.
const SWEEP_THRESHOLD: usize = 10_000;

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count a request from `ip`. Returns `false` if it exceeds the limit.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    pub fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        let Ok(mut windows) = self.windows.lock() else {
            // Fail open on a poisoned lock.
            return true;
        };

        if windows.len() > SWEEP_THRESHOLD {
            let window = self.config.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(ip).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.config.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        if entry.count >= self.config.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }
}

/// Axum middleware applying a [`RateLimiter`].
pub async fn limit_by_ip(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !limiter.check(ip) {
        tracing::warn!("Rate limit exceeded for {}", ip);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MessageResponse::new(RATE_LIMIT_MESSAGE)),
        )
            .into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            window: Duration::from_secs(60),
            max_requests,
        })
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = limiter(3);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let now = Instant::now();

        assert!(limiter.check_at(ip, now));
        assert!(limiter.check_at(ip, now));
        assert!(limiter.check_at(ip, now));
        assert!(!limiter.check_at(ip, now));
    }

    #[test]
    fn test_window_resets() {
        let limiter = limiter(1);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let now = Instant::now();

        assert!(limiter.check_at(ip, now));
        assert!(!limiter.check_at(ip, now + Duration::from_secs(59)));
        assert!(limiter.check_at(ip, now + Duration::from_secs(60)));
    }

    #[test]
    fn test_addresses_are_independent() {
        let limiter = limiter(1);
        let now = Instant::now();
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert!(limiter.check_at(a, now));
        assert!(!limiter.check_at(a, now));
        assert!(limiter.check_at(b, now));
    }
}
