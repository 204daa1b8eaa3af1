//! Shared application state for the API surface.

use std::{collections::HashMap, sync::Arc, time::Duration as StdDuration, time::Instant};

use billbuddy_auth::Authenticator;
use billbuddy_config::RateLimitConfig;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::events::EventBroker;

#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    authenticator: Authenticator,
    events: EventBroker,
    rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(pool: SqlitePool, authenticator: Authenticator, rate_limit: &RateLimitConfig) -> Self {
        Self {
            pool,
            authenticator,
            events: EventBroker::default(),
            rate_limiter: RateLimiter::new(rate_limit),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn events(&self) -> &EventBroker {
        &self.events
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }
}

/// Fixed-window request counter, one window per client key.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window: StdDuration,
}

struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_requests: config.max_requests,
            window: StdDuration::from_secs(config.window_seconds),
        }
    }

    /// Record one request for `key`; false means the window budget is
    /// spent and the request must be rejected.
    pub async fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut guard = self.inner.lock().await;

        let window = guard.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        if window.count >= self.max_requests {
            return false;
        }

        window.count += 1;
        true
    }
}
