use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Caption generation: 10 requests per 15 minutes per client.
pub const CAPTION_MAX_REQUESTS: u32 = 10;
pub const CAPTION_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Stale windows are swept once the table grows past this.
const SWEEP_THRESHOLD: usize = 10_000;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RESET_HEADER: HeaderName = HeaderName::from_static("ratelimit-reset");

/// Fixed-window request counter keyed by client.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
    /// Time until the current window resets.
    pub reset_after: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn for_captions() -> Self {
        Self::new(CAPTION_MAX_REQUESTS, CAPTION_WINDOW)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut windows = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if windows.len() > SWEEP_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        entry.count = entry.count.saturating_add(1);
        let reset_after = self.window.saturating_sub(now.duration_since(entry.started));

        Decision {
            allowed: entry.count <= self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after,
        }
    }
}

/// Middleware guarding `POST /api/posts/generate-caption`.
pub async fn limit_caption_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let key = client_key(&req);
    let limiter = &state.caption_limiter;
    let decision = limiter.check(&key);

    let mut response = if decision.allowed {
        next.run(req).await
    } else {
        warn!("Caption rate limit hit for {}", key);
        ApiError::TooManyRequests(
            "Too many caption generation requests. Please try again in 15 minutes.".into(),
        )
        .into_response()
    };

    set_headers(response.headers_mut(), limiter.max_requests(), decision);
    response
}

fn client_key(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_headers(headers: &mut HeaderMap, limit: u32, decision: Decision) {
    let reset_secs = decision.reset_after.as_secs_f64().ceil() as u64;
    headers.insert(LIMIT_HEADER, HeaderValue::from(limit));
    headers.insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));
    headers.insert(RESET_HEADER, HeaderValue::from(reset_secs));
}
