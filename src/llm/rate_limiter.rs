use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, sleep};
use reqwest::header::HeaderMap;

pub struct RateLimiter {
    state: Arc<Mutex<RateLimitState>>,
    requests_per_minute: Option<u32>,
}

struct RateLimitState {
    remaining: Option<u32>,
    reset_at: Option<Instant>,
    requests_this_minute: u32,
    minute_start: Instant,
}

impl RateLimiter {
    /// `None` (or zero) disables the client-side cap; server-reported limits
    /// are honoured either way.
    pub fn new(requests_per_minute: Option<u32>) -> Self {
        Self {
            state: Arc::new(Mutex::new(RateLimitState {
                remaining: None,
                reset_at: None,
                requests_this_minute: 0,
                minute_start: Instant::now(),
            })),
            requests_per_minute: requests_per_minute.filter(|&n| n > 0),
        }
    }

    pub async fn wait(&self) {
        let mut state = self.state.lock().await;

        // Server says the request budget is exhausted until reset_at
        if state.remaining == Some(0) {
            if let Some(reset_at) = state.reset_at {
                let now = Instant::now();
                if reset_at > now {
                    let wait_duration = reset_at - now;
                    drop(state);
                    tracing::info!("Rate limited, waiting {:?}", wait_duration);
                    sleep(wait_duration).await;
                    state = self.state.lock().await;
                }
            }
            state.remaining = None;
            state.reset_at = None;
        }

        let Some(limit) = self.requests_per_minute else {
            return;
        };

        let minute_elapsed = state.minute_start.elapsed();
        if minute_elapsed < Duration::from_secs(60) {
            if state.requests_this_minute >= limit {
                let wait_time = Duration::from_secs(60) - minute_elapsed;
                drop(state);
                tracing::debug!("Soft rate limiting, waiting {:?}", wait_time);
                sleep(wait_time).await;
                state = self.state.lock().await;
                state.requests_this_minute = 0;
                state.minute_start = Instant::now();
            }
        } else {
            state.requests_this_minute = 0;
            state.minute_start = Instant::now();
        }

        state.requests_this_minute += 1;
    }

    pub async fn update_from_headers(&self, headers: &HeaderMap) {
        let Some(remaining) = headers
            .get("x-ratelimit-remaining-requests")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok())
        else {
            return;
        };

        let reset = headers
            .get("x-ratelimit-reset-requests")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_reset_duration);

        let mut state = self.state.lock().await;
        state.remaining = Some(remaining);
        state.reset_at = reset.map(|d| Instant::now() + d);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Parses reset hints such as `1s`, `6m0s`, `20ms` or `1h2m3.5s`.
pub fn parse_reset_duration(value: &str) -> Option<Duration> {
    let mut total_ms = 0f64;
    let mut number = String::new();
    let mut seen_unit = false;
    let mut chars = value.trim().chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() || c == '.' {
            number.push(c);
            continue;
        }

        let amount: f64 = number.parse().ok()?;
        number.clear();

        total_ms += match c {
            'h' => amount * 3_600_000.0,
            'm' if chars.peek() == Some(&'s') => {
                chars.next();
                amount
            }
            'm' => amount * 60_000.0,
            's' => amount * 1_000.0,
            _ => return None,
        };
        seen_unit = true;
    }

    if !number.is_empty() || !seen_unit {
        return None;
    }

    Some(Duration::from_millis(total_ms.round() as u64))
}
