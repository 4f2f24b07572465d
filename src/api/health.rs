//! Shared health state for the /health endpoint.
//! Updated by the token poller.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;

#[derive(Default)]
pub struct HealthState {
    /// True while a poll is in flight.
    polling: AtomicBool,
    /// Unix millis of the last successful poll (0 = none).
    last_success_ms: AtomicU64,
    consecutive_failures: AtomicU64,
    token_count: AtomicU64,
    last_error: Mutex<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub polling: bool,
    pub last_success_ms: Option<u64>,
    pub consecutive_failures: u64,
    pub token_count: u64,
    pub last_error: Option<String>,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll_started(&self) {
        self.polling.store(true, Ordering::Relaxed);
    }

    pub fn poll_succeeded(&self, token_count: usize) {
        self.polling.store(false, Ordering::Relaxed);
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        self.last_success_ms.store(now, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        self.token_count.store(token_count as u64, Ordering::Relaxed);
        if let Ok(mut e) = self.last_error.lock() {
            *e = None;
        }
    }

    pub fn poll_failed(&self, message: &str) {
        self.polling.store(false, Ordering::Relaxed);
        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut e) = self.last_error.lock() {
            *e = Some(message.to_string());
        }
    }

    pub fn consecutive_failures(&self) -> u64 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    pub fn report(&self) -> HealthReport {
        let last_success_ms = match self.last_success_ms.load(Ordering::Relaxed) {
            0 => None,
            ms => Some(ms),
        };
        let consecutive_failures = self.consecutive_failures();
        // "degraded" still serves cached tokens
        let status = match (last_success_ms, consecutive_failures) {
            (_, 0) => "ok",
            (Some(_), _) => "degraded",
            (None, _) => "down",
        };
        HealthReport {
            status,
            polling: self.polling.load(Ordering::Relaxed),
            last_success_ms,
            consecutive_failures,
            token_count: self.token_count.load(Ordering::Relaxed),
            last_error: self.last_error.lock().ok().and_then(|e| e.clone()),
        }
    }
}
