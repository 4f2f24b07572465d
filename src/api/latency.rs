//! In-memory latency histogram for backend token fetches.
//! The poller records each successful request; the API reads percentiles.

use std::sync::Mutex;
use std::time::Duration;

use hdrhistogram::Histogram;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Shared latency stats. Values stored in microseconds.
pub struct LatencyStats {
    inner: Mutex<Histogram<u64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySnapshot {
    pub samples: u64,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

impl LatencyStats {
    /// Tracks 1us to 100s, 3 significant figures.
    pub fn new() -> Result<Self> {
        let histogram = Histogram::new_with_bounds(1, 100_000_000, 3)
            .map_err(|e| AppError::Config(format!("latency histogram: {e}")))?;
        Ok(Self { inner: Mutex::new(histogram) })
    }

    pub fn record_us(&self, us: u64) {
        if let Ok(mut h) = self.inner.lock() {
            // saturating keeps out-of-range samples at the upper bound
            h.saturating_record(us.max(1));
        }
    }

    pub fn record(&self, d: Duration) {
        let us = d.as_micros().min(u128::from(u64::MAX)) as u64;
        self.record_us(us);
    }

    pub fn snapshot(&self) -> LatencySnapshot {
        let empty = LatencySnapshot { samples: 0, p50_ms: None, p95_ms: None, p99_ms: None, max_ms: None };
        let Ok(h) = self.inner.lock() else {
            return empty;
        };
        if h.is_empty() {
            return empty;
        }
        let ms = |us: u64| Some(us as f64 / 1_000.0);
        LatencySnapshot {
            samples: h.len(),
            p50_ms: ms(h.value_at_quantile(0.5)),
            p95_ms: ms(h.value_at_quantile(0.95)),
            p99_ms: ms(h.value_at_quantile(0.99)),
            max_ms: ms(h.max()),
        }
    }

    pub fn len(&self) -> u64 {
        self.inner.lock().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_histogram_has_no_percentiles() {
        let stats = LatencyStats::new().unwrap();
        let snap = stats.snapshot();
        assert_eq!(snap.samples, 0);
        assert!(snap.p50_ms.is_none());
    }

    #[test]
    fn records_durations_in_ms() {
        let stats = LatencyStats::new().unwrap();
        for _ in 0..10 {
            stats.record(Duration::from_millis(20));
        }
        let snap = stats.snapshot();
        assert_eq!(snap.samples, 10);
        let p50 = snap.p50_ms.unwrap();
        assert!((p50 - 20.0).abs() < 0.1, "p50={p50}");
    }
}
