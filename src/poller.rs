use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::client::{ApiClient, TokenQuery};
use crate::config::Config;
use crate::db::KvStore;
use crate::error::Result;
use crate::state::{StoreAction, TokenStore};
use crate::types::Token;

/// Floor for the poll period; `interval` rejects a zero period.
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A recent response, reused for identical requests inside the dedup window.
struct CachedResponse {
    fetched_at: Instant,
    tokens: Arc<Vec<Token>>,
}

/// Polls the backend token list into the store on a fixed interval.
///
/// Identical requests inside the dedup window reuse the previous response, and
/// overlapping polls are serialized so the later one sees the earlier result.
/// Failed fetches are retried a fixed number of times with a fixed delay.
pub struct TokenPoller {
    client: ApiClient,
    store: Arc<TokenStore>,
    kv: KvStore,
    latency: Arc<LatencyStats>,
    health: Arc<HealthState>,
    query: TokenQuery,
    poll_interval: Duration,
    dedup_window: Duration,
    max_retries: u32,
    retry_delay: Duration,
    /// request URL → last response
    cache: DashMap<String, CachedResponse>,
    in_flight: Mutex<()>,
}

impl TokenPoller {
    pub fn new(
        cfg: &Config,
        client: ApiClient,
        store: Arc<TokenStore>,
        kv: KvStore,
        latency: Arc<LatencyStats>,
        health: Arc<HealthState>,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            store,
            kv,
            latency,
            health,
            query: TokenQuery::from_config(cfg),
            poll_interval: cfg.poll_interval,
            dedup_window: cfg.dedup_window,
            max_retries: cfg.fetch_max_retries,
            retry_delay: cfg.fetch_retry_delay,
            cache: DashMap::new(),
            in_flight: Mutex::new(()),
        })
    }

    pub async fn run(self: Arc<Self>) {
        let mut ticker = interval(self.poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // first tick fires immediately: nothing has been fetched yet
        loop {
            ticker.tick().await;
            if let Err(e) = self.poll(false).await {
                error!("Token poll failed: {e}");
            }
        }
    }

    /// One poll cycle. `force` bypasses the dedup window (manual refresh).
    /// Returns the number of tokens now in the store.
    pub async fn poll(&self, force: bool) -> Result<usize> {
        self.store.dispatch(StoreAction::FetchStarted);
        self.health.poll_started();

        match self.fetch_deduped(force).await {
            Ok(tokens) => {
                let count = tokens.len();
                self.store.dispatch(StoreAction::TokensLoaded(tokens.as_ref().clone()));
                self.health.poll_succeeded(count);
                if let Err(e) = self.store.save(&self.kv).await {
                    warn!("Failed to persist token store: {e}");
                }
                info!(tokens = count, forced = force, "Token poll complete");
                Ok(count)
            }
            Err(e) => {
                let message = e.user_message();
                self.store.dispatch(StoreAction::FetchFailed(message.clone()));
                self.health.poll_failed(&message);
                Err(e)
            }
        }
    }

    async fn fetch_deduped(&self, force: bool) -> Result<Arc<Vec<Token>>> {
        let url = self.client.tokens_url(&self.query)?;
        let _guard = self.in_flight.lock().await;

        if !force {
            if let Some(cached) = self.cache.get(&url) {
                if cached.fetched_at.elapsed() < self.dedup_window {
                    info!(url = %url, "Reusing token list fetched {:?} ago", cached.fetched_at.elapsed());
                    return Ok(Arc::clone(&cached.tokens));
                }
            }
        }

        let tokens = Arc::new(self.fetch_with_retry(&url).await?);
        self.cache.insert(
            url,
            CachedResponse { fetched_at: Instant::now(), tokens: Arc::clone(&tokens) },
        );
        Ok(tokens)
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<Vec<Token>> {
        let mut attempt = 0u32;
        loop {
            let started = Instant::now();
            match self.client.fetch_tokens_at(url).await {
                Ok(tokens) => {
                    self.latency.record(started.elapsed());
                    return Ok(tokens);
                }
                Err(e) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        "Token fetch failed, retrying in {:?}: {e}",
                        self.retry_delay,
                    );
                    sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
