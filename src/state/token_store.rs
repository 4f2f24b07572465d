use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::storage_keys;
use crate::db::KvStore;
use crate::error::Result;
use crate::filter::{apply_filters, FilterCriteria};
use crate::types::Token;

// ---------------------------------------------------------------------------
// TokenState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenState {
    /// Latest list from the backend, replaced wholesale on every successful poll.
    pub tokens: Vec<Token>,
    /// `tokens` narrowed by `criteria`. Recomputed, never persisted.
    pub filtered: Vec<Token>,
    pub criteria: FilterCriteria,
    pub watchlist: Vec<Token>,
    pub loading: bool,
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// The part of [`TokenState`] that survives restarts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedTokenState {
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub watchlist: Vec<Token>,
}

#[derive(Debug, Clone)]
pub enum StoreAction {
    FetchStarted,
    TokensLoaded(Vec<Token>),
    /// User-facing message of the failed fetch.
    FetchFailed(String),
    ApplyFilters(FilterCriteria),
    ResetFilters,
    AddToWatchlist(Token),
    RemoveFromWatchlist(String),
    Restore(PersistedTokenState),
}

impl StoreAction {
    fn name(&self) -> &'static str {
        match self {
            StoreAction::FetchStarted => "fetch_started",
            StoreAction::TokensLoaded(_) => "tokens_loaded",
            StoreAction::FetchFailed(_) => "fetch_failed",
            StoreAction::ApplyFilters(_) => "apply_filters",
            StoreAction::ResetFilters => "reset_filters",
            StoreAction::AddToWatchlist(_) => "add_to_watchlist",
            StoreAction::RemoveFromWatchlist(_) => "remove_from_watchlist",
            StoreAction::Restore(_) => "restore",
        }
    }
}

/// Pure transition function. Every state change in the process goes through here.
pub fn reduce(mut state: TokenState, action: StoreAction) -> TokenState {
    match action {
        StoreAction::FetchStarted => {
            state.loading = true;
            state.error = None;
        }
        StoreAction::TokensLoaded(tokens) => {
            state.filtered = apply_filters(&tokens, &state.criteria);
            state.tokens = tokens;
            state.loading = false;
            state.error = None;
            state.last_updated = Some(Utc::now());
        }
        StoreAction::FetchFailed(message) => {
            // stale tokens stay visible under the error
            state.loading = false;
            state.error = Some(message);
        }
        StoreAction::ApplyFilters(criteria) => {
            state.criteria = criteria.normalized();
            state.filtered = apply_filters(&state.tokens, &state.criteria);
        }
        StoreAction::ResetFilters => {
            state.criteria = FilterCriteria::default();
            state.filtered = state.tokens.clone();
        }
        StoreAction::AddToWatchlist(token) => {
            if !state.watchlist.iter().any(|t| t.id == token.id) {
                state.watchlist.push(token);
            }
        }
        StoreAction::RemoveFromWatchlist(id) => {
            state.watchlist.retain(|t| t.id != id);
        }
        StoreAction::Restore(persisted) => {
            state.filtered = apply_filters(&persisted.tokens, &state.criteria);
            state.tokens = persisted.tokens;
            state.watchlist = persisted.watchlist;
        }
    }
    state
}

// ---------------------------------------------------------------------------
// TokenStore
// ---------------------------------------------------------------------------

/// Single process-wide state container. Writers dispatch actions; readers take
/// snapshots. Concurrent dispatches apply in lock order, last write wins.
pub struct TokenStore {
    state: RwLock<TokenState>,
    version: watch::Sender<u64>,
}

impl TokenStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Apply `action` and notify subscribers. Returns the new version.
    pub fn dispatch(&self, action: StoreAction) -> u64 {
        let name = action.name();
        {
            let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
            let current = std::mem::take(&mut *guard);
            *guard = reduce(current, action);
        }
        let mut version = 0;
        self.version.send_modify(|v| {
            *v += 1;
            version = *v;
        });
        debug!(action = name, version, "store dispatch");
        version
    }

    /// Receiver that changes after every dispatch.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    fn read(&self) -> RwLockReadGuard<'_, TokenState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> TokenState {
        self.read().clone()
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.read().tokens.clone()
    }

    pub fn filtered(&self) -> Vec<Token> {
        self.read().filtered.clone()
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.read().criteria.clone()
    }

    pub fn watchlist(&self) -> Vec<Token> {
        self.read().watchlist.clone()
    }

    pub fn find_token(&self, id: &str) -> Option<Token> {
        let state = self.read();
        state
            .tokens
            .iter()
            .chain(state.watchlist.iter())
            .find(|t| t.id == id)
            .cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn persisted(&self) -> PersistedTokenState {
        let state = self.read();
        PersistedTokenState { tokens: state.tokens.clone(), watchlist: state.watchlist.clone() }
    }

    /// Write tokens + watchlist under the token-store key.
    pub async fn save(&self, kv: &KvStore) -> Result<()> {
        let persisted = self.persisted();
        kv.put_json(storage_keys::TOKEN_STORE, &persisted).await
    }

    /// Load the last saved tokens + watchlist, if any. Returns how many tokens came back.
    pub async fn restore(&self, kv: &KvStore) -> Result<usize> {
        let Some(persisted) = kv.get_json::<PersistedTokenState>(storage_keys::TOKEN_STORE).await?
        else {
            return Ok(0);
        };
        let count = persisted.tokens.len();
        info!(tokens = count, watchlist = persisted.watchlist.len(), "Restored cached token store");
        self.dispatch(StoreAction::Restore(persisted));
        Ok(count)
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        let (version, _) = watch::channel(0);
        Self { state: RwLock::new(TokenState::default()), version }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn token(id: &str, category: &str, liquidity: f64) -> Token {
        Token {
            category: category.to_string(),
            liquidity_score: Some(liquidity),
            ..Token::new(id, id.to_uppercase(), id)
        }
    }

    fn loaded() -> TokenState {
        reduce(
            TokenState::default(),
            StoreAction::TokensLoaded(vec![
                token("a", "defi", 80.0),
                token("b", "memecoin", 20.0),
                token("c", "defi", 40.0),
            ]),
        )
    }

    #[test]
    fn reset_restores_full_list() {
        let criteria = FilterCriteria { category: Some("defi".to_string()), ..Default::default() };
        let state = reduce(loaded(), StoreAction::ApplyFilters(criteria));
        assert_eq!(state.filtered.len(), 2);

        let state = reduce(state, StoreAction::ResetFilters);
        assert_eq!(state.filtered, state.tokens);
        assert!(state.criteria.is_empty());
    }

    #[test]
    fn new_tokens_reapply_active_criteria() {
        let criteria =
            FilterCriteria { min_liquidity_score: Some(50.0), ..FilterCriteria::default() };
        let state = reduce(loaded(), StoreAction::ApplyFilters(criteria));
        let state = reduce(
            state,
            StoreAction::TokensLoaded(vec![token("x", "defi", 10.0), token("y", "defi", 90.0)]),
        );
        let ids: Vec<&str> = state.filtered.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["y"]);
        assert_eq!(state.tokens.len(), 2);
    }

    #[test]
    fn fetch_lifecycle_flags() {
        let state = reduce(TokenState::default(), StoreAction::FetchStarted);
        assert!(state.loading);

        let state = reduce(state, StoreAction::FetchFailed("Request timed out".to_string()));
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Request timed out"));
        assert!(state.last_updated.is_none());

        let state = reduce(state, StoreAction::TokensLoaded(vec![]));
        assert!(state.error.is_none());
        assert!(state.last_updated.is_some());
    }

    #[test]
    fn fetch_start_clears_previous_error() {
        let failed = reduce(TokenState::default(), StoreAction::FetchFailed("Unable to reach the server".to_string()));
        let retrying = reduce(failed, StoreAction::FetchStarted);
        assert!(retrying.loading);
        assert!(retrying.error.is_none());
    }

    #[test]
    fn failed_fetch_keeps_stale_tokens() {
        let state = reduce(loaded(), StoreAction::FetchFailed("boom".to_string()));
        assert_eq!(state.tokens.len(), 3);
    }

    #[test]
    fn watchlist_add_is_idempotent_and_remove_by_id() {
        let a = token("a", "defi", 80.0);
        let state = reduce(TokenState::default(), StoreAction::AddToWatchlist(a.clone()));
        let state = reduce(state, StoreAction::AddToWatchlist(a));
        let state = reduce(state, StoreAction::AddToWatchlist(token("b", "defi", 1.0)));
        assert_eq!(state.watchlist.len(), 2);

        let state = reduce(state, StoreAction::RemoveFromWatchlist("a".to_string()));
        let ids: Vec<&str> = state.watchlist.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);

        let state = reduce(state, StoreAction::RemoveFromWatchlist("missing".to_string()));
        assert_eq!(state.watchlist.len(), 1);
    }

    #[test]
    fn restore_recomputes_filtered() {
        let persisted = PersistedTokenState {
            tokens: vec![token("a", "defi", 80.0)],
            watchlist: vec![token("w", "ai", 50.0)],
        };
        let state = reduce(TokenState::default(), StoreAction::Restore(persisted));
        assert_eq!(state.filtered.len(), 1);
        assert_eq!(state.watchlist[0].id, "w");
    }

    #[tokio::test]
    async fn dispatch_notifies_subscribers() {
        let store = TokenStore::new();
        let mut rx = store.subscribe();
        assert_eq!(store.version(), 0);

        let v = store.dispatch(StoreAction::TokensLoaded(vec![token("a", "defi", 80.0)]));
        assert_eq!(v, 1);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), 1);

        assert_eq!(store.find_token("a").map(|t| t.symbol), Some("A".to_string()));
        assert_eq!(store.persisted().tokens.len(), 1);
    }

    #[tokio::test]
    async fn save_and_restore_round_trip_through_kv() {
        let kv = KvStore::in_memory().await.unwrap();
        let store = TokenStore::new();
        store.dispatch(StoreAction::TokensLoaded(vec![token("a", "defi", 80.0)]));
        store.dispatch(StoreAction::AddToWatchlist(token("w", "ai", 10.0)));
        store.save(&kv).await.unwrap();

        let fresh = TokenStore::new();
        assert_eq!(fresh.restore(&kv).await.unwrap(), 1);
        assert_eq!(fresh.watchlist()[0].id, "w");
        assert_eq!(fresh.filtered().len(), 1);
    }

    #[tokio::test]
    async fn restore_ignores_corrupt_cache() {
        let kv = KvStore::in_memory().await.unwrap();
        kv.put_raw(storage_keys::TOKEN_STORE, "{not json").await.unwrap();
        let store = TokenStore::new();
        assert_eq!(store.restore(&kv).await.unwrap(), 0);
        assert_eq!(store.version(), 0);
    }
}
