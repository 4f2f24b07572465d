use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::scorer::picks::{ai_picks, RiskProfile};
use crate::state::TokenStore;
use crate::types::Token;

/// Top pick for one profile, as logged after each token refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub profile: RiskProfile,
    pub pick_count: usize,
    pub top_symbol: Option<String>,
    pub top_score: Option<f64>,
}

pub fn summarize_picks(tokens: &[Token], allowed_exchanges: &[String]) -> Vec<ProfileSummary> {
    RiskProfile::ALL
        .iter()
        .map(|&profile| {
            let picks = ai_picks(tokens, profile, allowed_exchanges);
            let top = picks.first();
            ProfileSummary {
                profile,
                pick_count: picks.len(),
                top_symbol: top.map(|p| p.token.symbol.clone()),
                top_score: top.map(|p| p.total_score),
            }
        })
        .collect()
}

/// Background task that re-scores the token list whenever a new one lands in
/// the store and logs the leading pick per risk profile.
pub struct PicksReporter {
    store: Arc<TokenStore>,
    allowed_exchanges: Vec<String>,
}

impl PicksReporter {
    pub fn new(store: Arc<TokenStore>, allowed_exchanges: Vec<String>) -> Self {
        Self { store, allowed_exchanges }
    }

    pub async fn run(self) {
        let mut updates = self.store.subscribe();
        let mut last_reported: Option<DateTime<Utc>> = None;

        while updates.changed().await.is_ok() {
            let state = self.store.snapshot();
            // only fresh token lists, not filter or watchlist edits
            if state.last_updated.is_none() || state.last_updated == last_reported {
                continue;
            }
            last_reported = state.last_updated;
            self.report(&state.tokens);
        }
        debug!("Store closed, picks reporter exiting");
    }

    fn report(&self, tokens: &[Token]) {
        for summary in summarize_picks(tokens, &self.allowed_exchanges) {
            match (&summary.top_symbol, summary.top_score) {
                (Some(symbol), Some(score)) => info!(
                    profile = %summary.profile,
                    picks = summary.pick_count,
                    top = %symbol,
                    score,
                    "AI picks [{}]: {} picks, top {} ({:.2})",
                    summary.profile,
                    summary.pick_count,
                    symbol,
                    score,
                ),
                _ => info!(profile = %summary.profile, "AI picks [{}]: no qualifying tokens", summary.profile),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, liquidity: f64) -> Token {
        Token {
            exchange: Some("kraken".to_string()),
            volume_market_cap_ratio: Some(0.8),
            liquidity_score: Some(liquidity),
            pump_dump_risk_score: Some(10.0),
            wallet_distribution_score: Some(85.0),
            ..Token::new(id, id.to_uppercase(), id)
        }
    }

    #[test]
    fn summary_covers_every_profile() {
        let tokens = vec![scored("low", 60.0), scored("high", 95.0)];
        let summaries = summarize_picks(&tokens, &["kraken".to_string()]);
        assert_eq!(summaries.len(), 3);
        for s in &summaries {
            assert_eq!(s.top_symbol.as_deref(), Some("HIGH"), "{}", s.profile);
        }
    }

    #[test]
    fn empty_list_has_no_top_pick() {
        let summaries = summarize_picks(&[], &[]);
        assert!(summaries.iter().all(|s| s.pick_count == 0 && s.top_symbol.is_none()));
    }
}
