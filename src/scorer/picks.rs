use serde::{Deserialize, Serialize};

use crate::config::AI_PICKS_LIMIT;
use crate::error::AppError;
use crate::types::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

/// Component weights. Every profile's weights sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreWeights {
    pub volume: f64,
    pub liquidity: f64,
    pub risk: f64,
    pub distribution: f64,
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.volume + self.liquidity + self.risk + self.distribution
    }
}

impl RiskProfile {
    pub const ALL: [RiskProfile; 3] =
        [RiskProfile::Conservative, RiskProfile::Balanced, RiskProfile::Aggressive];

    pub fn weights(&self) -> ScoreWeights {
        match self {
            RiskProfile::Balanced => {
                ScoreWeights { volume: 0.25, liquidity: 0.25, risk: 0.25, distribution: 0.25 }
            }
            RiskProfile::Conservative => {
                ScoreWeights { volume: 0.15, liquidity: 0.30, risk: 0.35, distribution: 0.20 }
            }
            RiskProfile::Aggressive => {
                ScoreWeights { volume: 0.35, liquidity: 0.20, risk: 0.15, distribution: 0.30 }
            }
        }
    }

    /// Picks scoring below this are dropped.
    pub fn min_total_score(&self) -> f64 {
        match self {
            RiskProfile::Conservative => 70.0,
            RiskProfile::Balanced => 60.0,
            RiskProfile::Aggressive => 50.0,
        }
    }

    pub fn next(&self) -> RiskProfile {
        match self {
            RiskProfile::Conservative => RiskProfile::Balanced,
            RiskProfile::Balanced => RiskProfile::Aggressive,
            RiskProfile::Aggressive => RiskProfile::Conservative,
        }
    }
}

impl std::fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RiskProfile::Conservative => "conservative",
            RiskProfile::Balanced => "balanced",
            RiskProfile::Aggressive => "aggressive",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RiskProfile {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conservative" => Ok(RiskProfile::Conservative),
            "balanced" => Ok(RiskProfile::Balanced),
            "aggressive" => Ok(RiskProfile::Aggressive),
            other => Err(AppError::Validation(format!("unknown risk profile '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenScore {
    pub token: Token,
    pub volume_score: f64,
    pub liquidity_score: f64,
    pub risk_score: f64,
    pub distribution_score: f64,
    pub total_score: f64,
    pub confidence: f64,
}

/// Composite score for one token. `None` when any of the four inputs is missing.
pub fn score_token(token: &Token, profile: RiskProfile) -> Option<TokenScore> {
    let ratio = token.volume_market_cap_ratio?;
    let liquidity = token.liquidity_score?;
    let pump_dump = token.pump_dump_risk_score?;
    let distribution = token.wallet_distribution_score?;

    let volume_score = (ratio * 100.0).min(100.0);
    let risk_score = 100.0 - pump_dump;

    let w = profile.weights();
    let total_score = volume_score * w.volume
        + liquidity * w.liquidity
        + risk_score * w.risk
        + distribution * w.distribution;

    let components = [volume_score, liquidity, risk_score, distribution];
    let mean = components.iter().sum::<f64>() / components.len() as f64;
    let variance =
        components.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / components.len() as f64;
    let consistency = 100.0 - (variance / 10.0).min(100.0);
    let health_bonus = if token.is_volume_healthy == Some(true) { 20.0 } else { 0.0 };
    let confidence = ((consistency + health_bonus) / 1.2).min(100.0);

    Some(TokenScore {
        token: token.clone(),
        volume_score,
        liquidity_score: liquidity,
        risk_score,
        distribution_score: distribution,
        total_score,
        confidence,
    })
}

/// True when `token` trades on a whitelisted exchange. An empty whitelist allows all.
pub fn on_allowed_exchange(token: &Token, allowed_exchanges: &[String]) -> bool {
    if allowed_exchanges.is_empty() {
        return true;
    }
    token.exchange.as_deref().is_some_and(|ex| {
        let ex = ex.to_lowercase();
        allowed_exchanges.iter().any(|a| a.to_lowercase() == ex)
    })
}

/// Top scoring tokens for a profile: whitelist, score, threshold, stable sort
/// descending, capped at ten.
pub fn ai_picks(
    tokens: &[Token],
    profile: RiskProfile,
    allowed_exchanges: &[String],
) -> Vec<TokenScore> {
    let min_score = profile.min_total_score();
    let mut picks: Vec<TokenScore> = tokens
        .iter()
        .filter(|t| on_allowed_exchange(t, allowed_exchanges))
        .filter_map(|t| score_token(t, profile))
        .filter(|s| s.total_score >= min_score)
        .collect();

    // sort_by is stable: equal scores keep input order.
    picks.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    picks.truncate(AI_PICKS_LIMIT);
    picks
}
