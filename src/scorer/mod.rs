pub mod metrics;
pub mod picks;
pub mod reporter;

pub use metrics::{
    risk_indicator, token_metrics, volume_health, InvestmentGrade, RiskBand, RiskIndicator,
    RiskLevel, TokenMetrics, VolumeHealth, VolumeHealthStatus,
};
pub use picks::{ai_picks, score_token, RiskProfile, ScoreWeights, TokenScore};
pub use reporter::PicksReporter;
