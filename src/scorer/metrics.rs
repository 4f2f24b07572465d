//! Per-token analytics shown on the detail view: overall grade, risk gauge,
//! volume health. Inputs are the upstream scores, used as-is.

use serde::Serialize;

use crate::types::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum InvestmentGrade {
    A,
    B,
    C,
    D,
    F,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signals {
    pub bullish: Vec<String>,
    pub bearish: Vec<String>,
    pub neutral: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetrics {
    /// 0–100
    pub overall_score: f64,
    pub risk_level: RiskLevel,
    pub investment_grade: InvestmentGrade,
    pub signals: Signals,
}

/// Score used when no component is known.
const NEUTRAL_SCORE: f64 = 50.0;

pub fn token_metrics(token: &Token) -> TokenMetrics {
    let mut signals = Signals::default();
    // each component is worth up to 25
    let mut components: Vec<f64> = Vec::with_capacity(4);

    if let Some(liquidity) = token.liquidity_score {
        components.push(liquidity / 100.0 * 25.0);
        if liquidity >= 70.0 {
            signals.bullish.push("High liquidity".to_string());
        } else if liquidity < 30.0 {
            signals.bearish.push("Low liquidity".to_string());
        }
    }

    if let Some(healthy) = token.is_volume_healthy {
        components.push(if healthy { 25.0 } else { 5.0 });
        if healthy {
            signals.bullish.push("Healthy trading volume".to_string());
        } else {
            signals.bearish.push("Unhealthy trading volume".to_string());
        }
    }

    if let Some(risk) = token.pump_dump_risk_score {
        components.push((100.0 - risk) / 100.0 * 25.0);
        if risk <= 30.0 {
            signals.bullish.push("Low pump & dump risk".to_string());
        } else if risk >= 70.0 {
            signals.bearish.push("High pump & dump risk".to_string());
        }
    }

    if let Some(distribution) = token.wallet_distribution_score {
        components.push(distribution / 100.0 * 25.0);
        if distribution >= 70.0 {
            signals.bullish.push("Good wallet distribution".to_string());
        } else if distribution < 30.0 {
            signals.bearish.push("Poor wallet distribution".to_string());
        }
    }

    if let Some(ratio) = token.volume_market_cap_ratio {
        if ratio > 2.0 {
            signals
                .bearish
                .push("Extremely high volume/market cap ratio (possible manipulation)".to_string());
        } else if ratio > 1.0 {
            signals.neutral.push("High trading activity".to_string());
        } else if ratio > 0.5 {
            signals.bullish.push("Healthy volume/market cap ratio".to_string());
        } else if ratio < 0.1 {
            signals.bearish.push("Very low trading activity".to_string());
        }
    }

    let overall_score = if components.is_empty() {
        NEUTRAL_SCORE
    } else {
        components.iter().sum::<f64>() / components.len() as f64 * 4.0
    };

    let risk_factors = [
        token.pump_dump_risk_score.is_some_and(|r| r > 70.0),
        token.liquidity_score.is_some_and(|l| l < 30.0),
        token.wallet_distribution_score.is_some_and(|d| d < 30.0),
        token.is_volume_healthy == Some(false),
        token.volume_market_cap_ratio.is_some_and(|r| r > 2.0),
    ]
    .iter()
    .filter(|&&hit| hit)
    .count();

    let risk_level = match risk_factors {
        0 => RiskLevel::Low,
        1 => RiskLevel::Medium,
        2..=3 => RiskLevel::High,
        _ => RiskLevel::VeryHigh,
    };

    let investment_grade = if overall_score >= 80.0 && risk_level == RiskLevel::Low {
        InvestmentGrade::A
    } else if overall_score >= 70.0 && matches!(risk_level, RiskLevel::Low | RiskLevel::Medium) {
        InvestmentGrade::B
    } else if overall_score >= 50.0 {
        InvestmentGrade::C
    } else if overall_score >= 30.0 {
        InvestmentGrade::D
    } else {
        InvestmentGrade::F
    };

    TokenMetrics { overall_score, risk_level, investment_grade, signals }
}

// ---------------------------------------------------------------------------
// Risk gauge
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Medium,
    High,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskIndicator {
    pub band: RiskBand,
    /// Share of the maximum risk points hit, 0–100. `None` when nothing is known.
    pub risk_percentage: Option<f64>,
}

/// Each known input contributes up to 100 risk points.
pub fn risk_indicator(token: &Token) -> RiskIndicator {
    let mut risk_points = 0.0;
    let mut total_points = 0.0;

    if let Some(pump_dump) = token.pump_dump_risk_score {
        total_points += 100.0;
        risk_points += if pump_dump > 70.0 {
            100.0
        } else if pump_dump > 50.0 {
            60.0
        } else if pump_dump > 30.0 {
            30.0
        } else {
            0.0
        };
    }

    for low_is_risky in [token.liquidity_score, token.wallet_distribution_score].into_iter().flatten() {
        total_points += 100.0;
        risk_points += if low_is_risky < 30.0 {
            100.0
        } else if low_is_risky < 50.0 {
            60.0
        } else if low_is_risky < 70.0 {
            30.0
        } else {
            0.0
        };
    }

    if let Some(healthy) = token.is_volume_healthy {
        total_points += 100.0;
        if !healthy {
            risk_points += 100.0;
        }
    }

    if let Some(ratio) = token.volume_market_cap_ratio {
        total_points += 100.0;
        risk_points += if ratio > 2.0 || ratio < 0.01 {
            100.0
        } else if ratio > 1.5 || ratio < 0.05 {
            60.0
        } else if ratio > 1.0 || ratio < 0.1 {
            30.0
        } else {
            0.0
        };
    }

    if total_points == 0.0 {
        return RiskIndicator { band: RiskBand::Unknown, risk_percentage: None };
    }

    let pct = risk_points / total_points * 100.0;
    let band = if pct >= 70.0 {
        RiskBand::High
    } else if pct >= 40.0 {
        RiskBand::Medium
    } else {
        RiskBand::Low
    };
    RiskIndicator { band, risk_percentage: Some(pct) }
}

// ---------------------------------------------------------------------------
// Volume health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeHealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeHealth {
    pub status: VolumeHealthStatus,
    pub description: &'static str,
}

pub fn volume_health(volume_market_cap_ratio: Option<f64>) -> VolumeHealth {
    let (status, description) = match volume_market_cap_ratio {
        None => (VolumeHealthStatus::Unknown, "No volume data available"),
        Some(r) if r > 2.0 => {
            (VolumeHealthStatus::Poor, "Extremely high volume - possible manipulation")
        }
        Some(r) if r > 1.0 => (VolumeHealthStatus::Fair, "High trading activity - monitor closely"),
        Some(r) if r > 0.5 => (VolumeHealthStatus::Excellent, "Healthy trading volume"),
        Some(r) if r > 0.1 => (VolumeHealthStatus::Good, "Normal trading activity"),
        Some(_) => (VolumeHealthStatus::Poor, "Very low trading activity"),
    };
    VolumeHealth { status, description }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token::new("t", "T", "Test")
    }

    #[test]
    fn unknown_token_gets_neutral_metrics() {
        let m = token_metrics(&token());
        assert_eq!(m.overall_score, 50.0);
        assert_eq!(m.risk_level, RiskLevel::Low);
        assert_eq!(m.investment_grade, InvestmentGrade::C);
        assert_eq!(risk_indicator(&token()).band, RiskBand::Unknown);
    }

    #[test]
    fn strong_token_grades_a() {
        let t = Token {
            liquidity_score: Some(90.0),
            is_volume_healthy: Some(true),
            pump_dump_risk_score: Some(10.0),
            wallet_distribution_score: Some(80.0),
            volume_market_cap_ratio: Some(0.6),
            ..token()
        };
        let m = token_metrics(&t);
        // (22.5 + 25 + 22.5 + 20) / 4 * 4
        assert!((m.overall_score - 90.0).abs() < 1e-9);
        assert_eq!(m.investment_grade, InvestmentGrade::A);
        assert_eq!(m.signals.bullish.len(), 5);
        assert!(m.signals.bearish.is_empty());
        assert_eq!(risk_indicator(&t).band, RiskBand::Low);
    }

    #[test]
    fn many_risk_factors_are_very_high() {
        let t = Token {
            liquidity_score: Some(10.0),
            is_volume_healthy: Some(false),
            pump_dump_risk_score: Some(95.0),
            wallet_distribution_score: Some(5.0),
            volume_market_cap_ratio: Some(3.0),
            ..token()
        };
        let m = token_metrics(&t);
        assert_eq!(m.risk_level, RiskLevel::VeryHigh);
        assert_eq!(m.investment_grade, InvestmentGrade::F);
        let gauge = risk_indicator(&t);
        assert_eq!(gauge.band, RiskBand::High);
        assert_eq!(gauge.risk_percentage, Some(100.0));
    }

    #[test]
    fn missing_volume_health_is_not_a_risk_factor() {
        let t = Token { liquidity_score: Some(80.0), ..token() };
        assert_eq!(token_metrics(&t).risk_level, RiskLevel::Low);
    }

    #[test]
    fn volume_health_bands() {
        assert_eq!(volume_health(None).status, VolumeHealthStatus::Unknown);
        assert_eq!(volume_health(Some(2.5)).status, VolumeHealthStatus::Poor);
        assert_eq!(volume_health(Some(1.2)).status, VolumeHealthStatus::Fair);
        assert_eq!(volume_health(Some(0.7)).status, VolumeHealthStatus::Excellent);
        assert_eq!(volume_health(Some(0.3)).status, VolumeHealthStatus::Good);
        assert_eq!(volume_health(Some(0.0)).status, VolumeHealthStatus::Poor);
    }
}
