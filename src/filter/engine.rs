use std::collections::BTreeMap;

use serde::Serialize;

use crate::filter::criteria::FilterCriteria;
use crate::types::Token;

/// The predicate a token failed. Evaluation stops at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilterRejection {
    Category,
    Exchange,
    MinPrice,
    MaxPrice,
    MinVolumeMarketCapRatio,
    MaxVolumeMarketCapRatio,
    MinCirculatingSupply,
    MaxCirculatingSupply,
    VolumeHealthy,
    CirculatingSupplyGood,
    MinLiquidityScore,
    MaxPumpDumpRiskScore,
    MinWalletDistributionScore,
}

impl FilterRejection {
    pub fn label(&self) -> &'static str {
        match self {
            FilterRejection::Category => "category",
            FilterRejection::Exchange => "exchange",
            FilterRejection::MinPrice => "min_price",
            FilterRejection::MaxPrice => "max_price",
            FilterRejection::MinVolumeMarketCapRatio => "min_volume_market_cap_ratio",
            FilterRejection::MaxVolumeMarketCapRatio => "max_volume_market_cap_ratio",
            FilterRejection::MinCirculatingSupply => "min_circulating_supply_percentage",
            FilterRejection::MaxCirculatingSupply => "max_circulating_supply_percentage",
            FilterRejection::VolumeHealthy => "is_volume_healthy",
            FilterRejection::CirculatingSupplyGood => "is_circulating_supply_good",
            FilterRejection::MinLiquidityScore => "min_liquidity_score",
            FilterRejection::MaxPumpDumpRiskScore => "max_pump_dump_risk_score",
            FilterRejection::MinWalletDistributionScore => "min_wallet_distribution_score",
        }
    }
}

impl std::fmt::Display for FilterRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    pub total: usize,
    pub passed: usize,
    /// rejection label → count
    pub rejected: BTreeMap<&'static str, usize>,
}

impl FilterStats {
    fn record_rejection(&mut self, reason: FilterRejection) {
        *self.rejected.entry(reason.label()).or_insert(0) += 1;
    }
}

/// Inclusive lower bound. A missing value fails an active bound.
fn at_least(value: Option<f64>, min: Option<f64>) -> bool {
    match min {
        None => true,
        Some(min) => value.is_some_and(|v| v >= min),
    }
}

/// Inclusive upper bound. A missing value fails an active bound.
fn at_most(value: Option<f64>, max: Option<f64>) -> bool {
    match max {
        None => true,
        Some(max) => value.is_some_and(|v| v <= max),
    }
}

/// Exact boolean match. A missing value fails an active filter.
fn matches_flag(value: Option<bool>, wanted: Option<bool>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => value == Some(wanted),
    }
}

/// Check a single token against every active criterion.
pub fn evaluate(token: &Token, criteria: &FilterCriteria) -> Result<(), FilterRejection> {
    if let Some(category) = criteria.category.as_deref().filter(|c| !c.is_empty()) {
        if token.category != category {
            return Err(FilterRejection::Category);
        }
    }
    if let Some(exchange) = criteria.exchange.as_deref().filter(|e| !e.trim().is_empty()) {
        let matches = token
            .exchange
            .as_deref()
            .is_some_and(|ex| ex.to_lowercase() == exchange.to_lowercase());
        if !matches {
            return Err(FilterRejection::Exchange);
        }
    }

    if !at_least(token.price, criteria.min_price) {
        return Err(FilterRejection::MinPrice);
    }
    if !at_most(token.price, criteria.max_price) {
        return Err(FilterRejection::MaxPrice);
    }
    if !at_least(token.volume_market_cap_ratio, criteria.min_volume_market_cap_ratio) {
        return Err(FilterRejection::MinVolumeMarketCapRatio);
    }
    if !at_most(token.volume_market_cap_ratio, criteria.max_volume_market_cap_ratio) {
        return Err(FilterRejection::MaxVolumeMarketCapRatio);
    }
    if !at_least(
        token.circulating_supply_percentage,
        criteria.min_circulating_supply_percentage,
    ) {
        return Err(FilterRejection::MinCirculatingSupply);
    }
    if !at_most(
        token.circulating_supply_percentage,
        criteria.max_circulating_supply_percentage,
    ) {
        return Err(FilterRejection::MaxCirculatingSupply);
    }
    if !matches_flag(token.is_volume_healthy, criteria.is_volume_healthy) {
        return Err(FilterRejection::VolumeHealthy);
    }
    if !matches_flag(token.is_circulating_supply_good, criteria.is_circulating_supply_good) {
        return Err(FilterRejection::CirculatingSupplyGood);
    }
    if !at_least(token.liquidity_score, criteria.min_liquidity_score) {
        return Err(FilterRejection::MinLiquidityScore);
    }
    if !at_most(token.pump_dump_risk_score, criteria.max_pump_dump_risk_score) {
        return Err(FilterRejection::MaxPumpDumpRiskScore);
    }
    if !at_least(token.wallet_distribution_score, criteria.min_wallet_distribution_score) {
        return Err(FilterRejection::MinWalletDistributionScore);
    }
    Ok(())
}

/// Subset of `tokens` satisfying all active criteria, in input order.
pub fn apply_filters(tokens: &[Token], criteria: &FilterCriteria) -> Vec<Token> {
    apply_filters_with_stats(tokens, criteria).0
}

pub fn apply_filters_with_stats(
    tokens: &[Token],
    criteria: &FilterCriteria,
) -> (Vec<Token>, FilterStats) {
    let mut stats = FilterStats { total: tokens.len(), ..FilterStats::default() };
    let mut passed = Vec::with_capacity(tokens.len());

    for token in tokens {
        match evaluate(token, criteria) {
            Ok(()) => passed.push(token.clone()),
            Err(reason) => stats.record_rejection(reason),
        }
    }

    stats.passed = passed.len();
    (passed, stats)
}
