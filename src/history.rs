use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::TokenHistory;

/// Trend strength (percent) above which a series counts as bullish/bearish.
const TREND_THRESHOLD_PCT: f64 = 5.0;

/// One row per UTC calendar day, the latest observation of that day, oldest day first.
pub fn dedup_by_day(rows: &[TokenHistory]) -> Vec<TokenHistory> {
    let mut by_day: BTreeMap<NaiveDate, &TokenHistory> = BTreeMap::new();
    for row in rows {
        let day = row.timestamp.date_naive();
        match by_day.get(&day) {
            Some(existing) if existing.timestamp > row.timestamp => {}
            _ => {
                by_day.insert(day, row);
            }
        }
    }
    by_day.into_values().cloned().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceVolatility {
    /// Coefficient of variation, percent.
    pub volatility: f64,
    pub trend: Trend,
    /// |second-half mean vs first-half mean|, percent.
    pub strength: f64,
}

impl PriceVolatility {
    fn flat() -> Self {
        Self { volatility: 0.0, trend: Trend::Neutral, strength: 0.0 }
    }
}

pub fn price_volatility(prices: &[f64]) -> PriceVolatility {
    if prices.len() < 2 {
        return PriceVolatility::flat();
    }

    let mean = prices.iter().sum::<f64>() / prices.len() as f64;
    if mean == 0.0 {
        return PriceVolatility::flat();
    }
    let variance = prices.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / prices.len() as f64;
    let volatility = variance.sqrt() / mean * 100.0;

    let (first, second) = prices.split_at(prices.len() / 2);
    let first_avg = first.iter().sum::<f64>() / first.len() as f64;
    let second_avg = second.iter().sum::<f64>() / second.len() as f64;
    let trend_pct = if first_avg == 0.0 { 0.0 } else { (second_avg - first_avg) / first_avg * 100.0 };

    let trend = if trend_pct > TREND_THRESHOLD_PCT {
        Trend::Bullish
    } else if trend_pct < -TREND_THRESHOLD_PCT {
        Trend::Bearish
    } else {
        Trend::Neutral
    };

    PriceVolatility { volatility, trend, strength: trend_pct.abs() }
}

/// Daily-deduplicated series plus a volatility summary over its prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub points: Vec<TokenHistory>,
    pub volatility: PriceVolatility,
}

pub fn summarize(rows: &[TokenHistory]) -> HistorySummary {
    let points = dedup_by_day(rows);
    let prices: Vec<f64> = points.iter().filter_map(|p| p.price).collect();
    let volatility = price_volatility(&prices);
    HistorySummary { points, volatility }
}
