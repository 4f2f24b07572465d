//! Search and column sorting for the token table view.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::types::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Symbol,
    Name,
    Price,
    Volume24h,
    MarketCap,
    VolumeMarketCapRatio,
    LiquidityScore,
    PumpDumpRiskScore,
    WalletDistributionScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_string()))
            .map_err(|_| AppError::Validation(format!("unknown sort column '{s}'")))
    }
}

impl std::str::FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(AppError::Validation(format!("unknown sort direction '{other}'"))),
        }
    }
}

enum SortValue<'a> {
    Text(&'a str),
    Number(Option<f64>),
}

fn sort_value(token: &Token, key: SortKey) -> SortValue<'_> {
    match key {
        SortKey::Symbol => SortValue::Text(&token.symbol),
        SortKey::Name => SortValue::Text(&token.name),
        SortKey::Price => SortValue::Number(token.price),
        SortKey::Volume24h => SortValue::Number(token.volume24h),
        SortKey::MarketCap => SortValue::Number(token.market_cap),
        SortKey::VolumeMarketCapRatio => SortValue::Number(token.volume_market_cap_ratio),
        SortKey::LiquidityScore => SortValue::Number(token.liquidity_score),
        SortKey::PumpDumpRiskScore => SortValue::Number(token.pump_dump_risk_score),
        SortKey::WalletDistributionScore => SortValue::Number(token.wallet_distribution_score),
    }
}

/// Stable sort by a column. Tokens missing the column sort last in either direction.
pub fn sort_tokens(tokens: &mut [Token], key: SortKey, direction: SortDirection) {
    tokens.sort_by(|a, b| {
        let ordering = match (sort_value(a, key), sort_value(b, key)) {
            (SortValue::Text(x), SortValue::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
            (SortValue::Number(Some(x)), SortValue::Number(Some(y))) => x.total_cmp(&y),
            (SortValue::Number(Some(_)), SortValue::Number(None)) => return Ordering::Less,
            (SortValue::Number(None), SortValue::Number(Some(_))) => return Ordering::Greater,
            _ => Ordering::Equal,
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Case-insensitive substring search over symbol and name. Blank query keeps all.
pub fn search_tokens(tokens: &[Token], query: &str) -> Vec<Token> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return tokens.to_vec();
    }
    tokens
        .iter()
        .filter(|t| {
            t.symbol.to_lowercase().contains(&needle) || t.name.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn priced(id: &str, price: Option<f64>) -> Token {
        Token { price, ..Token::new(id, id.to_uppercase(), format!("{id} coin")) }
    }

    fn ids(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn missing_values_sort_last_both_ways() {
        let mut tokens = vec![priced("a", None), priced("b", Some(2.0)), priced("c", Some(1.0))];
        sort_tokens(&mut tokens, SortKey::Price, SortDirection::Asc);
        assert_eq!(ids(&tokens), vec!["c", "b", "a"]);
        sort_tokens(&mut tokens, SortKey::Price, SortDirection::Desc);
        assert_eq!(ids(&tokens), vec!["b", "c", "a"]);
    }

    #[test]
    fn text_sort_ignores_case() {
        let mut tokens = vec![
            Token::new("1", "eth", "Ether"),
            Token::new("2", "BTC", "Bitcoin"),
            Token::new("3", "ada", "Cardano"),
        ];
        sort_tokens(&mut tokens, SortKey::Symbol, SortDirection::Asc);
        assert_eq!(ids(&tokens), vec!["3", "2", "1"]);
    }

    #[test]
    fn search_matches_symbol_or_name() {
        let tokens = vec![Token::new("1", "ETH", "Ether"), Token::new("2", "BTC", "Bitcoin")];
        assert_eq!(ids(&search_tokens(&tokens, "bit")), vec!["2"]);
        assert_eq!(ids(&search_tokens(&tokens, "eth")), vec!["1"]);
        assert_eq!(search_tokens(&tokens, "  ").len(), 2);
    }

    #[test]
    fn sort_key_parses_camel_case() {
        assert_eq!("liquidityScore".parse::<SortKey>().unwrap(), SortKey::LiquidityScore);
        assert!("rank".parse::<SortKey>().is_err());
    }
}
