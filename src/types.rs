use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Snapshot of one tradable asset as exposed by the backend.
///
/// Every market/derived field is optional: `None` means upstream had no data,
/// which is distinct from a reported zero. Derived scores are opaque inputs and
/// are never recomputed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TokenWire")]
pub struct Token {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fully_diluted_valuation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_volume24h: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_market_cap_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub circulating_supply_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_volume_healthy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_circulating_supply_good: Option<bool>,
    /// 0–100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity_score: Option<f64>,
    /// 0–100, higher = riskier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pump_dump_risk_score: Option<f64>,
    /// 0–100, higher = more decentralized
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_distribution_score: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_multiplier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<TokenStats>,
}

fn unknown_category() -> String {
    "Unknown".to_string()
}

/// Backend row as sent. Mongo-style rows may carry `_id`, `id`, or both;
/// identity and labels may be null.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    exchange: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    volume24h: Option<f64>,
    #[serde(default)]
    fully_diluted_valuation: Option<f64>,
    #[serde(default)]
    transfer_volume24h: Option<f64>,
    #[serde(default)]
    volume_market_cap_ratio: Option<f64>,
    #[serde(default)]
    circulating_supply_percentage: Option<f64>,
    #[serde(default)]
    is_volume_healthy: Option<bool>,
    #[serde(default)]
    is_circulating_supply_good: Option<bool>,
    #[serde(default)]
    liquidity_score: Option<f64>,
    #[serde(default)]
    pump_dump_risk_score: Option<f64>,
    #[serde(default)]
    wallet_distribution_score: Option<f64>,
    #[serde(default)]
    potential_multiplier: Option<f64>,
    #[serde(default)]
    rank: Option<u32>,
    #[serde(default)]
    stats: Option<TokenStats>,
}

impl TryFrom<TokenWire> for Token {
    type Error = String;

    fn try_from(wire: TokenWire) -> std::result::Result<Self, Self::Error> {
        let id = wire
            .id
            .filter(|id| !id.is_empty())
            .or(wire.mongo_id.filter(|id| !id.is_empty()))
            .ok_or_else(|| "token row has neither `id` nor `_id`".to_string())?;
        Ok(Self {
            id,
            symbol: wire.symbol.unwrap_or_default(),
            name: wire.name.unwrap_or_default(),
            category: wire
                .category
                .filter(|c| !c.is_empty())
                .unwrap_or_else(unknown_category),
            exchange: wire.exchange,
            price: wire.price,
            market_cap: wire.market_cap,
            volume24h: wire.volume24h,
            fully_diluted_valuation: wire.fully_diluted_valuation,
            transfer_volume24h: wire.transfer_volume24h,
            volume_market_cap_ratio: wire.volume_market_cap_ratio,
            circulating_supply_percentage: wire.circulating_supply_percentage,
            is_volume_healthy: wire.is_volume_healthy,
            is_circulating_supply_good: wire.is_circulating_supply_good,
            liquidity_score: wire.liquidity_score,
            pump_dump_risk_score: wire.pump_dump_risk_score,
            wallet_distribution_score: wire.wallet_distribution_score,
            potential_multiplier: wire.potential_multiplier,
            rank: wire.rank,
            stats: wire.stats,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility_score24h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidity_score: Option<f64>,
}

impl Token {
    /// Bare token with only identity fields set. Handy for tests and fixtures.
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            name: name.into(),
            category: unknown_category(),
            exchange: None,
            price: None,
            market_cap: None,
            volume24h: None,
            fully_diluted_valuation: None,
            transfer_volume24h: None,
            volume_market_cap_ratio: None,
            circulating_supply_percentage: None,
            is_volume_healthy: None,
            is_circulating_supply_good: None,
            liquidity_score: None,
            pump_dump_risk_score: None,
            wallet_distribution_score: None,
            potential_multiplier: None,
            rank: None,
            stats: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Token history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHistory {
    pub token_id: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub volume24h: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "24h")]
    Day,
    #[default]
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Timeframe {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "24h" | "1d" => Ok(Timeframe::Day),
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            other => Err(AppError::Validation(format!("unknown timeframe '{other}'"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    PriceAbove,
    PriceBelow,
    VolumeSpike,
    WhaleMove,
    /// Types this client does not know yet are kept verbatim.
    #[serde(untagged)]
    Other(String),
}

impl AlertType {
    pub fn label(&self) -> &str {
        match self {
            AlertType::PriceAbove => "Price Above",
            AlertType::PriceBelow => "Price Below",
            AlertType::VolumeSpike => "Volume Spike",
            AlertType::WhaleMove => "Whale Movement",
            AlertType::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertToken {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    pub token_id: String,
    pub alert_type: AlertType,
    pub threshold: f64,
    #[serde(default)]
    pub channels: Vec<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<AlertToken>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub token_id: String,
    pub alert_type: AlertType,
    pub threshold: f64,
    pub channels: Vec<String>,
}

// ---------------------------------------------------------------------------
// Wallets / portfolio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletHolding {
    pub id: String,
    pub token_mint: String,
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    pub amount: f64,
    #[serde(default)]
    pub price_usd: Option<f64>,
    #[serde(default)]
    pub value_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    pub address: String,
    pub chain: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub last_synced: Option<String>,
    pub sync_status: String,
    #[serde(default)]
    pub holdings: Vec<WalletHolding>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_wallets: u32,
    pub portfolio_value_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    #[serde(default)]
    pub wallets: Vec<Wallet>,
    #[serde(default)]
    pub summary: PortfolioSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWallet {
    pub address: String,
    pub chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Whale,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Whale => "whale",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub current_period_end: Option<String>,
}

/// Checkout/portal sessions hand back a URL to open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedirectSession {
    pub url: String,
}
