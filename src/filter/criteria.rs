use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Filter criteria. `None` on any field means "no filtering on that dimension".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_volume_market_cap_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_volume_market_cap_ratio: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_circulating_supply_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_circulating_supply_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_volume_healthy: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_circulating_supply_good: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_liquidity_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pump_dump_risk_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_wallet_distribution_score: Option<f64>,
}

impl FilterCriteria {
    /// True when no dimension is active.
    pub fn is_empty(&self) -> bool {
        self.normalized() == FilterCriteria::default()
    }

    /// Drops empty category/exchange strings so they behave as absent.
    pub fn normalized(&self) -> FilterCriteria {
        let mut c = self.clone();
        c.category = c.category.filter(|s| !s.is_empty());
        c.exchange = c.exchange.filter(|s| !s.trim().is_empty());
        c
    }
}

/// String form of the criteria, as an input form holds it: every field is a
/// string and `""` means "any". Custom presets are persisted in this shape.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterForm {
    pub category: String,
    pub exchange: String,
    pub min_price: String,
    pub max_price: String,
    pub min_volume_market_cap_ratio: String,
    pub max_volume_market_cap_ratio: String,
    pub min_circulating_supply_percentage: String,
    pub max_circulating_supply_percentage: String,
    pub is_volume_healthy: String,
    pub is_circulating_supply_good: String,
    pub min_liquidity_score: String,
    pub max_pump_dump_risk_score: String,
    pub min_wallet_distribution_score: String,
}

impl TryFrom<&FilterForm> for FilterCriteria {
    type Error = AppError;

    fn try_from(form: &FilterForm) -> Result<Self> {
        Ok(FilterCriteria {
            category: parse_text(&form.category),
            exchange: parse_text(&form.exchange),
            min_price: parse_bound("minPrice", &form.min_price)?,
            max_price: parse_bound("maxPrice", &form.max_price)?,
            min_volume_market_cap_ratio: parse_bound(
                "minVolumeMarketCapRatio",
                &form.min_volume_market_cap_ratio,
            )?,
            max_volume_market_cap_ratio: parse_bound(
                "maxVolumeMarketCapRatio",
                &form.max_volume_market_cap_ratio,
            )?,
            min_circulating_supply_percentage: parse_bound(
                "minCirculatingSupplyPercentage",
                &form.min_circulating_supply_percentage,
            )?,
            max_circulating_supply_percentage: parse_bound(
                "maxCirculatingSupplyPercentage",
                &form.max_circulating_supply_percentage,
            )?,
            is_volume_healthy: parse_tri_state("isVolumeHealthy", &form.is_volume_healthy)?,
            is_circulating_supply_good: parse_tri_state(
                "isCirculatingSupplyGood",
                &form.is_circulating_supply_good,
            )?,
            min_liquidity_score: parse_bound("minLiquidityScore", &form.min_liquidity_score)?,
            max_pump_dump_risk_score: parse_bound(
                "maxPumpDumpRiskScore",
                &form.max_pump_dump_risk_score,
            )?,
            min_wallet_distribution_score: parse_bound(
                "minWalletDistributionScore",
                &form.min_wallet_distribution_score,
            )?,
        })
    }
}

impl From<&FilterCriteria> for FilterForm {
    fn from(c: &FilterCriteria) -> Self {
        let num = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();
        let tri = |v: Option<bool>| v.map(|b| b.to_string()).unwrap_or_default();
        FilterForm {
            category: c.category.clone().unwrap_or_default(),
            exchange: c.exchange.clone().unwrap_or_default(),
            min_price: num(c.min_price),
            max_price: num(c.max_price),
            min_volume_market_cap_ratio: num(c.min_volume_market_cap_ratio),
            max_volume_market_cap_ratio: num(c.max_volume_market_cap_ratio),
            min_circulating_supply_percentage: num(c.min_circulating_supply_percentage),
            max_circulating_supply_percentage: num(c.max_circulating_supply_percentage),
            is_volume_healthy: tri(c.is_volume_healthy),
            is_circulating_supply_good: tri(c.is_circulating_supply_good),
            min_liquidity_score: num(c.min_liquidity_score),
            max_pump_dump_risk_score: num(c.max_pump_dump_risk_score),
            min_wallet_distribution_score: num(c.min_wallet_distribution_score),
        }
    }
}

fn parse_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `""` → any, otherwise a finite number.
pub fn parse_bound(field: &str, raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(AppError::Validation(format!("{field} must be a number, got '{raw}'"))),
    }
}

/// `""` → any, `"true"`/`"false"` → exact match.
pub fn parse_tri_state(field: &str, raw: &str) -> Result<Option<bool>> {
    match raw.trim() {
        "" => Ok(None),
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        other => Err(AppError::Validation(format!(
            "{field} must be '', 'true' or 'false', got '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_form_is_empty_criteria() {
        let criteria = FilterCriteria::try_from(&FilterForm::default()).unwrap();
        assert!(criteria.is_empty());
    }

    #[test]
    fn form_values_parse_into_typed_criteria() {
        let form = FilterForm {
            category: "defi".to_string(),
            min_liquidity_score: "70".to_string(),
            is_volume_healthy: "false".to_string(),
            ..FilterForm::default()
        };
        let criteria = FilterCriteria::try_from(&form).unwrap();
        assert_eq!(criteria.category.as_deref(), Some("defi"));
        assert_eq!(criteria.min_liquidity_score, Some(70.0));
        assert_eq!(criteria.is_volume_healthy, Some(false));
        assert_eq!(FilterForm::from(&criteria), form);
    }

    #[test]
    fn bad_numbers_and_tri_states_are_rejected() {
        assert!(parse_bound("minPrice", "cheap").is_err());
        assert!(parse_bound("minPrice", "NaN").is_err());
        assert!(parse_tri_state("isVolumeHealthy", "yes").is_err());
    }

    #[test]
    fn empty_strings_normalize_away() {
        let criteria = FilterCriteria {
            category: Some(String::new()),
            exchange: Some("  ".to_string()),
            ..FilterCriteria::default()
        };
        assert!(criteria.is_empty());
    }
}
