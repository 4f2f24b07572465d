use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::storage_keys;
use crate::db::KvStore;
use crate::error::{AppError, Result};
use crate::filter::criteria::{FilterCriteria, FilterForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetSource {
    Builtin,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterPreset {
    pub name: String,
    pub description: String,
    pub filters: FilterCriteria,
    pub source: PresetSource,
}

/// Persisted shape of a custom preset: criteria kept in string form.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPreset {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    filters: FilterForm,
}

const CUSTOM_DESCRIPTION: &str = "Custom filter preset";

/// The fixed catalog. Never modified at runtime.
pub fn builtin_presets() -> Vec<FilterPreset> {
    let builtin = |name: &str, description: &str, filters: FilterCriteria| FilterPreset {
        name: name.to_string(),
        description: description.to_string(),
        filters,
        source: PresetSource::Builtin,
    };

    vec![
        builtin(
            "Safe Investments",
            "Low risk tokens with good fundamentals",
            FilterCriteria {
                is_volume_healthy: Some(true),
                min_liquidity_score: Some(70.0),
                max_pump_dump_risk_score: Some(30.0),
                min_wallet_distribution_score: Some(70.0),
                min_volume_market_cap_ratio: Some(0.1),
                max_volume_market_cap_ratio: Some(1.0),
                ..FilterCriteria::default()
            },
        ),
        builtin(
            "High Risk/Reward",
            "Volatile tokens with potential",
            FilterCriteria {
                min_volume_market_cap_ratio: Some(1.0),
                min_liquidity_score: Some(30.0),
                max_pump_dump_risk_score: Some(70.0),
                ..FilterCriteria::default()
            },
        ),
        builtin(
            "Volume Anomalies",
            "Tokens with unusual trading volume",
            FilterCriteria {
                min_volume_market_cap_ratio: Some(1.5),
                ..FilterCriteria::default()
            },
        ),
        builtin(
            "Healthy DeFi",
            "DeFi tokens with good metrics",
            FilterCriteria {
                category: Some("defi".to_string()),
                is_volume_healthy: Some(true),
                min_liquidity_score: Some(50.0),
                min_wallet_distribution_score: Some(50.0),
                ..FilterCriteria::default()
            },
        ),
    ]
}

/// Built-in presets plus user-defined ones persisted in the kv store.
pub struct PresetCatalog {
    kv: KvStore,
    custom: Mutex<Vec<FilterPreset>>,
}

impl PresetCatalog {
    pub async fn load(kv: KvStore) -> Result<Self> {
        let stored: Vec<StoredPreset> = kv
            .get_json(storage_keys::FILTER_PRESETS)
            .await?
            .unwrap_or_default();

        let mut custom = Vec::with_capacity(stored.len());
        for preset in stored {
            match FilterCriteria::try_from(&preset.filters) {
                Ok(filters) => custom.push(FilterPreset {
                    name: preset.name,
                    description: preset.description,
                    filters,
                    source: PresetSource::Custom,
                }),
                Err(e) => warn!(preset = %preset.name, "Skipping unreadable custom preset: {e}"),
            }
        }

        info!("Loaded {} custom filter presets", custom.len());
        Ok(Self { kv, custom: Mutex::new(custom) })
    }

    /// Built-ins first, then custom presets in save order.
    pub async fn all(&self) -> Vec<FilterPreset> {
        let mut presets = builtin_presets();
        presets.extend(self.custom.lock().await.iter().cloned());
        presets
    }

    pub async fn find(&self, name: &str) -> Option<FilterPreset> {
        if let Some(p) = builtin_presets().into_iter().find(|p| p.name == name) {
            return Some(p);
        }
        self.custom.lock().await.iter().find(|p| p.name == name).cloned()
    }

    /// Save the criteria under `name`. An existing custom preset with the same name is
    /// replaced; built-in names are reserved.
    pub async fn save(
        &self,
        name: &str,
        description: Option<&str>,
        filters: FilterCriteria,
    ) -> Result<FilterPreset> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("preset name must not be empty".to_string()));
        }
        if builtin_presets().iter().any(|p| p.name == name) {
            return Err(AppError::Validation(format!(
                "'{name}' is a built-in preset and cannot be overwritten"
            )));
        }

        let preset = FilterPreset {
            name: name.to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or(CUSTOM_DESCRIPTION)
                .to_string(),
            filters: filters.normalized(),
            source: PresetSource::Custom,
        };

        let mut custom = self.custom.lock().await;
        let mut next = custom.clone();
        match next.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset.clone(),
            None => next.push(preset.clone()),
        }
        self.persist(&next).await?;
        *custom = next;

        info!(preset = %preset.name, "Saved custom filter preset");
        Ok(preset)
    }

    /// Remove a custom preset. Built-ins cannot be deleted.
    pub async fn delete(&self, name: &str) -> Result<()> {
        if builtin_presets().iter().any(|p| p.name == name) {
            return Err(AppError::Validation(format!(
                "'{name}' is a built-in preset and cannot be deleted"
            )));
        }

        let mut custom = self.custom.lock().await;
        if !custom.iter().any(|p| p.name == name) {
            return Err(AppError::NotFound(format!("preset '{name}'")));
        }
        let next: Vec<FilterPreset> = custom.iter().filter(|p| p.name != name).cloned().collect();
        self.persist(&next).await?;
        *custom = next;

        info!(preset = %name, "Deleted custom filter preset");
        Ok(())
    }

    async fn persist(&self, presets: &[FilterPreset]) -> Result<()> {
        let stored: Vec<StoredPreset> = presets
            .iter()
            .map(|p| StoredPreset {
                name: p.name.clone(),
                description: p.description.clone(),
                filters: FilterForm::from(&p.filters),
            })
            .collect();
        self.kv.put_json(storage_keys::FILTER_PRESETS, &stored).await
    }
}
