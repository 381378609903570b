use super::composite::CategoryWeightPolicy;
use super::engine::RankBy;
use super::preset::{PresetRegistry, WeightPreset};
use super::stars::{StarLadder, DEFAULT_STAR_THRESHOLDS};
use crate::catalog::Category;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main scoring configuration.
///
/// Every field is optional; unset fields fall back to the built-in behaviour.
///
/// Example YAML:
/// ```yaml
/// default_preset: commuter
/// rank_by: composite
/// category_weights: split_across_category
/// star_thresholds: [20, 40, 60, 80]
/// presets:
///   - name: commuter
///     label: Commuter-focused
///     weights:
///       transport: 0.5
///       price: 0.3
///       safety: 0.2
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Preset used when the command line does not name one (default: "childcare")
    #[serde(default)]
    pub default_preset: Option<String>,

    /// Ranking key: "composite" or "stars"
    #[serde(default)]
    pub rank_by: Option<RankBy>,

    /// How a category weight is shared by several indicators of that category
    #[serde(default)]
    pub category_weights: Option<CategoryWeightPolicy>,

    /// Four ascending national percentiles where 2, 3, 4 and 5 stars begin
    #[serde(default)]
    pub star_thresholds: Option<Vec<f64>>,

    /// Extra presets. A preset with a built-in name replaces the built-in one.
    #[serde(default)]
    pub presets: Option<Vec<PresetConfig>>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_preset: Some("childcare".to_string()),
            rank_by: Some(RankBy::Composite),
            category_weights: Some(CategoryWeightPolicy::PerIndicator),
            star_thresholds: Some(DEFAULT_STAR_THRESHOLDS.to_vec()),
            presets: None,
        }
    }
}

impl ScoringConfig {
    pub fn default_preset_name(&self) -> &str {
        self.default_preset.as_deref().unwrap_or("childcare")
    }

    pub fn rank_by(&self) -> RankBy {
        self.rank_by.unwrap_or_default()
    }

    pub fn category_weight_policy(&self) -> CategoryWeightPolicy {
        self.category_weights.unwrap_or_default()
    }

    pub fn star_ladder(&self) -> Result<StarLadder, EngineError> {
        match self.star_thresholds {
            Some(ref thresholds) => StarLadder::from_slice(thresholds),
            None => Ok(StarLadder::default()),
        }
    }

    /// Built-in presets plus the configured ones.
    pub fn preset_registry(&self) -> Result<PresetRegistry, EngineError> {
        let mut registry = PresetRegistry::builtin();
        for preset in self.presets.iter().flatten() {
            registry.insert(WeightPreset::try_from(preset.clone())?);
        }
        Ok(registry)
    }
}

/// Preset as written in the config file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PresetConfig {
    pub name: String,

    /// Display label (defaults to the name)
    #[serde(default)]
    pub label: Option<String>,

    /// Weight per category; omitted categories weigh 0
    pub weights: BTreeMap<Category, f64>,
}
