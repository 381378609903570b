use super::config::PresetConfig;
use crate::catalog::Category;
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named set of per-category weights.
///
/// Only constructible through [`WeightPreset::new`] (or deserialization, which
/// goes through the same checks), so every preset the engine sees has finite,
/// non-negative weights. Categories without an entry weigh 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PresetConfig")]
pub struct WeightPreset {
    name: String,
    label: String,
    weights: BTreeMap<Category, f64>,
}

impl WeightPreset {
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        weights: impl IntoIterator<Item = (Category, f64)>,
    ) -> Result<Self, EngineError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EngineError::MalformedPreset {
                name,
                reason: "name must not be empty".to_string(),
            });
        }

        let weights: BTreeMap<Category, f64> = weights.into_iter().collect();
        for (category, weight) in &weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(EngineError::MalformedPreset {
                    name,
                    reason: format!(
                        "weight for '{}' must be a non-negative number, got {}",
                        category, weight
                    ),
                });
            }
        }

        Ok(Self {
            name,
            label: label.into(),
            weights,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn weights(&self) -> &BTreeMap<Category, f64> {
        &self.weights
    }

    pub fn weight(&self, category: Category) -> f64 {
        self.weights.get(&category).copied().unwrap_or(0.0)
    }
}

impl TryFrom<PresetConfig> for WeightPreset {
    type Error = EngineError;

    fn try_from(config: PresetConfig) -> Result<Self, Self::Error> {
        let label = config.label.unwrap_or_else(|| config.name.clone());
        WeightPreset::new(config.name, label, config.weights)
    }
}

/// Closed set of presets callers choose from by name.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetRegistry {
    presets: Vec<WeightPreset>,
}

impl PresetRegistry {
    pub fn builtin() -> Self {
        use Category::*;

        let preset = |name: &str, label: &str, weights: &[(Category, f64)]| WeightPreset {
            name: name.to_string(),
            label: label.to_string(),
            weights: weights.iter().copied().collect(),
        };

        Self {
            presets: vec![
                preset(
                    "childcare",
                    "Childcare-focused",
                    &[
                        (Childcare, 0.5),
                        (Price, 0.15),
                        (Safety, 0.1),
                        (Disaster, 0.05),
                        (Transport, 0.05),
                        (Education, 0.1),
                        (Healthcare, 0.05),
                    ],
                ),
                preset(
                    "price",
                    "Price-focused",
                    &[
                        (Childcare, 0.1),
                        (Price, 0.5),
                        (Safety, 0.1),
                        (Disaster, 0.05),
                        (Transport, 0.15),
                        (Education, 0.05),
                        (Healthcare, 0.05),
                    ],
                ),
                preset(
                    "safety",
                    "Safety-focused",
                    &[
                        (Childcare, 0.1),
                        (Price, 0.1),
                        (Safety, 0.4),
                        (Disaster, 0.3),
                        (Transport, 0.05),
                        (Education, 0.025),
                        (Healthcare, 0.025),
                    ],
                ),
                preset(
                    "balanced",
                    "Balanced",
                    &Category::ALL.map(|c| (c, 1.0)),
                ),
            ],
        }
    }

    /// Look up a preset by name. Unknown names fail; there is no fallback preset.
    pub fn get(&self, name: &str) -> Result<&WeightPreset, EngineError> {
        self.presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| EngineError::UnknownPreset {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Add a preset, replacing any existing preset with the same name.
    pub fn insert(&mut self, preset: WeightPreset) {
        match self.presets.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.presets.push(preset),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightPreset> {
        self.presets.iter()
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_presets_are_well_formed() {
        let registry = PresetRegistry::builtin();
        assert_eq!(registry.names(), vec!["childcare", "price", "safety", "balanced"]);
        for preset in registry.iter() {
            let rebuilt = WeightPreset::new(
                preset.name(),
                preset.label(),
                preset.weights().iter().map(|(c, w)| (*c, *w)),
            );
            assert_eq!(rebuilt.as_ref(), Ok(preset));
        }
    }

    #[test]
    fn test_childcare_preset_weights() {
        let registry = PresetRegistry::builtin();
        let preset = registry.get("childcare").unwrap();
        assert_eq!(preset.weight(Category::Childcare), 0.5);
        assert_eq!(preset.weight(Category::Price), 0.15);
    }

    #[test]
    fn test_unknown_preset_fails_closed() {
        let registry = PresetRegistry::builtin();
        let err = registry.get("commuter").unwrap_err();
        match err {
            EngineError::UnknownPreset { name, available } => {
                assert_eq!(name, "commuter");
                assert!(available.contains("childcare"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_category_weighs_zero() {
        let preset = WeightPreset::new("p", "P", [(Category::Price, 1.0)]).unwrap();
        assert_eq!(preset.weight(Category::Safety), 0.0);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = WeightPreset::new("p", "P", [(Category::Price, -0.1)]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedPreset { .. }));
    }

    #[test]
    fn test_nan_weight_rejected() {
        assert!(WeightPreset::new("p", "P", [(Category::Price, f64::NAN)]).is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(WeightPreset::new("  ", "P", [(Category::Price, 1.0)]).is_err());
    }

    #[test]
    fn test_insert_replaces_by_name() {
        let mut registry = PresetRegistry::builtin();
        let custom = WeightPreset::new("price", "Cheap only", [(Category::Price, 1.0)]).unwrap();
        registry.insert(custom.clone());
        assert_eq!(registry.names().len(), 4);
        assert_eq!(registry.get("price").unwrap(), &custom);

        let commuter =
            WeightPreset::new("commuter", "Commuter", [(Category::Transport, 1.0)]).unwrap();
        registry.insert(commuter);
        assert_eq!(registry.names().len(), 5);
    }

    #[test]
    fn test_deserialize_validates_weights() {
        let yaml = r#"
name: commuter
weights:
  transport: 0.7
  price: 0.3
"#;
        let preset: WeightPreset = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(preset.label(), "commuter");
        assert_eq!(preset.weight(Category::Transport), 0.7);

        let bad = r#"
name: broken
weights:
  transport: -1
"#;
        assert!(serde_saphyr::from_str::<WeightPreset>(bad).is_err());
    }
}
