use super::config::ScoringConfig;
use super::preset::{PresetRegistry, WeightPreset};
use super::stars::StarLadder;
use std::collections::HashSet;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    // Validate star thresholds
    if let Some(ref thresholds) = config.star_thresholds {
        if let Err(e) = StarLadder::from_slice(thresholds) {
            errors.push(format!("star_thresholds: {}", e));
        }
    }

    // Validate configured presets
    let mut seen = HashSet::new();
    if let Some(ref presets) = config.presets {
        for (i, preset) in presets.iter().enumerate() {
            if !seen.insert(preset.name.as_str()) {
                errors.push(format!(
                    "presets[{}].name: '{}' is defined more than once",
                    i, preset.name
                ));
            }
            if preset.weights.is_empty() {
                errors.push(format!("presets[{}].weights: must name at least one category", i));
            }
            if let Err(e) = WeightPreset::try_from(preset.clone()) {
                errors.push(format!("presets[{}]: {}", i, e));
            }
        }
    }

    // The default preset must resolve against builtins plus configured presets
    if let Some(ref name) = config.default_preset {
        let known = PresetRegistry::builtin().get(name).is_ok() || seen.contains(name.as_str());
        if !known {
            errors.push(format!("default_preset: unknown preset '{}'", name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::scoring::PresetConfig;
    use std::collections::BTreeMap;

    fn preset_config(name: &str, weights: &[(Category, f64)]) -> PresetConfig {
        PresetConfig {
            name: name.to_string(),
            label: None,
            weights: weights.iter().copied().collect::<BTreeMap<_, _>>(),
        }
    }

    fn empty_config() -> ScoringConfig {
        ScoringConfig {
            default_preset: None,
            rank_by: None,
            category_weights: None,
            star_thresholds: None,
            presets: None,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_scoring(&ScoringConfig::default()).is_ok());
    }

    #[test]
    fn test_empty_config() {
        assert!(validate_scoring(&empty_config()).is_ok());
    }

    #[test]
    fn test_custom_default_preset_is_valid() {
        let config = ScoringConfig {
            default_preset: Some("commuter".to_string()),
            presets: Some(vec![preset_config("commuter", &[(Category::Transport, 1.0)])]),
            ..empty_config()
        };
        assert!(validate_scoring(&config).is_ok());
    }

    #[test]
    fn test_unknown_default_preset() {
        let config = ScoringConfig {
            default_preset: Some("commuter".to_string()),
            ..empty_config()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("default_preset"));
    }

    #[test]
    fn test_invalid_star_thresholds() {
        let config = ScoringConfig {
            star_thresholds: Some(vec![20.0, 10.0, 60.0, 80.0]),
            ..empty_config()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("star_thresholds"));
    }

    #[test]
    fn test_negative_preset_weight() {
        let config = ScoringConfig {
            presets: Some(vec![preset_config("bad", &[(Category::Price, -1.0)])]),
            ..empty_config()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert!(errors[0].contains("presets[0]"));
    }

    #[test]
    fn test_collects_all_errors() {
        let config = ScoringConfig {
            default_preset: Some("nope".to_string()), // Error 4
            star_thresholds: Some(vec![20.0]),        // Error 1
            presets: Some(vec![
                preset_config("dup", &[(Category::Price, 1.0)]),
                preset_config("dup", &[]), // Errors 2 and 3
            ]),
            ..empty_config()
        };
        let errors = validate_scoring(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
