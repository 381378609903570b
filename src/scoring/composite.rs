use super::choice::ChoiceScore;
use super::preset::WeightPreset;
use crate::catalog::{find_definition, Category, IndicatorDefinition, IndicatorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a category weight applies when several present indicators share that category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryWeightPolicy {
    /// Each indicator carries the full category weight, so a category with
    /// more indicators has proportionally more influence.
    #[default]
    PerIndicator,
    /// The category weight is divided evenly over that category's present indicators.
    SplitAcrossCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    /// Renormalized weighted average of Choice scores, 0 to 100
    pub score: f64,
    /// Scores that matched a known definition
    pub used_indicator_count: usize,
    /// Size of the definition set
    pub total_indicator_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct WeightedAverage {
    pub value: f64,
    pub used: usize,
}

/// Category-weighted average over whichever indicators are present.
///
/// Items whose indicator has no definition are skipped. When no weight is
/// used (nothing present, or every present category weighs 0) the value is 0.
pub(crate) fn weighted_average(
    items: &[(IndicatorId, f64)],
    definitions: &[IndicatorDefinition],
    preset: &WeightPreset,
    policy: CategoryWeightPolicy,
) -> WeightedAverage {
    let matched: Vec<(Category, f64)> = items
        .iter()
        .filter_map(|(id, value)| find_definition(definitions, *id).map(|d| (d.category, *value)))
        .collect();

    let mut per_category: BTreeMap<Category, usize> = BTreeMap::new();
    for (category, _) in &matched {
        *per_category.entry(*category).or_default() += 1;
    }

    let mut weighted_sum = 0.0;
    let mut weight_used = 0.0;
    for (category, value) in &matched {
        let weight = match policy {
            CategoryWeightPolicy::PerIndicator => preset.weight(*category),
            CategoryWeightPolicy::SplitAcrossCategory => {
                preset.weight(*category) / per_category[category] as f64
            }
        };
        weighted_sum += weight * value;
        weight_used += weight;
    }

    WeightedAverage {
        value: if weight_used > 0.0 {
            weighted_sum / weight_used
        } else {
            0.0
        },
        used: matched.len(),
    }
}

/// Combine Choice scores into one composite using the default
/// [`CategoryWeightPolicy::PerIndicator`].
pub fn calculate_composite_score(
    scores: &[ChoiceScore],
    definitions: &[IndicatorDefinition],
    preset: &WeightPreset,
) -> CompositeScore {
    calculate_composite_score_with_policy(
        scores,
        definitions,
        preset,
        CategoryWeightPolicy::default(),
    )
}

pub fn calculate_composite_score_with_policy(
    scores: &[ChoiceScore],
    definitions: &[IndicatorDefinition],
    preset: &WeightPreset,
    policy: CategoryWeightPolicy,
) -> CompositeScore {
    let items: Vec<(IndicatorId, f64)> = scores.iter().map(|s| (s.indicator_id, s.score)).collect();
    let average = weighted_average(&items, definitions, preset, policy);

    CompositeScore {
        score: average.value,
        used_indicator_count: average.used,
        total_indicator_count: definitions.len(),
    }
}
