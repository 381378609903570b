//! Candidate-relative scoring.
//!
//! A Choice score only says how an area compares with the other areas in the
//! same candidate set. It must be recomputed whenever the set changes.

use crate::area::AreaIndicatorSet;
use crate::catalog::{Direction, IndicatorDefinition, IndicatorId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceScore {
    pub indicator_id: IndicatorId,
    /// 0 to 100 within the current candidate set
    pub score: f64,
}

/// Min-max scale one indicator's values across the candidate set.
///
/// `None` (or a non-finite value) stays `None`. When every present value is
/// equal, including the single-candidate case, every present area gets 100.
pub fn normalize_indicator(values: &[Option<f64>], direction: Direction) -> Vec<Option<f64>> {
    let present = || values.iter().flatten().copied().filter(|v| v.is_finite());
    let min = present().fold(f64::INFINITY, f64::min);
    let max = present().fold(f64::NEG_INFINITY, f64::max);
    // Spans wider than f64::MAX are measured on halved values
    let half = if (max - min).is_finite() { 1.0 } else { 0.5 };
    let range = max * half - min * half;

    values
        .iter()
        .map(|value| {
            let value = value.filter(|v| v.is_finite())?;
            if range <= 0.0 {
                return Some(100.0);
            }
            let scaled = match direction {
                Direction::HigherBetter => (value * half - min * half) / range,
                Direction::LowerBetter => (max * half - value * half) / range,
            };
            Some((scaled * 100.0).clamp(0.0, 100.0))
        })
        .collect()
}

/// Choice scores for every area, in area order. Indicators an area lacks are
/// left out of its sequence rather than scored as 0.
pub fn choice_scores(
    areas: &[AreaIndicatorSet],
    definitions: &[IndicatorDefinition],
) -> Vec<Vec<ChoiceScore>> {
    let mut per_area = vec![Vec::new(); areas.len()];

    for definition in definitions {
        let values: Vec<Option<f64>> = areas.iter().map(|a| a.value(definition.id)).collect();
        let normalized = normalize_indicator(&values, definition.direction);

        for (scores, score) in per_area.iter_mut().zip(normalized) {
            if let Some(score) = score {
                scores.push(ChoiceScore {
                    indicator_id: definition.id,
                    score,
                });
            }
        }
    }

    per_area
}
