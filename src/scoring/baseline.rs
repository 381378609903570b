//! National percentile scoring, independent of the candidate set.

use crate::catalog::{Direction, IndicatorDefinition, IndicatorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineScore {
    pub indicator_id: IndicatorId,
    /// 0 to 100; higher is better regardless of indicator direction
    pub percentile: f64,
    /// Number of reference values the percentile was computed against
    pub population_size: usize,
    pub baseline_name: String,
}

/// Nationwide values of one indicator for its most recent comparable year.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReferenceDistribution {
    year: Option<String>,
    sorted: Vec<f64>,
}

impl ReferenceDistribution {
    /// Non-finite values are dropped.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        Self { year: None, sorted }
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Mid-rank percentile of `value`: values that are worse count fully,
    /// ties count half. `None` for an empty distribution or non-finite value.
    pub fn percentile_of(&self, value: f64, direction: Direction) -> Option<f64> {
        if self.sorted.is_empty() || !value.is_finite() {
            return None;
        }

        let n = self.sorted.len();
        let below = self.sorted.partition_point(|v| *v < value);
        let below_or_equal = self.sorted.partition_point(|v| *v <= value);
        let equal = below_or_equal - below;
        let worse = match direction {
            Direction::HigherBetter => below,
            Direction::LowerBetter => n - below_or_equal,
        };

        let percentile = (worse as f64 + 0.5 * equal as f64) * 100.0 / n as f64;
        Some(percentile.clamp(0.0, 100.0))
    }
}

/// Reference distributions per indicator, e.g. every municipality in the country.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NationalBaselines {
    name: String,
    distributions: BTreeMap<IndicatorId, ReferenceDistribution>,
}

impl NationalBaselines {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            distributions: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn insert(&mut self, id: IndicatorId, distribution: ReferenceDistribution) {
        self.distributions.insert(id, distribution);
    }

    /// The distribution for an indicator, if there is a non-empty one.
    pub fn get(&self, id: IndicatorId) -> Option<&ReferenceDistribution> {
        self.distributions.get(&id).filter(|d| !d.is_empty())
    }

    /// Indicators with a non-empty reference distribution, in catalog order.
    pub fn indicators(&self) -> impl Iterator<Item = IndicatorId> + '_ {
        self.distributions
            .iter()
            .filter(|(_, d)| !d.is_empty())
            .map(|(id, _)| *id)
    }

    fn label_for(&self, distribution: &ReferenceDistribution) -> String {
        match distribution.year() {
            Some(year) => format!("{} {}", self.name, year),
            None => self.name.clone(),
        }
    }
}

/// Percentile of one raw value against the national reference.
///
/// Returns `None` when there is no usable reference for the indicator; a
/// baseline score is never made up.
pub fn evaluate_baseline(
    value: f64,
    definition: &IndicatorDefinition,
    baselines: &NationalBaselines,
) -> Option<BaselineScore> {
    let distribution = baselines.get(definition.id)?;
    let percentile = distribution.percentile_of(value, definition.direction)?;

    Some(BaselineScore {
        indicator_id: definition.id,
        percentile,
        population_size: distribution.len(),
        baseline_name: baselines.label_for(distribution),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to_ten() -> ReferenceDistribution {
        ReferenceDistribution::new((1..=10).map(|v| v as f64))
    }

    #[test]
    fn test_percentile_higher_better() {
        let dist = one_to_ten();
        // 4 values below, 1 tie: (4 + 0.5) / 10
        assert_eq!(dist.percentile_of(5.0, Direction::HigherBetter), Some(45.0));
        assert_eq!(dist.percentile_of(100.0, Direction::HigherBetter), Some(100.0));
        assert_eq!(dist.percentile_of(0.0, Direction::HigherBetter), Some(0.0));
    }

    #[test]
    fn test_percentile_lower_better() {
        let dist = one_to_ten();
        // 5 values above, 1 tie: (5 + 0.5) / 10
        assert_eq!(dist.percentile_of(5.0, Direction::LowerBetter), Some(55.0));
        assert_eq!(dist.percentile_of(0.0, Direction::LowerBetter), Some(100.0));
    }

    #[test]
    fn test_percentile_between_values() {
        let dist = one_to_ten();
        assert_eq!(dist.percentile_of(5.5, Direction::HigherBetter), Some(50.0));
        assert_eq!(dist.percentile_of(5.5, Direction::LowerBetter), Some(50.0));
    }

    #[test]
    fn test_non_finite_reference_values_dropped() {
        let dist = ReferenceDistribution::new(vec![1.0, f64::NAN, 3.0, f64::INFINITY]);
        assert_eq!(dist.len(), 2);
    }

    #[test]
    fn test_empty_distribution_has_no_percentile() {
        let dist = ReferenceDistribution::new(Vec::new());
        assert_eq!(dist.percentile_of(1.0, Direction::HigherBetter), None);
    }

    #[test]
    fn test_evaluate_baseline() {
        let mut baselines = NationalBaselines::new("national");
        baselines.insert(IndicatorId::CrimeRate, one_to_ten().with_year("2022"));

        let def = IndicatorId::CrimeRate.definition();
        let score = evaluate_baseline(2.0, &def, &baselines).unwrap();

        assert_eq!(score.indicator_id, IndicatorId::CrimeRate);
        assert_eq!(score.percentile, 85.0);
        assert_eq!(score.population_size, 10);
        assert_eq!(score.baseline_name, "national 2022");
    }

    #[test]
    fn test_missing_reference_skips_baseline() {
        let mut baselines = NationalBaselines::new("national");
        baselines.insert(IndicatorId::PriceMedian, ReferenceDistribution::new(Vec::new()));

        let def = IndicatorId::KidsRatio.definition();
        assert!(evaluate_baseline(12.0, &def, &baselines).is_none());

        let def = IndicatorId::PriceMedian.definition();
        assert!(evaluate_baseline(12.0, &def, &baselines).is_none());
    }
}
