use super::baseline::BaselineScore;
use super::composite::{weighted_average, CategoryWeightPolicy};
use super::preset::WeightPreset;
use crate::catalog::{find_definition, Category, IndicatorDefinition, IndicatorId};
use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quintile boundaries: 2 stars from the 20th percentile, 3 from the 40th,
/// 4 from the 60th, 5 from the 80th.
pub const DEFAULT_STAR_THRESHOLDS: [f64; 4] = [20.0, 40.0, 60.0, 80.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorStarRating {
    pub indicator_id: IndicatorId,
    /// 1 to 5
    pub stars: u8,
    pub national_percentile: f64,
}

/// Percentile to star ladder.
///
/// A percentile `p` earns one star plus one per threshold `t` with `p >= t`,
/// so a value sitting exactly on a boundary takes the higher rating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarLadder {
    thresholds: [f64; 4],
}

impl Default for StarLadder {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_STAR_THRESHOLDS,
        }
    }
}

impl StarLadder {
    pub fn new(thresholds: [f64; 4]) -> Result<Self, EngineError> {
        for t in thresholds {
            if !t.is_finite() || t <= 0.0 || t >= 100.0 {
                return Err(EngineError::InvalidStarLadder(format!(
                    "threshold {} must lie strictly between 0 and 100",
                    t
                )));
            }
        }
        if thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(EngineError::InvalidStarLadder(format!(
                "thresholds {:?} must be strictly ascending",
                thresholds
            )));
        }
        Ok(Self { thresholds })
    }

    pub fn from_slice(thresholds: &[f64]) -> Result<Self, EngineError> {
        let thresholds: [f64; 4] = thresholds.try_into().map_err(|_| {
            EngineError::InvalidStarLadder(format!(
                "expected 4 thresholds, got {}",
                thresholds.len()
            ))
        })?;
        Self::new(thresholds)
    }

    pub fn thresholds(&self) -> [f64; 4] {
        self.thresholds
    }

    pub fn stars_for(&self, percentile: f64) -> u8 {
        1 + self.thresholds.iter().filter(|t| percentile >= **t).count() as u8
    }
}

/// Per-indicator stars, one per baseline score.
pub fn indicator_stars(
    baseline: &[BaselineScore],
    ladder: &StarLadder,
) -> Vec<IndicatorStarRating> {
    baseline
        .iter()
        .map(|b| IndicatorStarRating {
            indicator_id: b.indicator_id,
            stars: ladder.stars_for(b.percentile),
            national_percentile: b.percentile,
        })
        .collect()
}

/// Overall area rating: the composite weighting rule applied to star values,
/// rounded half away from zero and clamped to 1..=5.
///
/// `None` when no indicator of the definition set has a star rating.
pub fn overall_star_rating(
    stars: &[IndicatorStarRating],
    definitions: &[IndicatorDefinition],
    preset: &WeightPreset,
    policy: CategoryWeightPolicy,
) -> Option<u8> {
    let items: Vec<(IndicatorId, f64)> = stars
        .iter()
        .map(|s| (s.indicator_id, f64::from(s.stars)))
        .collect();
    let average = weighted_average(&items, definitions, preset, policy);
    if average.used == 0 {
        return None;
    }
    Some(average.value.round().clamp(1.0, 5.0) as u8)
}

/// Unweighted mean of stars per category, for dashboard cards.
pub fn category_star_averages(
    stars: &[IndicatorStarRating],
    definitions: &[IndicatorDefinition],
) -> BTreeMap<Category, f64> {
    let mut sums: BTreeMap<Category, (u32, u32)> = BTreeMap::new();
    for rating in stars {
        if let Some(definition) = find_definition(definitions, rating.indicator_id) {
            let entry = sums.entry(definition.category).or_default();
            entry.0 += u32::from(rating.stars);
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(category, (sum, count))| (category, f64::from(sum) / f64::from(count)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn rating(id: IndicatorId, stars: u8) -> IndicatorStarRating {
        IndicatorStarRating {
            indicator_id: id,
            stars,
            national_percentile: 0.0,
        }
    }

    #[test]
    fn test_default_ladder_boundaries() {
        let ladder = StarLadder::default();
        let cases = [
            (0.0, 1),
            (19.999, 1),
            (20.0, 2),
            (39.999, 2),
            (40.0, 3),
            (59.999, 3),
            (60.0, 4),
            (79.999, 4),
            (80.0, 5),
            (100.0, 5),
        ];
        for (percentile, expected) in cases {
            assert_eq!(ladder.stars_for(percentile), expected, "percentile {}", percentile);
        }
    }

    #[test]
    fn test_ladder_is_monotonic() {
        let ladder = StarLadder::default();
        let mut previous = 1;
        for step in 0..=1000 {
            let stars = ladder.stars_for(step as f64 / 10.0);
            assert!(stars >= previous);
            assert!((1..=5).contains(&stars));
            previous = stars;
        }
    }

    #[test]
    fn test_ladder_validation() {
        assert!(StarLadder::new([10.0, 30.0, 70.0, 90.0]).is_ok());
        assert!(StarLadder::new([20.0, 20.0, 60.0, 80.0]).is_err());
        assert!(StarLadder::new([40.0, 20.0, 60.0, 80.0]).is_err());
        assert!(StarLadder::new([0.0, 20.0, 60.0, 80.0]).is_err());
        assert!(StarLadder::new([20.0, 40.0, 60.0, 100.0]).is_err());
        assert!(StarLadder::new([20.0, f64::NAN, 60.0, 80.0]).is_err());
        assert!(StarLadder::from_slice(&[20.0, 40.0]).is_err());
    }

    #[test]
    fn test_indicator_stars_from_baseline() {
        let baseline = vec![BaselineScore {
            indicator_id: IndicatorId::CrimeRate,
            percentile: 85.0,
            population_size: 10,
            baseline_name: "national".to_string(),
        }];
        let stars = indicator_stars(&baseline, &StarLadder::default());
        assert_eq!(stars.len(), 1);
        assert_eq!(stars[0].stars, 5);
        assert_eq!(stars[0].national_percentile, 85.0);
    }

    #[test]
    fn test_overall_rating_weighted_and_rounded() {
        let catalog = Catalog::standard();
        let preset = WeightPreset::new(
            "p",
            "P",
            [(Category::Childcare, 0.75), (Category::Safety, 0.25)],
        )
        .unwrap();
        let stars = vec![rating(IndicatorId::KidsRatio, 4), rating(IndicatorId::CrimeRate, 1)];

        // (0.75*4 + 0.25*1) / 1.0 = 3.25
        let overall = overall_star_rating(
            &stars,
            catalog.definitions(),
            &preset,
            CategoryWeightPolicy::PerIndicator,
        );
        assert_eq!(overall, Some(3));
    }

    #[test]
    fn test_overall_rating_rounds_half_up() {
        let catalog = Catalog::standard();
        let preset = WeightPreset::new(
            "p",
            "P",
            [(Category::Childcare, 1.0), (Category::Safety, 1.0)],
        )
        .unwrap();
        let stars = vec![rating(IndicatorId::KidsRatio, 4), rating(IndicatorId::CrimeRate, 3)];

        let overall = overall_star_rating(
            &stars,
            catalog.definitions(),
            &preset,
            CategoryWeightPolicy::PerIndicator,
        );
        assert_eq!(overall, Some(4));
    }

    #[test]
    fn test_overall_rating_follows_category_policy() {
        let catalog = Catalog::standard();
        let preset = WeightPreset::new(
            "even",
            "Even",
            [(Category::Childcare, 1.0), (Category::Safety, 1.0)],
        )
        .unwrap();
        let stars = vec![
            rating(IndicatorId::KidsRatio, 5),
            rating(IndicatorId::NurseryCapacity, 5),
            rating(IndicatorId::CrimeRate, 1),
        ];

        // (5 + 5 + 1) / 3 = 3.67
        let per_indicator = overall_star_rating(
            &stars,
            catalog.definitions(),
            &preset,
            CategoryWeightPolicy::PerIndicator,
        );
        // (0.5*5 + 0.5*5 + 1*1) / 2 = 3.0
        let split = overall_star_rating(
            &stars,
            catalog.definitions(),
            &preset,
            CategoryWeightPolicy::SplitAcrossCategory,
        );

        assert_eq!(per_indicator, Some(4));
        assert_eq!(split, Some(3));
    }

    #[test]
    fn test_overall_rating_clamped_for_zero_weights() {
        let catalog = Catalog::standard();
        let preset = WeightPreset::new("zero", "Zero", Category::ALL.map(|c| (c, 0.0))).unwrap();
        let stars = vec![rating(IndicatorId::KidsRatio, 5)];

        let overall = overall_star_rating(
            &stars,
            catalog.definitions(),
            &preset,
            CategoryWeightPolicy::PerIndicator,
        );
        assert_eq!(overall, Some(1));
    }

    #[test]
    fn test_overall_rating_absent_without_stars() {
        let catalog = Catalog::standard();
        let registry = crate::scoring::PresetRegistry::builtin();
        let preset = registry.get("childcare").unwrap();
        assert_eq!(
            overall_star_rating(
                &[],
                catalog.definitions(),
                preset,
                CategoryWeightPolicy::PerIndicator
            ),
            None
        );
    }

    #[test]
    fn test_category_averages_are_unweighted() {
        let catalog = Catalog::standard();
        let stars = vec![
            rating(IndicatorId::KidsRatio, 5),
            rating(IndicatorId::NurseryCapacity, 2),
            rating(IndicatorId::CrimeRate, 3),
        ];

        let averages = category_star_averages(&stars, catalog.definitions());

        assert_eq!(averages.len(), 2);
        assert_eq!(averages[&Category::Childcare], 3.5);
        assert_eq!(averages[&Category::Safety], 3.0);
    }
}
