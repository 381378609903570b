use super::baseline::{evaluate_baseline, BaselineScore, NationalBaselines};
use super::choice::{choice_scores, ChoiceScore};
use super::composite::{calculate_composite_score_with_policy, CategoryWeightPolicy};
use super::confidence::{current_year, evaluate_confidence_at, ConfidenceInput, ConfidenceResult};
use super::preset::WeightPreset;
use super::stars::{
    category_star_averages, indicator_stars, overall_star_rating, IndicatorStarRating, StarLadder,
};
use crate::area::AreaIndicatorSet;
use crate::catalog::{find_definition, Category, IndicatorDefinition};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Ranking key for a candidate set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    /// Composite score, descending
    #[default]
    Composite,
    /// Overall star rating, descending, then composite; unrated areas last
    Stars,
}

/// Final per-area record for a candidate set.
///
/// `composite_score` is relative to the candidate set; `star_rating` is
/// relative to the national baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityScoreResult {
    pub city_name: String,
    pub area_code: String,
    pub composite_score: f64,
    pub used_indicator_count: usize,
    pub total_indicator_count: usize,
    /// 1-based position within the candidate set
    pub rank: usize,
    pub choice: Vec<ChoiceScore>,
    pub baseline: Vec<BaselineScore>,
    pub confidence: ConfidenceResult,
    pub notes: Vec<String>,
    pub star_rating: Option<u8>,
    pub indicator_stars: Vec<IndicatorStarRating>,
    pub category_stars: BTreeMap<Category, f64>,
}

/// Standalone profile of one area, anchored only to the national baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaProfile {
    pub city_name: String,
    pub area_code: String,
    pub baseline: Vec<BaselineScore>,
    pub star_rating: Option<u8>,
    pub indicator_stars: Vec<IndicatorStarRating>,
    pub category_stars: BTreeMap<Category, f64>,
    pub confidence: ConfidenceResult,
    pub notes: Vec<String>,
}

/// Everything about an area that does not depend on the candidate set.
struct NationalView {
    baseline: Vec<BaselineScore>,
    indicator_stars: Vec<IndicatorStarRating>,
    star_rating: Option<u8>,
    category_stars: BTreeMap<Category, f64>,
    confidence: ConfidenceResult,
    notes: Vec<String>,
}

/// Stateless scoring pipeline over an immutable catalog and national baseline.
///
/// Holds only borrowed configuration, so one engine can score any number of
/// independent candidate sets, including from several threads.
#[derive(Debug, Clone)]
pub struct ScoringEngine<'a> {
    definitions: &'a [IndicatorDefinition],
    baselines: &'a NationalBaselines,
    ladder: StarLadder,
    policy: CategoryWeightPolicy,
    rank_by: RankBy,
    current_year: i32,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(definitions: &'a [IndicatorDefinition], baselines: &'a NationalBaselines) -> Self {
        Self {
            definitions,
            baselines,
            ladder: StarLadder::default(),
            policy: CategoryWeightPolicy::default(),
            rank_by: RankBy::default(),
            current_year: current_year(),
        }
    }

    pub fn with_ladder(mut self, ladder: StarLadder) -> Self {
        self.ladder = ladder;
        self
    }

    pub fn with_policy(mut self, policy: CategoryWeightPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_rank_by(mut self, rank_by: RankBy) -> Self {
        self.rank_by = rank_by;
        self
    }

    /// Pin the year confidence ages are measured against.
    pub fn with_current_year(mut self, year: i32) -> Self {
        self.current_year = year;
        self
    }

    /// Score and rank a candidate set.
    ///
    /// Results come back in rank order. Equal keys keep their input order, so
    /// the same candidate set and preset always produce the same ranks.
    pub fn score_cities(
        &self,
        areas: &[AreaIndicatorSet],
        preset: &WeightPreset,
    ) -> Vec<CityScoreResult> {
        let choices = choice_scores(areas, self.definitions);

        let mut results: Vec<CityScoreResult> = areas
            .iter()
            .zip(choices)
            .map(|(area, choice)| {
                let composite = calculate_composite_score_with_policy(
                    &choice,
                    self.definitions,
                    preset,
                    self.policy,
                );
                let national = self.national_view(area, preset);

                debug!(
                    area = %area.code,
                    composite = composite.score,
                    used = composite.used_indicator_count,
                    stars = ?national.star_rating,
                    confidence = %national.confidence.level,
                    "scored area"
                );

                CityScoreResult {
                    city_name: area.name.clone(),
                    area_code: area.code.clone(),
                    composite_score: composite.score,
                    used_indicator_count: composite.used_indicator_count,
                    total_indicator_count: composite.total_indicator_count,
                    rank: 0,
                    choice,
                    baseline: national.baseline,
                    confidence: national.confidence,
                    notes: national.notes,
                    star_rating: national.star_rating,
                    indicator_stars: national.indicator_stars,
                    category_stars: national.category_stars,
                }
            })
            .collect();

        // sort_by is stable: ties keep input order
        let rank_by = self.rank_by;
        results.sort_by(|a, b| compare_for_rank(a, b, rank_by));
        for (idx, result) in results.iter_mut().enumerate() {
            result.rank = idx + 1;
        }

        results
    }

    /// Profile one area without a candidate set: baseline and stars only.
    pub fn score_single_city(&self, area: &AreaIndicatorSet, preset: &WeightPreset) -> AreaProfile {
        let national = self.national_view(area, preset);

        AreaProfile {
            city_name: area.name.clone(),
            area_code: area.code.clone(),
            baseline: national.baseline,
            star_rating: national.star_rating,
            indicator_stars: national.indicator_stars,
            category_stars: national.category_stars,
            confidence: national.confidence,
            notes: national.notes,
        }
    }

    fn national_view(&self, area: &AreaIndicatorSet, preset: &WeightPreset) -> NationalView {
        let baseline: Vec<BaselineScore> = self
            .definitions
            .iter()
            .filter_map(|def| {
                let value = area.value(def.id)?;
                evaluate_baseline(value, def, self.baselines)
            })
            .collect();

        let indicator_stars = indicator_stars(&baseline, &self.ladder);
        let star_rating =
            overall_star_rating(&indicator_stars, self.definitions, preset, self.policy);
        let category_stars = category_star_averages(&indicator_stars, self.definitions);

        NationalView {
            baseline,
            indicator_stars,
            star_rating,
            category_stars,
            confidence: self.confidence_for(area),
            notes: self.notes_for(area),
        }
    }

    fn confidence_for(&self, area: &AreaIndicatorSet) -> ConfidenceResult {
        let missing_rate = if self.definitions.is_empty() {
            0.0
        } else {
            let missing = self
                .definitions
                .iter()
                .filter(|def| area.value(def.id).is_none())
                .count();
            missing as f64 / self.definitions.len() as f64
        };

        let input = ConfidenceInput {
            data_year: area.effective_data_year(),
            sample_count: area.sample_count,
            missing_rate,
        };
        evaluate_confidence_at(&input, self.current_year)
    }

    /// Caveats explaining every indicator that was dropped or is weaker than the rest.
    fn notes_for(&self, area: &AreaIndicatorSet) -> Vec<String> {
        let mut notes = Vec::new();

        for observation in area.observations() {
            if find_definition(self.definitions, observation.indicator).is_none() {
                notes.push(format!(
                    "{} is not in the indicator set and was ignored",
                    observation.indicator
                ));
            }
        }

        let newest_year = self
            .definitions
            .iter()
            .filter_map(|def| area.observation(def.id))
            .filter(|o| o.value.is_finite())
            .filter_map(|o| o.year())
            .max();

        let mut missing = Vec::new();
        for def in self.definitions {
            let Some(observation) = area.observation(def.id) else {
                missing.push(def.label.as_str());
                continue;
            };
            if !observation.value.is_finite() {
                notes.push(format!(
                    "{}: reported value is not a number and was ignored",
                    def.label
                ));
                continue;
            }
            match (observation.year(), newest_year) {
                (Some(year), Some(newest)) if year < newest => notes.push(format!(
                    "{} uses {} data (newest is {})",
                    def.label, year, newest
                )),
                (None, _) => notes.push(format!(
                    "{}: data year '{}' is not recognised",
                    def.label, observation.data_year
                )),
                _ => {}
            }
            if self.baselines.get(def.id).is_none() {
                notes.push(format!(
                    "{}: no national reference, star rating skipped",
                    def.label
                ));
            }
        }

        if !missing.is_empty() {
            notes.push(format!("No data for: {}", missing.join(", ")));
        }

        notes
    }
}

fn compare_for_rank(a: &CityScoreResult, b: &CityScoreResult, rank_by: RankBy) -> Ordering {
    let by_composite = b.composite_score.total_cmp(&a.composite_score);
    match rank_by {
        RankBy::Composite => by_composite,
        // Option ordering puts None below Some, so unrated areas sort last
        RankBy::Stars => b.star_rating.cmp(&a.star_rating).then(by_composite),
    }
}
