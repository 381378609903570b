pub mod baseline;
pub mod choice;
pub mod composite;
pub mod confidence;
pub mod config;
pub mod engine;
pub mod preset;
pub mod stars;
pub mod validation;

pub use baseline::{evaluate_baseline, BaselineScore, NationalBaselines, ReferenceDistribution};
pub use choice::{choice_scores, normalize_indicator, ChoiceScore};
pub use composite::{
    calculate_composite_score, calculate_composite_score_with_policy, CategoryWeightPolicy,
    CompositeScore,
};
pub use confidence::{
    evaluate_confidence, evaluate_confidence_at, ConfidenceInput, ConfidenceLevel,
    ConfidenceResult,
};
pub use config::{PresetConfig, ScoringConfig};
pub use engine::{AreaProfile, CityScoreResult, RankBy, ScoringEngine};
pub use preset::{PresetRegistry, WeightPreset};
pub use stars::{
    category_star_averages, indicator_stars, overall_star_rating, IndicatorStarRating,
    StarLadder,
};
pub use validation::validate_scoring;
