use crate::area::parse_data_year;
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInput {
    /// Year label of the data behind the score; unparsable means maximally stale
    pub data_year: String,
    /// `None` when the sample size cannot be verified
    pub sample_count: Option<u64>,
    /// Share of indicators without a usable value, 0.0 to 1.0
    pub missing_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceResult {
    pub level: ConfidenceLevel,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgeBand {
    /// 2 years old or newer
    Fresh,
    /// 3 to 4 years old
    Aging,
    /// 5 years or older, or unknown
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Missingness {
    /// below 10%
    Clean,
    /// 10% to 30% inclusive
    Partial,
    /// above 30%, or not a number
    Poor,
}

fn age_band(age_years: Option<i32>) -> AgeBand {
    match age_years {
        Some(age) if age <= 2 => AgeBand::Fresh,
        Some(age) if age <= 4 => AgeBand::Aging,
        _ => AgeBand::Stale,
    }
}

fn missingness(rate: f64) -> Missingness {
    if rate < 0.1 {
        Missingness::Clean
    } else if rate <= 0.3 {
        Missingness::Partial
    } else {
        // NaN lands here too
        Missingness::Poor
    }
}

pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Classify data quality against the wall-clock year.
pub fn evaluate_confidence(input: &ConfidenceInput) -> ConfidenceResult {
    evaluate_confidence_at(input, current_year())
}

/// Classify data quality as of `current_year`.
///
/// Poor missingness or stale data always gives `Low`. `High` needs fresh,
/// clean data with a known sample size. Everything else is `Medium`.
pub fn evaluate_confidence_at(input: &ConfidenceInput, current_year: i32) -> ConfidenceResult {
    let age = parse_data_year(&input.data_year).map(|year| current_year - year);
    let band = age_band(age);
    let missing = missingness(input.missing_rate);
    let missing_pct = format_rate(input.missing_rate);
    let year = &input.data_year;

    let (level, reason) = match (missing, band, input.sample_count) {
        (Missingness::Poor, _, _) => (
            ConfidenceLevel::Low,
            format!("{} of indicators missing (data year {})", missing_pct, year),
        ),
        (_, AgeBand::Stale, _) => (
            ConfidenceLevel::Low,
            match age {
                Some(age) => format!("data year {} is {} years old", year, age),
                None => format!("data year '{}' could not be determined", year),
            },
        ),
        (Missingness::Clean, AgeBand::Fresh, Some(samples)) => (
            ConfidenceLevel::High,
            format!(
                "recent data (data year {}), {} missing, sample size {}",
                year, missing_pct, samples
            ),
        ),
        (Missingness::Clean, AgeBand::Fresh, None) => (
            ConfidenceLevel::Medium,
            format!(
                "sample size unknown (data year {}, {} missing)",
                year, missing_pct
            ),
        ),
        (Missingness::Partial, _, _) => (
            ConfidenceLevel::Medium,
            format!("{} of indicators missing (data year {})", missing_pct, year),
        ),
        (Missingness::Clean, AgeBand::Aging, _) => (
            ConfidenceLevel::Medium,
            format!(
                "data year {} is {} years old",
                year,
                age.unwrap_or_default()
            ),
        ),
    };

    ConfidenceResult { level, reason }
}

fn format_rate(rate: f64) -> String {
    if rate.is_finite() {
        format!("{:.0}%", rate * 100.0)
    } else {
        "an unknown share".to_string()
    }
}
