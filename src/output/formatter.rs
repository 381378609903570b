use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::area::AreaIndicatorSet;
use crate::catalog::{Catalog, Direction};
use crate::scoring::{AreaProfile, CityScoreResult, ConfidenceLevel, PresetRegistry};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a composite score with one decimal.
/// If incomplete is true, appends asterisk to indicate some indicators were missing
pub fn format_score(score: f64, incomplete: bool) -> String {
    let formatted = format!("{:.1}", score);
    if incomplete {
        format!("{}*", formatted)
    } else {
        formatted
    }
}

/// Render a star rating as five glyphs, e.g. "★★★☆☆". Unrated areas show dashes.
pub fn format_stars(stars: Option<u8>) -> String {
    match stars {
        Some(n) => {
            let n = n.min(5) as usize;
            format!("{}{}", "★".repeat(n), "☆".repeat(5 - n))
        }
        None => "-----".to_string(),
    }
}

fn format_confidence(level: ConfidenceLevel, use_colors: bool) -> String {
    let text = format!("{:<6}", level.to_string());
    if !use_colors {
        return text;
    }
    match level {
        ConfidenceLevel::High => text.green().to_string(),
        ConfidenceLevel::Medium => text.yellow().to_string(),
        ConfidenceLevel::Low => text.red().to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a name to fit available width, accounting for Unicode
fn truncate_name(name: &str, max_width: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_width {
        name.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format ranked results as a table with columns: Rank, Score, Stars, Confidence, Name, Code
/// Rank column: 3 chars (fits "99."), right-aligned
/// Score column is right-aligned, 6 chars wide (fits "100.0*")
pub fn format_ranking_table(results: &[CityScoreResult], use_colors: bool) -> String {
    if results.is_empty() {
        return "No areas to compare.".to_string();
    }

    let term_width = get_terminal_width();

    let rank_width = 3;
    let score_width = 6;
    let stars_width = 5;
    let confidence_width = 6;
    let separator = "  ";

    results
        .iter()
        .map(|result| {
            let rank_str = format!("{:>2}.", result.rank);
            let incomplete = result.used_indicator_count < result.total_indicator_count;
            let score_str = format_score(result.composite_score, incomplete);
            let score_padded = format!("{:>width$}", score_str, width = score_width);
            let stars = format_stars(result.star_rating);
            let confidence = format_confidence(result.confidence.level, use_colors);

            let fixed_width = rank_width
                + 1
                + score_width
                + stars_width
                + confidence_width
                + separator.len() * 4
                + result.area_code.len();

            let name = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_name(&result.city_name, width - fixed_width)
                }
                // Very narrow terminal, show truncated
                Some(_) => truncate_name(&result.city_name, 20),
                // No terminal (pipe), don't truncate
                None => result.city_name.clone(),
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}",
                    rank_str.dimmed(),
                    score_padded.bold(),
                    separator,
                    stars.yellow(),
                    separator,
                    confidence,
                    separator,
                    name,
                    separator,
                    result.area_code.dimmed()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}{}{}{}{}",
                    rank_str,
                    score_padded,
                    separator,
                    stars,
                    separator,
                    confidence,
                    separator,
                    name,
                    separator,
                    result.area_code
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format results as tab-separated values for scripting
/// Columns: rank, composite, stars, confidence, name, code (no headers, no colors)
pub fn format_tsv(results: &[CityScoreResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "{}\t{:.1}\t{}\t{}\t{}\t{}",
                r.rank,
                r.composite_score,
                r.star_rating.map(|s| s.to_string()).unwrap_or_default(),
                r.confidence.level,
                r.city_name,
                r.area_code
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the notes of every result that has any, grouped by area
pub fn format_notes(results: &[CityScoreResult]) -> String {
    results
        .iter()
        .filter(|r| !r.notes.is_empty())
        .map(|r| {
            let notes: Vec<String> = r.notes.iter().map(|n| format!("  - {}", n)).collect();
            format!("{} ({}):\n{}", r.city_name, r.area_code, notes.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a standalone area profile: national percentile and stars per indicator
pub fn format_profile(
    profile: &AreaProfile,
    area: &AreaIndicatorSet,
    catalog: &Catalog,
    use_colors: bool,
) -> String {
    let mut lines = Vec::new();

    let header = format!("{} ({})", profile.city_name, profile.area_code);
    lines.push(if use_colors {
        header.bold().to_string()
    } else {
        header
    });
    lines.push(format!("  Overall: {}", format_stars(profile.star_rating)));
    lines.push(format!(
        "  Confidence: {} ({})",
        profile.confidence.level, profile.confidence.reason
    ));
    lines.push(String::new());

    for definition in catalog.definitions() {
        let value = match area.value(definition.id) {
            Some(v) => definition.format_value(v),
            None => "no data".to_string(),
        };
        let rating = profile
            .indicator_stars
            .iter()
            .find(|s| s.indicator_id == definition.id);
        let national = match rating {
            Some(r) => format!("{}  p{:.0}", format_stars(Some(r.stars)), r.national_percentile),
            None => "-----".to_string(),
        };
        lines.push(format!("  {:<42} {:>18}  {}", definition.label, value, national));
    }

    if !profile.category_stars.is_empty() {
        lines.push(String::new());
        for (category, average) in &profile.category_stars {
            lines.push(format!("  {:<12} {:.1}", category.to_string(), average));
        }
    }

    if !profile.notes.is_empty() {
        lines.push(String::new());
        for note in &profile.notes {
            lines.push(format!("  - {}", note));
        }
    }

    lines.join("\n")
}

/// Format presets with their category weights, one preset per line
pub fn format_presets(registry: &PresetRegistry, default_preset: &str) -> String {
    registry
        .iter()
        .map(|preset| {
            let weights: Vec<String> = preset
                .weights()
                .iter()
                .map(|(category, weight)| format!("{}={}", category, weight))
                .collect();
            let marker = if preset.name() == default_preset { "*" } else { " " };
            format!(
                "{} {:<12} {:<20} {}",
                marker,
                preset.name(),
                preset.label(),
                weights.join(" ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the indicator catalog, one indicator per line
pub fn format_catalog(catalog: &Catalog) -> String {
    catalog
        .definitions()
        .iter()
        .map(|d| {
            let direction = match d.direction {
                Direction::HigherBetter => "higher is better",
                Direction::LowerBetter => "lower is better",
            };
            format!(
                "{:<20} {:<11} {:<42} [{}] {}",
                d.id.as_str(),
                d.category.to_string(),
                d.label,
                d.unit,
                direction
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
