pub mod formatter;

pub use formatter::{
    format_catalog, format_notes, format_presets, format_profile, format_ranking_table,
    format_score, format_stars, format_tsv, should_use_colors,
};
