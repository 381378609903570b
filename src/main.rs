use area_rank::catalog::Catalog;
use area_rank::fetch::{enrich_areas, DirectorySource};
use area_rank::input::LoadedRequest;
use area_rank::report::{save_report, ReportDocument};
use area_rank::scoring::{RankBy, ScoringConfig, ScoringEngine, WeightPreset};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_INPUT: i32 = 2;
const EXIT_CONFIG: i32 = 4;

const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum RankByArg {
    Composite,
    Stars,
}

impl From<RankByArg> for RankBy {
    fn from(arg: RankByArg) -> Self {
        match arg {
            RankByArg::Composite => RankBy::Composite,
            RankByArg::Stars => RankBy::Stars,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank every area in a report request
    Rank {
        /// Report request (YAML)
        input: PathBuf,
        /// Weight preset name (defaults to the configured default preset)
        #[arg(short, long)]
        preset: Option<String>,
        /// Ranking key (defaults to the configured rank_by)
        #[arg(long, value_enum)]
        rank_by: Option<RankByArg>,
        /// Directory of <domain>.yaml files merged into the areas before scoring
        #[arg(long)]
        domains: Option<PathBuf>,
        /// Number of areas fetched per batch from domain sources
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
        /// Print results as JSON
        #[arg(long, conflicts_with = "tsv")]
        json: bool,
        /// Print results as tab-separated values
        #[arg(long)]
        tsv: bool,
        /// Save the scored report as JSON to this path
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Show one area against the national baseline only
    Profile {
        /// Report request (YAML)
        input: PathBuf,
        /// Area code to profile
        #[arg(short, long)]
        area: String,
        /// Weight preset name (defaults to the configured default preset)
        #[arg(short, long)]
        preset: Option<String>,
        /// Directory of <domain>.yaml files merged into the areas before scoring
        #[arg(long)]
        domains: Option<PathBuf>,
        /// Print the profile as JSON
        #[arg(long)]
        json: bool,
    },
    /// List weight presets
    Presets,
    /// List the indicator catalog
    Indicators,
}

#[derive(Parser, Debug)]
#[command(name = "area-rank")]
#[command(about = "Rank candidate areas from public statistics", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/area-rank/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// RUST_LOG wins; otherwise --verbose selects debug and the default is warn.
fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "warn" })
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn exit_with(code: i32, message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(code);
}

fn resolve_preset(config: &ScoringConfig, requested: Option<&str>) -> WeightPreset {
    let registry = match config.preset_registry() {
        Ok(r) => r,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {}", e)),
    };
    let name = requested.unwrap_or_else(|| config.default_preset_name());
    match registry.get(name) {
        Ok(preset) => preset.clone(),
        Err(e) => exit_with(EXIT_CONFIG, e),
    }
}

async fn load_areas(input: &Path, domains: Option<&Path>, batch_size: usize) -> LoadedRequest {
    let mut loaded = match area_rank::input::load_request(input) {
        Ok(l) => l,
        Err(e) => exit_with(EXIT_INPUT, format!("Input error: {:#}", e)),
    };

    if let Some(dir) = domains {
        let sources = DirectorySource::discover(dir);
        debug!(sources = sources.len(), dir = %dir.display(), "enriching areas from domain files");

        let areas = std::mem::take(&mut loaded.areas);
        let (areas, report) = enrich_areas(areas, &sources, batch_size).await;
        loaded.areas = areas;

        for (domain, reason) in &report.failures {
            for area in &loaded.areas {
                loaded
                    .skipped
                    .entry(area.code.clone())
                    .or_default()
                    .push(format!("{} data unavailable: {}", domain, reason));
            }
        }
    }

    loaded
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let start_time = Instant::now();

    let config = match area_rank::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {:#}", e)),
    };

    // Validate scoring config at startup
    if let Err(errors) = area_rank::scoring::validate_scoring(&config) {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let ladder = match config.star_ladder() {
        Ok(l) => l,
        Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {}", e)),
    };
    let use_colors = area_rank::output::should_use_colors();

    match cli.command {
        Commands::Rank {
            input,
            preset,
            rank_by,
            domains,
            batch_size,
            json,
            tsv,
            save,
        } => {
            let preset = resolve_preset(&config, preset.as_deref());
            let loaded = load_areas(&input, domains.as_deref(), batch_size).await;
            let catalog = loaded.catalog();

            let rank_by = rank_by.map(RankBy::from).unwrap_or_else(|| config.rank_by());
            let engine = ScoringEngine::new(catalog.definitions(), &loaded.baselines)
                .with_ladder(ladder)
                .with_policy(config.category_weight_policy())
                .with_rank_by(rank_by);

            let mut results = engine.score_cities(&loaded.areas, &preset);
            for result in &mut results {
                if let Some(skipped) = loaded.skipped.get(&result.area_code) {
                    result.notes.extend(skipped.iter().cloned());
                }
            }

            if json {
                match serde_json::to_string_pretty(&results) {
                    Ok(s) => println!("{}", s),
                    Err(e) => exit_with(EXIT_INPUT, format!("Failed to serialize results: {}", e)),
                }
            } else if tsv {
                println!("{}", area_rank::output::format_tsv(&results));
            } else {
                println!(
                    "{}",
                    area_rank::output::format_ranking_table(&results, use_colors)
                );
                let notes = area_rank::output::format_notes(&results);
                if !notes.is_empty() {
                    println!();
                    println!("{}", notes);
                }
            }

            if let Some(path) = save {
                let report_id = loaded
                    .report_id
                    .clone()
                    .unwrap_or_else(|| "report".to_string());
                let document = ReportDocument::new(report_id, &catalog, &preset, results);
                if let Err(e) = save_report(&path, &document) {
                    exit_with(EXIT_INPUT, format!("{:#}", e));
                }
                debug!(path = %path.display(), "saved report");
            }

            debug!(elapsed = ?start_time.elapsed(), areas = loaded.areas.len(), "ranking done");
        }
        Commands::Profile {
            input,
            area,
            preset,
            domains,
            json,
        } => {
            let preset = resolve_preset(&config, preset.as_deref());
            let loaded = load_areas(&input, domains.as_deref(), DEFAULT_BATCH_SIZE).await;
            let catalog = loaded.catalog();

            let Some(area_set) = loaded.find_area(&area) else {
                exit_with(EXIT_INPUT, format!("Area '{}' not found in {}", area, input.display()));
            };

            let engine = ScoringEngine::new(catalog.definitions(), &loaded.baselines)
                .with_ladder(ladder)
                .with_policy(config.category_weight_policy());

            let mut profile = engine.score_single_city(area_set, &preset);
            if let Some(skipped) = loaded.skipped.get(&profile.area_code) {
                profile.notes.extend(skipped.iter().cloned());
            }

            if json {
                match serde_json::to_string_pretty(&profile) {
                    Ok(s) => println!("{}", s),
                    Err(e) => exit_with(EXIT_INPUT, format!("Failed to serialize profile: {}", e)),
                }
            } else {
                println!(
                    "{}",
                    area_rank::output::format_profile(&profile, area_set, &catalog, use_colors)
                );
            }
        }
        Commands::Presets => {
            let registry = match config.preset_registry() {
                Ok(r) => r,
                Err(e) => exit_with(EXIT_CONFIG, format!("Config error: {}", e)),
            };
            println!(
                "{}",
                area_rank::output::format_presets(&registry, config.default_preset_name())
            );
        }
        Commands::Indicators => {
            println!("{}", area_rank::output::format_catalog(&Catalog::standard()));
        }
    }

    std::process::exit(EXIT_SUCCESS);
}
