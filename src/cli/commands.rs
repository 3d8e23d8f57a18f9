//! CLI command definitions for kernel-herding.
//!
//! Three commands are provided: `select` subsamples a dataset, `baseline`
//! ranks items by their average similarity to the rest of the collection,
//! and `synth` writes a synthetic clustered dataset to experiment with.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::info;

use crate::dataset::{BlobGenerator, Dataset};
use crate::herding::{
    HerdingConfig, KernelHerding, ScoreFloor, SelectionStats, SelfSimilarity,
    SimilarityAccumulator, TrailWalk,
};
use crate::kernel::{Kernel, KernelSpec};
use crate::metrics::{export_metrics, init_metrics, MetricsCollector};

/// Number of items listed by `baseline` unless `--top` says otherwise.
const DEFAULT_TOP: usize = 10;

/// Greedy kernel herding subset selection.
#[derive(Parser)]
#[command(name = "kernel-herding")]
#[command(about = "Select representative subsets of numeric datasets with kernel herding")]
#[command(version)]
#[command(
    long_about = "kernel-herding picks a subset of a dataset whose kernel mean matches the full collection.\n\nDatasets are JSON (an array of rows or {\"attributes\": [...], \"rows\": [...]}) or JSONL.\n\nExample usage:\n  kernel-herding synth --clusters 3 --per-cluster 100 --dim 2 --output blobs.json\n  kernel-herding select --input blobs.json -Z 10 -K rbf:gamma=0.5 --output subset.json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Select a representative subset of a dataset.
    #[command(alias = "sel")]
    Select(SelectArgs),

    /// Rank items by baseline similarity to the rest of the dataset.
    Baseline(BaselineArgs),

    /// Generate a synthetic Gaussian blob dataset.
    Synth(SynthArgs),
}

/// Initial running maximum, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScoreFloorArg {
    Zero,
    NegativeInfinity,
}

impl From<ScoreFloorArg> for ScoreFloor {
    fn from(arg: ScoreFloorArg) -> Self {
        match arg {
            ScoreFloorArg::Zero => ScoreFloor::Zero,
            ScoreFloorArg::NegativeInfinity => ScoreFloor::NegativeInfinity,
        }
    }
}

/// Self-similarity correction, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SelfSimilarityArg {
    AssumeUnit,
    Exact,
    Ignore,
}

impl From<SelfSimilarityArg> for SelfSimilarity {
    fn from(arg: SelfSimilarityArg) -> Self {
        match arg {
            SelfSimilarityArg::AssumeUnit => SelfSimilarity::AssumeUnit,
            SelfSimilarityArg::Exact => SelfSimilarity::Exact,
            SelfSimilarityArg::Ignore => SelfSimilarity::Ignore,
        }
    }
}

/// Extent of the backward trail walk, as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TrailWalkArg {
    Full,
    SkipFirst,
}

impl From<TrailWalkArg> for TrailWalk {
    fn from(arg: TrailWalkArg) -> Self {
        match arg {
            TrailWalkArg::Full => TrailWalk::Full,
            TrailWalkArg::SkipFirst => TrailWalk::SkipFirst,
        }
    }
}

/// Arguments for `kernel-herding select`.
#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Input dataset (.json or .jsonl).
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Where to write the subset. Printed to stdout when omitted.
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Subset size as a percentage of the input, in (0, 100].
    #[arg(short = 'Z', long = "percent")]
    pub percent: Option<f64>,

    /// Kernel, e.g. "poly:exponent=2", "rbf:gamma=0.5", "linear".
    #[arg(short = 'K', long)]
    pub kernel: Option<KernelSpec>,

    /// Seed for the collision fallback generator.
    #[arg(long)]
    pub seed: Option<u64>,

    /// YAML configuration file. Command-line flags override its values.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Initial running maximum for each argmax scan.
    #[arg(long, value_enum)]
    pub score_floor: Option<ScoreFloorArg>,

    /// How an item's self-similarity is removed from its baseline.
    #[arg(long, value_enum)]
    pub self_similarity: Option<SelfSimilarityArg>,

    /// How far back collisions search the candidate trail.
    #[arg(long, value_enum)]
    pub trail_walk: Option<TrailWalkArg>,

    /// Precompute the full Gram matrix before selecting.
    #[arg(long)]
    pub cache_kernel: bool,

    /// Print the run summary as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Print Prometheus metrics after the run.
    #[arg(long)]
    pub metrics: bool,
}

/// Arguments for `kernel-herding baseline`.
#[derive(Parser, Debug)]
pub struct BaselineArgs {
    /// Input dataset (.json or .jsonl).
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Kernel, e.g. "poly:exponent=2", "rbf:gamma=0.5", "linear".
    #[arg(short = 'K', long, default_value = "poly")]
    pub kernel: KernelSpec,

    /// How an item's self-similarity is removed from its baseline.
    #[arg(long, value_enum, default_value = "assume-unit")]
    pub self_similarity: SelfSimilarityArg,

    /// Number of items to list.
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP)]
    pub top: usize,

    /// Output as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `kernel-herding synth`.
#[derive(Parser, Debug)]
pub struct SynthArgs {
    /// Number of clusters.
    #[arg(long, default_value = "3")]
    pub clusters: usize,

    /// Points per cluster.
    #[arg(long, default_value = "50")]
    pub per_cluster: usize,

    /// Dimension of each point.
    #[arg(long, default_value = "2")]
    pub dim: usize,

    /// Standard deviation of each cluster.
    #[arg(long, default_value = "0.5", allow_negative_numbers = true)]
    pub spread: f64,

    /// Cluster centers are drawn from [-range, range] on every axis.
    #[arg(long, default_value = "10.0")]
    pub center_range: f64,

    /// Seed for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output file.
    #[arg(short = 'o', long)]
    pub output: PathBuf,
}

/// Summary printed after `select`.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub input: String,
    pub output: Option<String>,
    pub kernel: String,
    pub sample_size_percent: f64,
    pub indices: Vec<usize>,
    pub stats: SelectionStats,
    pub duration_secs: f64,
    pub finished_at: DateTime<Utc>,
}

/// One line of the `baseline` ranking.
#[derive(Debug, Serialize)]
pub struct BaselineEntry {
    pub index: usize,
    pub baseline: f64,
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access CLI arguments (like log_level) before running commands.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// For more control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli())
}

/// Run the CLI with the parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Select(args) => run_select_command(args),
        Commands::Baseline(args) => run_baseline_command(args),
        Commands::Synth(args) => run_synth_command(args),
    }
}

// ============================================================================
// Select
// ============================================================================

/// Merges the YAML file (if any) with command-line overrides.
fn resolve_config(args: &SelectArgs) -> anyhow::Result<HerdingConfig> {
    let mut config = match &args.config {
        Some(path) => HerdingConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => HerdingConfig::default(),
    };

    if let Some(percent) = args.percent {
        config.sample_size_percent = percent;
    }
    if let Some(kernel) = &args.kernel {
        config.kernel = kernel.clone();
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(floor) = args.score_floor {
        config.score_floor = floor.into();
    }
    if let Some(correction) = args.self_similarity {
        config.self_similarity = correction.into();
    }
    if let Some(walk) = args.trail_walk {
        config.trail_walk = walk.into();
    }
    if args.cache_kernel {
        config.cache_kernel = true;
    }

    config.validate()?;
    Ok(config)
}

fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    Dataset::load(path).with_context(|| format!("Failed to load dataset {}", path.display()))
}

fn run_select_command(args: SelectArgs) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let data = load_dataset(&args.input)?;

    if args.metrics {
        init_metrics().context("Failed to initialize metrics")?;
    }

    let mut kernel = config.build_kernel()?;
    let kernel_kind = config.kernel.kind();
    let kernel_name = kernel.name();
    let percent = config.sample_size_percent;

    let started = Instant::now();
    let selection = KernelHerding::new(config).select(&mut kernel, &data)?;
    let duration_secs = started.elapsed().as_secs_f64();

    MetricsCollector::new().record_selection(kernel_kind, &selection.stats, duration_secs);

    let subset = selection.apply(&data);
    match &args.output {
        Some(path) => {
            subset
                .save(path)
                .with_context(|| format!("Failed to write subset {}", path.display()))?;
            info!(path = %path.display(), items = subset.len(), "Wrote subset");
        }
        None => println!("{}", subset.to_json_string()?),
    }

    let summary = RunSummary {
        input: args.input.display().to_string(),
        output: args.output.as_ref().map(|p| p.display().to_string()),
        kernel: kernel_name,
        sample_size_percent: percent,
        indices: selection.indices,
        stats: selection.stats,
        duration_secs,
        finished_at: Utc::now(),
    };

    // Keep stdout clean for the subset when it is streamed there
    let to_stderr = args.output.is_none();
    let report = if args.json {
        serde_json::to_string_pretty(&summary)?
    } else {
        format_summary(&summary)
    };
    emit(&report, to_stderr);

    if args.metrics {
        emit(&export_metrics(), to_stderr);
    }

    Ok(())
}

fn format_summary(summary: &RunSummary) -> String {
    let stats = &summary.stats;
    let mut lines = vec![
        "✓ Kernel herding selection completed".to_string(),
        format!("  Kernel:          {}", summary.kernel),
        format!(
            "  Selected:        {} of {} ({}%)",
            stats.target_size, stats.items, summary.sample_size_percent
        ),
        format!("  Seed item:       {}", stats.seed_index),
        format!(
            "  Collisions:      {} (trail: {}, random: {})",
            stats.collisions, stats.trail_resolutions, stats.random_fallbacks
        ),
        format!("  Evaluations:     {}", stats.kernel_evaluations),
        format!("  Duration:        {:.3}s", summary.duration_secs),
    ];
    if let Some(output) = &summary.output {
        lines.push(format!("  Output:          {}", output));
    }
    lines.join("\n")
}

fn emit(text: &str, to_stderr: bool) {
    if to_stderr {
        eprintln!("{}", text);
    } else {
        println!("{}", text);
    }
}

// ============================================================================
// Baseline
// ============================================================================

/// Ranks items by baseline similarity, highest first. Ties keep input order.
fn rank_baseline(baseline: &[f64], top: usize) -> Vec<BaselineEntry> {
    let mut ranked: Vec<BaselineEntry> = baseline
        .iter()
        .enumerate()
        .map(|(index, &baseline)| BaselineEntry { index, baseline })
        .collect();
    ranked.sort_by(|a, b| b.baseline.total_cmp(&a.baseline));
    ranked.truncate(top);
    ranked
}

fn run_baseline_command(args: BaselineArgs) -> anyhow::Result<()> {
    let data = load_dataset(&args.input)?;
    let mut kernel = args.kernel.to_kernel()?;
    kernel.build(&data)?;

    let accumulator =
        SimilarityAccumulator::compute(&*kernel, &data, args.self_similarity.into())?;
    let ranked = rank_baseline(accumulator.baseline(), args.top);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }

    println!("Baseline similarity ({}, {} items):", kernel.name(), data.len());
    for (rank, entry) in ranked.iter().enumerate() {
        println!("  {:>3}. item {:<6} {:.6}", rank + 1, entry.index, entry.baseline);
    }
    Ok(())
}

// ============================================================================
// Synth
// ============================================================================

fn run_synth_command(args: SynthArgs) -> anyhow::Result<()> {
    let mut generator =
        BlobGenerator::new(args.clusters, args.per_cluster, args.dim)
            .with_spread(args.spread)
            .with_center_range(args.center_range);
    if let Some(seed) = args.seed {
        generator = generator.with_seed(seed);
    }

    let data = generator.generate()?;
    data.save(&args.output)
        .with_context(|| format!("Failed to write dataset {}", args.output.display()))?;

    info!(
        path = %args.output.display(),
        items = data.len(),
        dimension = data.width(),
        "Wrote synthetic dataset"
    );
    println!(
        "✓ Wrote {} items ({} clusters × {}) to {}",
        data.len(),
        args.clusters,
        args.per_cluster,
        args.output.display()
    );
    Ok(())
}
