// File: crates/tsagg-bench/src/main.rs
// Summary: Command-line driver: generate, aggregate, render and score series, or run the whole benchmark grid.

mod pipeline;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use tsagg_core::metrics::{ScoreConfig, DEFAULT_MASK_WINDOW};
use tsagg_core::raster::{load_png, save_png};
use tsagg_core::store::{read_series, write_series};
use tsagg_core::{
    Aggregator, Algorithm, Backend, GapConfig, GapMarker, LineShape, Limits, MetricRecord, MetricTable, RenderConfig,
    ResultKey, Scorer, Series, SeriesKind, Values,
};

#[derive(Parser, Debug)]
#[command(name = "tsagg-bench", version, about = "Visual-fidelity benchmark for time-series aggregation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a synthetic series (sine + drift, optional spike and gap) to CSV.
    Generate(GenerateArgs),
    /// Aggregate a CSV series down to `--n-out` points.
    Aggregate(AggregateArgs),
    /// Render a CSV series to PNG.
    Render(RenderArgs),
    /// Score an aggregated rendering against its reference rendering.
    Score(ScoreArgs),
    /// Aggregate, render and score one dataset over a grid of settings.
    Bench(pipeline::BenchArgs),
}

/// Gap post-process flags shared by `aggregate` and `bench`.
#[derive(Args, Debug, Clone)]
pub(crate) struct GapArgs {
    /// Do not mark gaps with NaN.
    #[arg(long)]
    no_gaps: bool,
    /// Which point around a gap receives the NaN marker (end, begin, both).
    #[arg(long, default_value = "end")]
    gap_marker: GapMarker,
}

impl GapArgs {
    pub(crate) fn config(&self) -> GapConfig {
        GapConfig { interleave_gaps: !self.no_gaps, marker: self.gap_marker }
    }
}

/// Canvas and stroke flags shared by `render` and `bench`.
#[derive(Args, Debug, Clone)]
pub(crate) struct CanvasArgs {
    #[arg(long, default_value_t = tsagg_core::types::WIDTH)]
    width: u32,
    #[arg(long, default_value_t = tsagg_core::types::HEIGHT)]
    height: u32,
    #[arg(long, default_value_t = tsagg_core::types::DPI)]
    dpi: f64,
    /// Line width in pixels.
    #[arg(long, default_value_t = tsagg_core::types::LINE_WIDTH_PX)]
    line_width: f64,
    /// Draw aliased lines (Skia only).
    #[arg(long)]
    no_aa: bool,
}

impl CanvasArgs {
    pub(crate) fn config(&self, line_shape: LineShape) -> RenderConfig {
        RenderConfig {
            width: self.width,
            height: self.height,
            dpi: self.dpi,
            anti_alias: !self.no_aa,
            line_width_px: self.line_width,
            line_shape,
            ..RenderConfig::default()
        }
    }
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Output CSV.
    #[arg(short, long)]
    output: PathBuf,
    #[arg(short, long, default_value_t = 100_000)]
    n: usize,
    /// Add a single spike in the middle of the series.
    #[arg(long)]
    spike: bool,
    /// Cut a hole of 10% of the samples out of the index.
    #[arg(long)]
    gap: bool,
}

#[derive(Args, Debug)]
struct AggregateArgs {
    #[arg(short, long)]
    input: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
    /// minmax, lttb or minmaxlttb.
    #[arg(short, long, default_value = "minmaxlttb")]
    aggregator: Algorithm,
    #[arg(long, default_value_t = 1_000)]
    n_out: usize,
    #[arg(long, default_value_t = tsagg_core::DEFAULT_MINMAX_RATIO)]
    minmax_ratio: usize,
    #[command(flatten)]
    gaps: GapArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(short, long)]
    input: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
    /// skia or plotters.
    #[arg(short, long, default_value = "skia")]
    backend: Backend,
    /// linear, spline, hv, vh, hvh or vhv.
    #[arg(long, default_value = "linear")]
    line_shape: LineShape,
    /// Take axis limits from this (reference) series instead of the input.
    #[arg(long)]
    limits_from: Option<PathBuf>,
    #[command(flatten)]
    canvas: CanvasArgs,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Rendering of the aggregated series.
    #[arg(long)]
    aggregated: PathBuf,
    /// Rendering of the reference series.
    #[arg(long)]
    reference: PathBuf,
    /// Channel to score; defaults to alpha for RGBA and red for RGB.
    #[arg(long)]
    channel: Option<usize>,
    #[arg(long, default_value_t = DEFAULT_MASK_WINDOW)]
    mask_window: usize,
    /// Append the record to this results table.
    #[arg(long)]
    table: Option<PathBuf>,
    /// Dataset name written to the table.
    #[arg(long, default_value = "unnamed")]
    data: String,
    /// Reference length written to the table.
    #[arg(long, default_value_t = 0)]
    n: usize,
    #[arg(long, default_value = "minmaxlttb")]
    aggregator: Algorithm,
    #[arg(long, default_value_t = 0)]
    n_out: usize,
    #[arg(long, default_value = "skia")]
    backend: Backend,
    #[arg(long, default_value = "linear")]
    line_shape: LineShape,
    #[arg(long, default_value_t = tsagg_core::types::LINE_WIDTH_PX)]
    line_width: f64,
    #[arg(long)]
    no_aa: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => generate(args),
        Command::Aggregate(args) => aggregate(args),
        Command::Render(args) => render(args),
        Command::Score(args) => score(args),
        Command::Bench(args) => pipeline::run(args),
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let series = synthetic(&args)?;
    write_series(&args.output, &series)
        .with_context(|| format!("failed to write '{}'", args.output.display()))?;
    println!("Wrote {} points to {}", series.len(), args.output.display());
    Ok(())
}

// sine + slow drift + deterministic jitter
fn synthetic(args: &GenerateArgs) -> Result<Series> {
    if args.n < 3 {
        anyhow::bail!("need at least 3 points, got {}", args.n);
    }
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut values: Vec<f64> = (0..args.n)
        .map(|i| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let jitter = ((state >> 33) as f64 / (1u64 << 31) as f64 - 0.5) * 0.4;
            (i as f64 * 0.01).sin() * 10.0 + i as f64 * 0.0001 + jitter
        })
        .collect();
    if args.spike {
        values[args.n / 2] += 50.0;
    }

    let hole = if args.gap { args.n / 10 } else { 0 };
    let hole_start = args.n / 3;
    let index: Vec<f64> = (0..args.n)
        .map(|i| if i >= hole_start { (i + hole) as f64 } else { i as f64 })
        .collect();
    Ok(Series::try_new("value", index, Values::Float(values))?)
}

fn aggregate(args: AggregateArgs) -> Result<()> {
    let series = read_series(&args.input)
        .with_context(|| format!("failed to load series '{}'", args.input.display()))?;
    let aggregator = Aggregator::new(args.aggregator.with_minmax_ratio(args.minmax_ratio)).with_gaps(args.gaps.config());
    let out = aggregator
        .aggregate(&series, args.n_out)
        .with_context(|| format!("{} failed on '{}'", aggregator.name(), args.input.display()))?;
    write_series(&args.output, &out)?;
    println!(
        "{}: {} -> {} points, wrote {}",
        aggregator.name(),
        series.len(),
        out.len(),
        args.output.display()
    );
    Ok(())
}

fn render(args: RenderArgs) -> Result<()> {
    let series = read_series(&args.input)
        .with_context(|| format!("failed to load series '{}'", args.input.display()))?;
    let limits = match &args.limits_from {
        Some(path) => {
            let reference = read_series(path)
                .with_context(|| format!("failed to load limits series '{}'", path.display()))?;
            Limits::from_series(&reference)?
        }
        None => Limits::from_series(&series)?,
    };
    let backend = args.backend;
    let cfg = args.canvas.config(args.line_shape).with_limits(limits);
    let raster = backend.render_series(&series, &cfg)?;
    save_png(&raster, &args.output)?;
    println!("Rendered {} points with {} to {}", series.len(), backend, args.output.display());
    Ok(())
}

fn score(args: ScoreArgs) -> Result<()> {
    let agg = load_png(&args.aggregated)
        .with_context(|| format!("failed to load '{}'", args.aggregated.display()))?;
    let reference = load_png(&args.reference)
        .with_context(|| format!("failed to load '{}'", args.reference.display()))?;
    let ch = args.channel.unwrap_or_else(|| default_channel(agg.dim().2));
    let scorer = Scorer::new(ScoreConfig { mask_window: args.mask_window, ..ScoreConfig::default() });
    let record = scorer.score(&agg, &reference, ch)?;
    print_record(&args.aggregated, &record);

    if let Some(table) = &args.table {
        let key = ResultKey {
            data: args.data.clone(),
            n: args.n,
            kind: SeriesKind::Aggregated { algorithm: args.aggregator, n_out: args.n_out },
            backend: args.backend,
            line_shape: args.line_shape,
            line_width: args.line_width,
            anti_alias: !args.no_aa,
            channel: ch,
        };
        MetricTable::new(table).append(&key, &record)?;
        info!("appended to {}", table.display());
    }
    Ok(())
}

fn default_channel(channels: usize) -> usize {
    if channels == 4 { 3 } else { 0 }
}

fn print_record(label: &Path, record: &MetricRecord) {
    println!("{}", label.display());
    for (name, value) in record.entries() {
        println!("  {name:<32} {value}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_bench_lists() {
        let cli = Cli::try_parse_from([
            "tsagg-bench",
            "bench",
            "--data",
            "ecg",
            "--figure-root",
            "/tmp/figs",
            "--dataset-dir",
            "/tmp/data",
            "--aggregators",
            "minmax,lttb",
            "--n-out",
            "500,1000",
        ])
        .unwrap();
        match cli.command {
            Command::Bench(args) => {
                assert_eq!(args.aggregators, vec![Algorithm::MinMax, Algorithm::Lttb]);
                assert_eq!(args.n_out, vec![500, 1000]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_parses_through_core_names() {
        let cli = Cli::try_parse_from(["tsagg-bench", "render", "-i", "a.csv", "-o", "a.png", "-b", "plotters", "--line-shape", "vhv"])
            .unwrap();
        match cli.command {
            Command::Render(args) => {
                assert_eq!(args.backend, Backend::Plotters);
                assert_eq!(args.line_shape, LineShape::Vhv);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["tsagg-bench", "render", "-i", "a.csv", "-o", "a.png", "-b", "svg"]).is_err());
        assert!(Cli::try_parse_from(["tsagg-bench", "aggregate", "-i", "a", "-o", "b", "--gap-marker", "middle"]).is_err());
    }

    #[test]
    fn generated_gap_is_detected() {
        let args = GenerateArgs { output: PathBuf::from("unused.csv"), n: 5_000, spike: true, gap: true };
        let series = synthetic(&args).unwrap();
        assert_eq!(series.len(), 5_000);
        let mask = tsagg_core::gaps::gap_mask(series.index(), GapMarker::End).unwrap();
        assert_eq!(mask.iter().filter(|&&m| m).count(), 1);
    }

    #[test]
    fn default_channel_follows_layout() {
        assert_eq!(default_channel(4), 3);
        assert_eq!(default_channel(3), 0);
    }
}
