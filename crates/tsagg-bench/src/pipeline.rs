// File: crates/tsagg-bench/src/pipeline.rs
// Summary: Benchmark grid: cache the reference, then aggregate, render and score every combination in parallel.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::{info, warn};
use rayon::prelude::*;
use tsagg_core::raster::save_png;
use tsagg_core::store::{data_path, png_path, read_series, write_series};
use tsagg_core::{
    Aggregator, Algorithm, Backend, DataKey, FigureKey, GapConfig, LineShape, Limits, MetricRecord, MetricTable,
    PathConfig, Raster, RenderConfig, ResultKey, Scorer, Series, SeriesKind,
};

use crate::{CanvasArgs, GapArgs};

#[derive(Args, Debug)]
pub(crate) struct BenchArgs {
    /// Dataset name used in every cache key.
    #[arg(long)]
    data: String,
    /// Reference series CSV; cached under the figure root. Without it the
    /// cached reference is read back.
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Figure root; with `--dataset-dir`, overrides hostname detection.
    #[arg(long, requires = "dataset_dir")]
    figure_root: Option<PathBuf>,
    #[arg(long, requires = "figure_root")]
    dataset_dir: Option<PathBuf>,
    /// Comma-separated: minmax, lttb, minmaxlttb.
    #[arg(long, value_delimiter = ',', default_values = ["minmax", "lttb", "minmaxlttb"])]
    pub(crate) aggregators: Vec<Algorithm>,
    #[arg(long, value_delimiter = ',', default_values_t = [500usize, 1_000, 2_000])]
    pub(crate) n_out: Vec<usize>,
    #[arg(long, default_value_t = tsagg_core::DEFAULT_MINMAX_RATIO)]
    minmax_ratio: usize,
    #[arg(long, value_delimiter = ',', default_values = ["skia"])]
    pub(crate) backends: Vec<Backend>,
    #[arg(long, value_delimiter = ',', default_values = ["linear"])]
    pub(crate) line_shapes: Vec<LineShape>,
    /// Results table; defaults to `results.csv` under the figure root.
    #[arg(long)]
    table: Option<PathBuf>,
    /// Worker threads (default: one per core).
    #[arg(long)]
    threads: Option<usize>,
    #[command(flatten)]
    gaps: GapArgs,
    #[command(flatten)]
    canvas: CanvasArgs,
}

// One aggregated series, shared by every figure drawn from it.
struct Aggregated {
    kind: SeriesKind,
    series: Series,
}

// One reference figure and the settings every comparison against it uses.
struct Figure {
    backend: Backend,
    cfg: RenderConfig,
    raster: Raster,
}

pub(crate) fn run(args: BenchArgs) -> Result<()> {
    let paths = match (&args.figure_root, &args.dataset_dir) {
        (Some(figs), Some(data)) => PathConfig::new(data, figs),
        _ => PathConfig::detect().context("no storage layout for this host; pass --figure-root and --dataset-dir")?,
    };
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to size the worker pool")?;
    }

    let reference = load_reference(&args, &paths)?;
    let n = reference.len();
    let limits = Limits::from_series(&reference)?;
    info!("reference `{}`: {} points, limits {:?}", args.data, n, limits);

    // each (algorithm, n_out) is aggregated and cached exactly once
    let settings = aggregation_settings(&args.aggregators, &args.n_out, args.minmax_ratio);
    let gaps = args.gaps.config();
    let aggregated: Vec<Aggregated> = settings
        .par_iter()
        .map(|&(algorithm, n_out)| aggregate_and_cache(&args.data, &reference, algorithm, n_out, gaps, &paths))
        .collect::<Result<_>>()?;

    // reference figures, one per backend/shape
    let mut figures = Vec::new();
    for &backend in &args.backends {
        for &shape in &args.line_shapes {
            let cfg = args.canvas.config(shape).with_limits(limits);
            if backend == Backend::Plotters && !cfg.anti_alias {
                warn!("skipping {backend}/{shape}: aliased lines are not supported");
                continue;
            }
            if figures.iter().any(|f: &Figure| f.backend == backend && f.cfg == cfg) {
                continue;
            }
            let raster = backend
                .render_series(&reference, &cfg)
                .with_context(|| format!("failed to render reference with {backend}"))?;
            save_png(&raster, png_path(&paths, &figure_key(&args.data, n, SeriesKind::Reference, backend, &cfg)))?;
            figures.push(Figure { backend, cfg, raster });
        }
    }

    let jobs: Vec<(&Figure, &Aggregated)> =
        figures.iter().flat_map(|f| aggregated.iter().map(move |a| (f, a))).collect();
    info!("scoring {} combination(s)", jobs.len());

    let scorer = Scorer::default();
    let rows: Vec<(ResultKey, MetricRecord)> = jobs
        .par_iter()
        .map(|&(figure, agg)| score_figure(&args.data, n, figure, agg, &paths, &scorer))
        .collect::<Result<_>>()?;

    let table = MetricTable::new(args.table.clone().unwrap_or_else(|| paths.results_path()));
    for (key, record) in &rows {
        table.append(key, record)?;
        println!(
            "{:<18} n_out={:<6} {:<9} {:<7} DSSIM={:.5} DSSIM_masked={:.5} MAE_masked={:.3}",
            key.kind.label(),
            key.kind.n_out().unwrap_or(n),
            key.backend.name(),
            key.line_shape.as_str(),
            record.dssim,
            record.dssim_masked,
            record.mae_masked
        );
    }
    println!("Appended {} row(s) to {}", rows.len(), table.path().display());
    Ok(())
}

/// Distinct (algorithm, n_out) pairs in argument order.
fn aggregation_settings(algorithms: &[Algorithm], n_outs: &[usize], minmax_ratio: usize) -> Vec<(Algorithm, usize)> {
    let mut settings = Vec::new();
    for &algorithm in algorithms {
        for &n_out in n_outs {
            let setting = (algorithm.with_minmax_ratio(minmax_ratio), n_out);
            if !settings.contains(&setting) {
                settings.push(setting);
            }
        }
    }
    settings
}

fn load_reference(args: &BenchArgs, paths: &PathConfig) -> Result<Series> {
    match &args.input {
        Some(input) => {
            // paths that do not exist as given are looked up in the dataset store
            let input = if input.exists() { input.clone() } else { paths.dataset(input) };
            let series = read_series(&input)
                .with_context(|| format!("failed to load reference '{}'", input.display()))?;
            let key = DataKey { data: args.data.clone(), n: series.len(), kind: SeriesKind::Reference };
            write_series(data_path(paths, &key), &series)?;
            Ok(series)
        }
        None => {
            let cached = find_cached_reference(paths, &args.data)?;
            read_series(&cached).with_context(|| format!("failed to load reference '{}'", cached.display()))
        }
    }
}

// cached references are keyed by their length, which is not known up front
fn find_cached_reference(paths: &PathConfig, data: &str) -> Result<PathBuf> {
    let prefix = format!("{data}_{}_", tsagg_core::store::REFERENCE);
    let dir = paths.data_dir();
    let entries = std::fs::read_dir(&dir).with_context(|| format!("cannot list '{}'", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|f| f.to_str())
            .and_then(|f| f.strip_prefix(&prefix))
            .and_then(|rest| rest.strip_suffix(".csv"))
            .is_some_and(|n| n.parse::<usize>().is_ok());
        if matches {
            return Ok(path);
        }
    }
    anyhow::bail!("no cached reference for `{data}` in '{}'; pass --input", dir.display())
}

fn figure_key(data: &str, n: usize, kind: SeriesKind, backend: Backend, cfg: &RenderConfig) -> FigureKey {
    FigureKey {
        backend,
        data: data.to_string(),
        n,
        kind,
        line_shape: cfg.line_shape,
        line_width: cfg.line_width_px,
        anti_alias: cfg.anti_alias,
    }
}

fn aggregate_and_cache(
    data: &str,
    reference: &Series,
    algorithm: Algorithm,
    n_out: usize,
    gaps: GapConfig,
    paths: &PathConfig,
) -> Result<Aggregated> {
    let kind = SeriesKind::Aggregated { algorithm, n_out };
    let series = Aggregator::new(algorithm)
        .with_gaps(gaps)
        .aggregate(reference, n_out)
        .with_context(|| format!("{algorithm} failed for n_out={n_out}"))?;
    write_series(data_path(paths, &DataKey { data: data.to_string(), n: reference.len(), kind }), &series)?;
    Ok(Aggregated { kind, series })
}

fn score_figure(
    data: &str,
    n: usize,
    figure: &Figure,
    agg: &Aggregated,
    paths: &PathConfig,
    scorer: &Scorer,
) -> Result<(ResultKey, MetricRecord)> {
    let raster = figure.backend.render_series(&agg.series, &figure.cfg)?;
    save_png(&raster, png_path(paths, &figure_key(data, n, agg.kind, figure.backend, &figure.cfg)))?;

    let channel = figure.backend.signal_channel();
    let record = scorer.score(&raster, &figure.raster, channel)?;
    let key = ResultKey {
        data: data.to_string(),
        n,
        kind: agg.kind,
        backend: figure.backend,
        line_shape: figure.cfg.line_shape,
        line_width: figure.cfg.line_width_px,
        anti_alias: figure.cfg.anti_alias,
        channel,
    };
    Ok((key, record))
}
