// File: crates/tsagg-core/src/store.rs
// Summary: Deterministic cache locations plus CSV series files and the appendable metric table.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use log::info;

use crate::aggregator::Algorithm;
use crate::error::{Error, Result};
use crate::metrics::MetricRecord;
use crate::paths::PathConfig;
use crate::render::{Backend, LineShape};
use crate::series::{Series, Values};

pub const REFERENCE: &str = "reference";

/// Which variant of a dataset a file holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeriesKind {
    /// Full-resolution series.
    Reference,
    Aggregated { algorithm: Algorithm, n_out: usize },
}

impl SeriesKind {
    pub fn label(&self) -> &'static str {
        match self {
            SeriesKind::Reference => REFERENCE,
            SeriesKind::Aggregated { algorithm, .. } => algorithm.name(),
        }
    }

    pub fn n_out(&self) -> Option<usize> {
        match self {
            SeriesKind::Reference => None,
            SeriesKind::Aggregated { n_out, .. } => Some(*n_out),
        }
    }

    // "_{n_out}" for aggregated series, nothing for the reference
    fn n_out_suffix(&self) -> String {
        self.n_out().map(|n| format!("_{n}")).unwrap_or_default()
    }
}

/// Identifies a cached series.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataKey {
    pub data: String,
    pub n: usize,
    pub kind: SeriesKind,
}

/// Identifies a cached figure.
#[derive(Clone, Debug, PartialEq)]
pub struct FigureKey {
    pub backend: Backend,
    pub data: String,
    pub n: usize,
    pub kind: SeriesKind,
    pub line_shape: LineShape,
    pub line_width: f64,
    pub anti_alias: bool,
}

/// `{figure_root}/data/{data}_{aggregator}_{n}[_{n_out}].csv`
pub fn data_path(paths: &PathConfig, key: &DataKey) -> PathBuf {
    paths.data_dir().join(format!(
        "{}_{}_{}{}.csv",
        key.data,
        key.kind.label(),
        key.n,
        key.kind.n_out_suffix()
    ))
}

/// `{figure_root}/{backend}/{aggregator}_{data}_{n}[_{n_out}]_ls={shape}_lw={width}[_aa].png`
pub fn png_path(paths: &PathConfig, key: &FigureKey) -> PathBuf {
    paths.figure_dir(key.backend.name()).join(format!(
        "{}_{}_{}{}_ls={}_lw={}{}.png",
        key.kind.label(),
        key.data,
        key.n,
        key.kind.n_out_suffix(),
        key.line_shape,
        key.line_width,
        if key.anti_alias { "_aa" } else { "" }
    ))
}

/// Read a two-column CSV (index, value) with a header row.
/// Empty cells and `nan` read as NaN.
pub fn read_series(path: impl AsRef<Path>) -> Result<Series> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err(Error::Parse(format!("{}: expected an index and a value column", path.display())));
    }
    let name = headers.get(1).unwrap_or("value").to_string();

    let parse = |cell: Option<&str>, row: usize, what: &str| -> Result<f64> {
        let cell = cell.unwrap_or("").trim();
        if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
            return Ok(f64::NAN);
        }
        cell.parse::<f64>()
            .map_err(|e| Error::Parse(format!("{}: row {row} {what} `{cell}`: {e}", path.display())))
    };

    let mut index = Vec::new();
    let mut values = Vec::new();
    for (row, rec) in rdr.records().enumerate() {
        let rec = rec?;
        index.push(parse(rec.get(0), row + 1, "index")?);
        values.push(parse(rec.get(1), row + 1, "value")?);
    }
    Series::try_new(name, index, Values::Float(values))
}

/// Write a series as a two-column CSV of its numeric encoding (category
/// codes, booleans as 0/1), so `read_series` can always load it back.
/// Text values have no encoding and are rejected.
pub fn write_series(path: impl AsRef<Path>, series: &Series) -> Result<()> {
    let path = path.as_ref();
    let values = series.values().to_f64()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["index", series.name.as_str()])?;
    for (&x, &y) in series.index().iter().zip(&values) {
        let value = if y.is_nan() { String::new() } else { y.to_string() };
        wtr.write_record([x.to_string(), value])?;
    }
    wtr.flush()?;
    info!("wrote {} ({} rows)", path.display(), series.len());
    Ok(())
}

/// Key columns of one results-table row.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultKey {
    pub data: String,
    pub n: usize,
    pub kind: SeriesKind,
    pub backend: Backend,
    pub line_shape: LineShape,
    pub line_width: f64,
    pub anti_alias: bool,
    pub channel: usize,
}

const KEY_COLUMNS: [&str; 10] =
    ["data", "n", "n_out", "aggregator", "backend", "line_shape", "line_width", "aa", "channel", "scored_at"];

/// Append-only CSV of metric records.
#[derive(Clone, Debug)]
pub struct MetricTable {
    path: PathBuf,
}

impl MetricTable {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }

    fn header(record: &MetricRecord) -> Vec<String> {
        KEY_COLUMNS
            .iter()
            .map(|s| s.to_string())
            .chain(record.entries().into_iter().map(|(name, _)| name))
            .collect()
    }

    /// Append one row, writing the header first when the file is new.
    /// An existing file with different columns is rejected.
    pub fn append(&self, key: &ResultKey, record: &MetricRecord) -> Result<()> {
        let header = Self::header(record);
        let is_new = !self.path.exists() || std::fs::metadata(&self.path)?.len() == 0;
        if !is_new {
            let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(&self.path)?;
            let existing: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
            if existing != header {
                return Err(Error::config(format!(
                    "{} has different columns; write to a new table",
                    self.path.display()
                )));
            }
        } else if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            wtr.write_record(&header)?;
        }
        let mut row = vec![
            key.data.clone(),
            key.n.to_string(),
            key.kind.n_out().map(|n| n.to_string()).unwrap_or_default(),
            key.kind.label().to_string(),
            key.backend.name().to_string(),
            key.line_shape.to_string(),
            key.line_width.to_string(),
            key.anti_alias.to_string(),
            key.channel.to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        ];
        row.extend(record.entries().into_iter().map(|(_, v)| v.to_string()));
        wtr.write_record(&row)?;
        wtr.flush()?;
        Ok(())
    }

    /// All rows as `(column, value)` string maps, header order preserved.
    pub fn rows(&self) -> Result<Vec<Vec<(String, String)>>> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(&self.path)?;
        let header: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut out = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            out.push(header.iter().cloned().zip(rec.iter().map(str::to_string)).collect());
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> PathConfig { PathConfig::new("/data", "/figs") }

    #[test]
    fn data_paths() {
        let reference = DataKey { data: "ecg".into(), n: 50_000, kind: SeriesKind::Reference };
        assert_eq!(data_path(&paths(), &reference), PathBuf::from("/figs/data/ecg_reference_50000.csv"));

        let agg = DataKey {
            data: "ecg".into(),
            n: 50_000,
            kind: SeriesKind::Aggregated { algorithm: Algorithm::minmax_lttb(), n_out: 1_000 },
        };
        assert_eq!(data_path(&paths(), &agg), PathBuf::from("/figs/data/ecg_MinMaxLTTB_50000_1000.csv"));
    }

    #[test]
    fn png_paths() {
        let key = FigureKey {
            backend: Backend::Skia,
            data: "ecg".into(),
            n: 50_000,
            kind: SeriesKind::Aggregated { algorithm: Algorithm::Lttb, n_out: 800 },
            line_shape: LineShape::Linear,
            line_width: 1.0,
            anti_alias: true,
        };
        assert_eq!(png_path(&paths(), &key), PathBuf::from("/figs/skia/LTTB_ecg_50000_800_ls=linear_lw=1_aa.png"));

        let reference = FigureKey { kind: SeriesKind::Reference, anti_alias: false, backend: Backend::Plotters, ..key };
        assert_eq!(
            png_path(&paths(), &reference),
            PathBuf::from("/figs/plotters/reference_ecg_50000_ls=linear_lw=1.png")
        );
    }
}
