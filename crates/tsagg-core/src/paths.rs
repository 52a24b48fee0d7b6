// File: crates/tsagg-core/src/paths.rs
// Summary: Dataset/figure root directories, resolved once per process from the machine hostname.

use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};

/// Storage roots for one execution environment. Built once at startup and
/// handed to whatever needs a location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathConfig {
    /// Root of the raw datasets.
    pub dataset_dir: PathBuf,
    /// Root of cached series, figures and result tables.
    pub figure_root: PathBuf,
}

/// Hosts with a known storage layout.
const KNOWN_HOSTS: &[(&str, &str, &str)] = &[
    ("gecko", "/media/m4_datasets/datasets", "/media/tsagg_figs"),
];

impl PathConfig {
    pub fn new(dataset_dir: impl Into<PathBuf>, figure_root: impl Into<PathBuf>) -> Self {
        let dataset_dir = dataset_dir.into();
        Self {
            dataset_dir,
            figure_root: figure_root.into(),
        }
    }

    /// Layout for a named host.
    pub fn for_hostname(hostname: &str) -> Result<Self> {
        KNOWN_HOSTS
            .iter()
            .find(|(name, _, _)| *name == hostname)
            .map(|(_, data, figs)| Self::new(data, figs))
            .ok_or_else(|| Error::UnknownEnvironment(hostname.to_string()))
    }

    /// Layout for the machine this process runs on.
    pub fn detect() -> Result<Self> {
        let hostname = hostname()?;
        debug!("resolving storage roots for host `{hostname}`");
        Self::for_hostname(&hostname)
    }

    pub fn data_dir(&self) -> PathBuf { self.figure_root.join("data") }

    pub fn figure_dir(&self, backend: &str) -> PathBuf { self.figure_root.join(backend) }

    pub fn results_path(&self) -> PathBuf { self.figure_root.join("results.csv") }

    /// Relative dataset names resolve against `dataset_dir`.
    pub fn dataset(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        if name.is_absolute() { name.to_path_buf() } else { self.dataset_dir.join(name) }
    }
}

fn hostname() -> Result<String> {
    let name = match std::fs::read_to_string("/proc/sys/kernel/hostname") {
        Ok(s) => s.trim().to_string(),
        Err(_) => std::env::var("HOSTNAME").unwrap_or_default(),
    };
    if name.is_empty() {
        return Err(Error::UnknownEnvironment("<unavailable>".to_string()));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_host_layout() {
        let cfg = PathConfig::for_hostname("gecko").unwrap();
        assert_eq!(cfg.dataset("ecg.csv"), PathBuf::from("/media/m4_datasets/datasets/ecg.csv"));
        assert_eq!(cfg.dataset("/tmp/ecg.csv"), PathBuf::from("/tmp/ecg.csv"));
        assert_eq!(cfg.data_dir(), PathBuf::from("/media/tsagg_figs/data"));
        assert_eq!(cfg.figure_dir("skia"), PathBuf::from("/media/tsagg_figs/skia"));
    }

    #[test]
    fn unknown_host_is_an_error() {
        let err = PathConfig::for_hostname("laptop-42").unwrap_err();
        assert!(matches!(err, Error::UnknownEnvironment(h) if h == "laptop-42"));
    }
}
