use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Paths inside one conda environment (a "prefix").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvLayout {
    prefix: PathBuf,
}

impl EnvLayout {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn conda_meta_dir(&self) -> PathBuf {
        self.prefix.join("conda-meta")
    }

    pub fn record_path(&self, dist: &str) -> PathBuf {
        self.conda_meta_dir().join(format!("{dist}.json"))
    }

    pub fn bin_dir(&self) -> PathBuf {
        if cfg!(windows) {
            self.prefix.join("Scripts")
        } else {
            self.prefix.join("bin")
        }
    }

    pub fn library_bin_dirs(&self) -> Vec<PathBuf> {
        let library = self.prefix.join("Library");
        vec![
            library.join("bin"),
            library.join("usr").join("bin"),
            library.join("mingw-w64").join("bin"),
        ]
    }

    /// Directories to put in front of `PATH` for processes running "inside" the environment,
    /// highest priority first.
    pub fn search_path_dirs(&self, prepend_prefix: bool) -> Vec<PathBuf> {
        if cfg!(windows) {
            // python.exe lives in the prefix root on Windows, so it is always searched.
            let mut dirs = vec![self.prefix.clone(), self.bin_dir()];
            dirs.extend(self.library_bin_dirs());
            return dirs;
        }

        let mut dirs = vec![self.bin_dir()];
        if prepend_prefix {
            dirs.push(self.prefix.clone());
        }
        dirs
    }
}

/// The currently activated environment, as exported by `conda activate`.
pub fn default_env_prefix() -> Result<PathBuf> {
    let prefix = std::env::var("CONDA_PREFIX")
        .context("CONDA_PREFIX is not set; pass -p <prefix> to choose an environment")?;
    Ok(PathBuf::from(prefix))
}
