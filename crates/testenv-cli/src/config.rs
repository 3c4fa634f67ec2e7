use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use testenv_runner::{BatchReport, TestOptions};

/// What the process exit status says about test failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitPolicy {
    /// Failing package tests are reported but the run still exits 0.
    #[default]
    AlwaysZero,
    FailOnTestFailure,
}

impl ExitPolicy {
    pub fn exit_code(self, report: &BatchReport) -> u8 {
        match self {
            Self::AlwaysZero => 0,
            Self::FailOnTestFailure if report.has_failures() => 1,
            Self::FailOnTestFailure => 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestenvConfig {
    #[serde(flatten)]
    pub options: TestOptions,
    pub exit_policy: ExitPolicy,
}

impl TestenvConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("failed to parse config: {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid config toml")
    }

    /// `CONDA_PY`/`CONDA_NPY` take precedence over the file, as they do for conda-build.
    pub fn apply_env_overrides(&mut self, python: Option<String>, numpy: Option<String>) {
        if let Some(python) = python.filter(|value| !value.trim().is_empty()) {
            self.options.python = Some(python.trim().to_string());
        }
        if let Some(numpy) = numpy.filter(|value| !value.trim().is_empty()) {
            self.options.numpy = Some(numpy.trim().to_string());
        }
    }
}
