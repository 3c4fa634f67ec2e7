use std::path::PathBuf;

use serde::Deserialize;

/// Numpy version handed to the renderer when neither the environment nor the
/// configuration names one, so `numpy x.x` pins still parse.
pub const NUMPY_PLACEHOLDER: &str = "0";

/// How recipe metadata reaches the parser when a recipe ships `meta.yaml.orig`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataHandoff {
    /// Read `meta.yaml.orig` (or `meta.yaml`) directly; the recipe directory is never touched.
    #[default]
    InMemory,
    /// Swap `meta.yaml.orig` into place for the duration of the package's test run.
    Rename,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Interpreters {
    pub python: String,
    pub perl: String,
}

impl Default for Interpreters {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            perl: "perl".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestOptions {
    pub metadata_handoff: MetadataHandoff,
    pub prepend_prefix: bool,
    /// Parent directory for per-package scratch directories; the system temp dir when unset.
    pub scratch_root: Option<PathBuf>,
    pub python: Option<String>,
    pub numpy: Option<String>,
    pub interpreters: Interpreters,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            metadata_handoff: MetadataHandoff::default(),
            prepend_prefix: true,
            scratch_root: None,
            python: None,
            numpy: None,
            interpreters: Interpreters::default(),
        }
    }
}
