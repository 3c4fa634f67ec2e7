use std::path::PathBuf;

use thiserror::Error;

/// The environment's link database could not be inspected; nothing can be tested.
#[derive(Debug, Error)]
#[error("environment unavailable: {} ({reason})", prefix.display())]
pub struct EnvironmentUnavailable {
    pub prefix: PathBuf,
    pub reason: String,
}

impl EnvironmentUnavailable {
    pub fn new(prefix: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            reason: reason.into(),
        }
    }
}
