use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::EnvLayout;

pub const PATH_VAR: &str = "PATH";

/// An owned set of environment variables for a child process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionEnv {
    vars: BTreeMap<OsString, OsString>,
}

impl ExecutionEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current process environment.
    pub fn capture() -> Self {
        std::env::vars_os().collect()
    }

    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        let key = self.resolve_key(key.as_ref());
        self.vars.get(&key).map(OsString::as_os_str)
    }

    pub fn set(&mut self, key: impl AsRef<OsStr>, value: impl Into<OsString>) {
        let key = self.resolve_key(key.as_ref());
        self.vars.insert(key, value.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .map(|(key, value)| (key.as_os_str(), value.as_os_str()))
    }

    /// The `PATH` entries, in search order.
    pub fn search_path(&self) -> Vec<PathBuf> {
        self.get(PATH_VAR)
            .map(|value| std::env::split_paths(value).collect())
            .unwrap_or_default()
    }

    /// Windows treats variable names case-insensitively, so `Path` and `PATH` are one variable.
    fn resolve_key(&self, key: &OsStr) -> OsString {
        if cfg!(windows) {
            let wanted = key.to_string_lossy().to_ascii_uppercase();
            if let Some(existing) = self
                .vars
                .keys()
                .find(|existing| existing.to_string_lossy().to_ascii_uppercase() == wanted)
            {
                return existing.clone();
            }
        }
        key.to_os_string()
    }
}

impl FromIterator<(OsString, OsString)> for ExecutionEnv {
    fn from_iter<I: IntoIterator<Item = (OsString, OsString)>>(iter: I) -> Self {
        let mut env = Self::new();
        for (key, value) in iter {
            env.set(key, value);
        }
        env
    }
}

/// `base` with the environment's binary directories placed at the front of `PATH`.
pub fn compose_env(
    base: &ExecutionEnv,
    layout: &EnvLayout,
    prepend_prefix: bool,
) -> Result<ExecutionEnv> {
    let mut entries = layout.search_path_dirs(prepend_prefix);
    entries.extend(base.search_path());

    let joined = std::env::join_paths(&entries).with_context(|| {
        format!(
            "environment path cannot be placed on {PATH_VAR}: {}",
            layout.prefix().display()
        )
    })?;

    let mut env = base.clone();
    env.set(PATH_VAR, joined);
    Ok(env)
}
