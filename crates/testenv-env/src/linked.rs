use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

use crate::{EnvLayout, EnvironmentUnavailable};

/// One package linked into an environment, as recorded in `conda-meta/<dist>.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedPackage {
    pub name: String,
    pub version: String,
    pub build: String,
    /// The extracted package in the package cache the files were linked from.
    pub source: PathBuf,
}

impl LinkedPackage {
    pub fn dist(&self) -> String {
        format!("{}-{}-{}", self.name, self.version, self.build)
    }
}

#[derive(Debug, Deserialize)]
struct LinkRecord {
    name: String,
    version: String,
    #[serde(default, alias = "build_string")]
    build: String,
    #[serde(default)]
    link: Option<LinkInfo>,
    #[serde(default)]
    extracted_package_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct LinkInfo {
    #[serde(default)]
    source: Option<PathBuf>,
}

/// Reads every link record of the environment, sorted by package name.
pub fn read_linked_packages(
    layout: &EnvLayout,
) -> Result<Vec<LinkedPackage>, EnvironmentUnavailable> {
    let unavailable = |reason: String| EnvironmentUnavailable::new(layout.prefix(), reason);

    if !layout.prefix().is_dir() {
        return Err(unavailable("prefix does not exist".to_string()));
    }
    let dir = layout.conda_meta_dir();
    if !dir.is_dir() {
        return Err(unavailable(format!(
            "not a conda environment: missing {}",
            dir.display()
        )));
    }

    let mut packages = Vec::new();
    let entries = fs::read_dir(&dir)
        .with_context(|| format!("failed to read link database: {}", dir.display()))
        .map_err(|err| unavailable(format!("{err:#}")))?;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read link database: {}", dir.display()))
            .map_err(|err| unavailable(format!("{err:#}")))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|v| v.to_str()) != Some("json") {
            continue;
        }

        let record = read_link_record(&path).map_err(|err| unavailable(format!("{err:#}")))?;
        match record {
            Some(package) => packages.push(package),
            None => warn!(
                record = %path.display(),
                "link record has no source path; package skipped"
            ),
        }
    }

    packages.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(packages)
}

/// The provenance path of every linked package.
pub fn list_sources(layout: &EnvLayout) -> Result<Vec<PathBuf>, EnvironmentUnavailable> {
    Ok(read_linked_packages(layout)?
        .into_iter()
        .map(|package| package.source)
        .collect())
}

fn read_link_record(path: &std::path::Path) -> Result<Option<LinkedPackage>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read link record: {}", path.display()))?;
    parse_link_record(&raw)
        .with_context(|| format!("failed to parse link record: {}", path.display()))
}

pub(crate) fn parse_link_record(raw: &str) -> Result<Option<LinkedPackage>> {
    let record: LinkRecord = serde_json::from_str(raw).context("invalid link record json")?;
    let source = record
        .link
        .and_then(|link| link.source)
        .or(record.extracted_package_dir)
        .filter(|source| !source.as_os_str().is_empty());

    Ok(source.map(|source| LinkedPackage {
        name: record.name,
        version: record.version,
        build: record.build,
        source,
    }))
}
