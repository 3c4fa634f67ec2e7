use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use testenv_core::{META_YAML, META_YAML_ORIG};
use tracing::{debug, error};

pub const META_YAML_TMP: &str = "meta.yaml.tmp";

/// The recipe bundled with a package, if the package was built with one.
pub fn locate_recipe(source: &Path) -> Option<PathBuf> {
    let recipe_dir = source.join("info").join("recipe");
    recipe_dir.is_dir().then_some(recipe_dir)
}

/// The file recipe metadata should be read from: the pre-render `meta.yaml.orig`
/// when conda-build kept one, otherwise `meta.yaml`.
pub fn authoritative_metadata_path(recipe_dir: &Path) -> PathBuf {
    let orig = recipe_dir.join(META_YAML_ORIG);
    if orig.is_file() {
        orig
    } else {
        recipe_dir.join(META_YAML)
    }
}

/// Runs `body` with `meta.yaml.orig` temporarily installed as `meta.yaml`.
///
/// Without a `meta.yaml.orig` the body runs against the directory as is.
/// The original names are restored when the body returns `Ok`, returns `Err`
/// or panics.
pub fn with_original_metadata<T, F>(recipe_dir: &Path, body: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let Some(overlay) = MetadataOverlay::engage(recipe_dir)? else {
        return body();
    };

    let outcome = body();
    let restored = overlay.restore();
    match (outcome, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(restore_err)) => {
            error!(
                recipe = %recipe_dir.display(),
                "failed to restore recipe metadata: {restore_err:#}"
            );
            Err(err)
        }
    }
}

/// An engaged `meta.yaml.orig` -> `meta.yaml` swap.
///
/// Entry renames `meta.yaml` -> `meta.yaml.tmp` then `meta.yaml.orig` -> `meta.yaml`;
/// [`MetadataOverlay::restore`] (or drop) applies the inverse in reverse order.
#[derive(Debug)]
pub struct MetadataOverlay {
    meta: PathBuf,
    orig: PathBuf,
    tmp: PathBuf,
    engaged: bool,
}

impl MetadataOverlay {
    /// Returns `None` when the recipe has no `meta.yaml.orig` to swap in.
    pub fn engage(recipe_dir: &Path) -> Result<Option<Self>> {
        let meta = recipe_dir.join(META_YAML);
        let orig = recipe_dir.join(META_YAML_ORIG);
        let tmp = recipe_dir.join(META_YAML_TMP);

        if !orig.exists() {
            return Ok(None);
        }

        fs::rename(&meta, &tmp).with_context(|| {
            format!(
                "failed to move {} aside to {}",
                meta.display(),
                tmp.display()
            )
        })?;
        if let Err(err) = fs::rename(&orig, &meta) {
            if let Err(rollback_err) = fs::rename(&tmp, &meta) {
                error!(
                    recipe = %recipe_dir.display(),
                    "failed to move {} back to {}: {rollback_err}",
                    tmp.display(),
                    meta.display()
                );
            }
            return Err(err).with_context(|| {
                format!(
                    "failed to install {} as {}",
                    orig.display(),
                    meta.display()
                )
            });
        }
        debug!(recipe = %recipe_dir.display(), "using meta.yaml.orig for recipe metadata");

        Ok(Some(Self {
            meta,
            orig,
            tmp,
            engaged: true,
        }))
    }

    pub fn restore(mut self) -> Result<()> {
        self.engaged = false;
        restore_names(&self.meta, &self.orig, &self.tmp)
    }
}

impl Drop for MetadataOverlay {
    fn drop(&mut self) {
        if !self.engaged {
            return;
        }
        if let Err(err) = restore_names(&self.meta, &self.orig, &self.tmp) {
            error!("failed to restore recipe metadata: {err:#}");
        }
    }
}

fn restore_names(meta: &Path, orig: &Path, tmp: &Path) -> Result<()> {
    fs::rename(meta, orig).with_context(|| {
        format!("failed to move {} back to {}", meta.display(), orig.display())
    })?;
    fs::rename(tmp, meta)
        .with_context(|| format!("failed to move {} back to {}", tmp.display(), meta.display()))
}
