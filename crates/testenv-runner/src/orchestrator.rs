use std::path::Path;

use anyhow::{Context, Result};
use testenv_core::{Recipe, RenderConfig, META_YAML};
use testenv_env::{
    authoritative_metadata_path, compose_env, locate_recipe, read_linked_packages,
    with_original_metadata, EnvLayout, EnvironmentUnavailable, ExecutionEnv, LinkedPackage,
};
use tracing::{debug, error, info, warn};

use crate::{
    materialize, run_artifacts_with_executor, BatchReport, Executor, MetadataHandoff,
    PackageReport, SkippedPackage, TestEvent, TestOptions, NUMPY_PLACEHOLDER,
};

const SCRATCH_PREFIX: &str = "conda-testenv-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageTestStatus {
    /// The recipe declares nothing runnable; no interpreter was started.
    NoTests,
    Tested(PackageReport),
}

/// Render inputs for recipes installed in this environment.
///
/// Explicit versions in `options` win; otherwise the environment's own
/// `python` and `numpy` packages decide, and numpy falls back to a placeholder.
pub fn render_config_for(packages: &[LinkedPackage], options: &TestOptions) -> RenderConfig {
    let installed = |name: &str| {
        packages
            .iter()
            .find(|package| package.name == name)
            .map(|package| package.version.clone())
    };

    let mut config = RenderConfig::for_host();
    if let Some(python) = options.python.clone().or_else(|| installed("python")) {
        config = config.with_python(python);
    }
    let numpy = options
        .numpy
        .clone()
        .or_else(|| installed("numpy"))
        .unwrap_or_else(|| NUMPY_PLACEHOLDER.to_string());
    config.with_numpy(numpy)
}

/// `env` plus the variables conda-build exports to a package's test phase.
pub fn package_test_env(env: &ExecutionEnv, layout: &EnvLayout, recipe: &Recipe) -> ExecutionEnv {
    let metadata = recipe.metadata();
    let mut env = env.clone();
    env.set("PREFIX", layout.prefix());
    env.set("CONDA_PREFIX", layout.prefix());
    env.set("PKG_NAME", metadata.name());
    env.set("PKG_VERSION", metadata.version());
    env.set("PKG_BUILDNUM", metadata.build_number());
    env
}

pub fn run_pkg_tests(
    recipe: &Recipe,
    layout: &EnvLayout,
    base_env: &ExecutionEnv,
    options: &TestOptions,
    on_event: &mut dyn FnMut(&TestEvent),
) -> Result<PackageTestStatus> {
    run_pkg_tests_with_executor(
        recipe,
        layout,
        base_env,
        options,
        &mut |command| command.status(),
        on_event,
    )
}

/// Tests one package inside a fresh scratch directory that is removed afterwards,
/// whether or not the tests could be prepared.
pub fn run_pkg_tests_with_executor(
    recipe: &Recipe,
    layout: &EnvLayout,
    base_env: &ExecutionEnv,
    options: &TestOptions,
    executor: &mut Executor<'_>,
    on_event: &mut dyn FnMut(&TestEvent),
) -> Result<PackageTestStatus> {
    let metadata = recipe.metadata();
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    let scratch = match &options.scratch_root {
        Some(root) => builder.tempdir_in(root).with_context(|| {
            format!("failed to create scratch directory in {}", root.display())
        })?,
        None => builder
            .tempdir()
            .context("failed to create scratch directory")?,
    };
    let scratch_dir = scratch.path().to_path_buf();

    on_event(&TestEvent::PackageStarted {
        name: metadata.name().to_string(),
        dist: metadata.dist(),
        scratch_dir: scratch_dir.clone(),
    });

    let status = test_in_scratch(
        recipe,
        layout,
        base_env,
        options,
        &scratch_dir,
        executor,
        on_event,
    );

    if let Err(err) = scratch.close() {
        error!(
            dir = %scratch_dir.display(),
            "failed to remove scratch directory: {err}"
        );
        on_event(&TestEvent::CleanupFailed {
            dir: scratch_dir,
            error: err.to_string(),
        });
    }

    status
}

fn test_in_scratch(
    recipe: &Recipe,
    layout: &EnvLayout,
    base_env: &ExecutionEnv,
    options: &TestOptions,
    scratch_dir: &Path,
    executor: &mut Executor<'_>,
    on_event: &mut dyn FnMut(&TestEvent),
) -> Result<PackageTestStatus> {
    let metadata = recipe.metadata();
    let artifacts = materialize(recipe, scratch_dir)?;
    if artifacts.is_empty() {
        debug!(package = metadata.name(), "recipe declares no tests");
        return Ok(PackageTestStatus::NoTests);
    }

    let env = compose_env(base_env, layout, options.prepend_prefix)?;
    let env = package_test_env(&env, layout, recipe);
    let outcomes =
        run_artifacts_with_executor(&artifacts, scratch_dir, &env, &options.interpreters, executor);

    let report = PackageReport {
        name: metadata.name().to_string(),
        dist: metadata.dist(),
        outcomes,
    };
    for outcome in report.outcomes.iter().filter(|outcome| !outcome.passed()) {
        on_event(&TestEvent::ArtifactFailed {
            name: report.name.clone(),
            dist: report.dist.clone(),
            outcome: outcome.clone(),
        });
    }
    if report.passed() {
        on_event(&TestEvent::PackagePassed {
            name: report.name.clone(),
        });
    }

    Ok(PackageTestStatus::Tested(report))
}

/// Re-runs the bundled tests of every package installed in `layout`.
///
/// Only an unreadable environment is an error. Broken recipes, failing tests
/// and cleanup problems are reported through `on_event` and the returned report.
pub fn run_env_tests(
    layout: &EnvLayout,
    options: &TestOptions,
    on_event: &mut dyn FnMut(&TestEvent),
) -> Result<BatchReport, EnvironmentUnavailable> {
    let base_env = ExecutionEnv::capture();
    run_env_tests_with_executor(
        layout,
        options,
        &base_env,
        &mut |command| command.status(),
        on_event,
    )
}

pub fn run_env_tests_with_executor(
    layout: &EnvLayout,
    options: &TestOptions,
    base_env: &ExecutionEnv,
    executor: &mut Executor<'_>,
    on_event: &mut dyn FnMut(&TestEvent),
) -> Result<BatchReport, EnvironmentUnavailable> {
    let packages = read_linked_packages(layout)?;
    let config = render_config_for(&packages, options);
    info!(
        prefix = %layout.prefix().display(),
        packages = packages.len(),
        "testing environment"
    );

    let mut report = BatchReport {
        packages_seen: packages.len(),
        ..BatchReport::default()
    };

    for package in &packages {
        let Some(recipe_dir) = locate_recipe(&package.source) else {
            debug!(package = %package.dist(), "no bundled recipe; skipping");
            report.without_recipe += 1;
            continue;
        };

        let mut cleanup_failures = Vec::new();
        let mut forward = |event: &TestEvent| {
            if let TestEvent::CleanupFailed { dir, .. } = event {
                cleanup_failures.push(dir.clone());
            }
            on_event(event);
        };

        let status = match options.metadata_handoff {
            MetadataHandoff::InMemory => {
                let metadata_file = authoritative_metadata_path(&recipe_dir);
                Recipe::load(&recipe_dir, &metadata_file, &config).and_then(|recipe| {
                    run_pkg_tests_with_executor(
                        &recipe,
                        layout,
                        base_env,
                        options,
                        executor,
                        &mut forward,
                    )
                })
            }
            MetadataHandoff::Rename => with_original_metadata(&recipe_dir, || {
                let recipe = Recipe::load(&recipe_dir, &recipe_dir.join(META_YAML), &config)?;
                run_pkg_tests_with_executor(
                    &recipe,
                    layout,
                    base_env,
                    options,
                    executor,
                    &mut forward,
                )
            }),
        };

        match status {
            Ok(PackageTestStatus::NoTests) => report.without_tests += 1,
            Ok(PackageTestStatus::Tested(package_report)) => {
                report.invocations += package_report.outcomes.len();
                report.tested.push(package_report);
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(package = %package.dist(), "skipping package: {reason}");
                forward(&TestEvent::PackageSkipped {
                    source: package.source.clone(),
                    reason: reason.clone(),
                });
                report.skipped.push(SkippedPackage {
                    source: package.source.clone(),
                    reason,
                });
            }
        }
        report.cleanup_failures.extend(cleanup_failures);
    }

    on_event(&TestEvent::BatchFinished {
        report: report.clone(),
    });
    Ok(report)
}
