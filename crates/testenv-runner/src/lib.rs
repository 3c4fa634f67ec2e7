mod event;
mod materialize;
mod options;
mod orchestrator;
mod process;
mod runner;

pub use event::{BatchReport, PackageReport, SkippedPackage, TestEvent};
pub use materialize::{materialize, TestArtifact, TestArtifactSet};
pub use options::{Interpreters, MetadataHandoff, TestOptions, NUMPY_PLACEHOLDER};
pub use orchestrator::{
    package_test_env, render_config_for, run_env_tests, run_env_tests_with_executor,
    run_pkg_tests, run_pkg_tests_with_executor, PackageTestStatus,
};
pub use runner::{
    run_artifacts, run_artifacts_with_executor, ArtifactOutcome, ArtifactStatus, Executor,
};

#[cfg(test)]
mod tests;
