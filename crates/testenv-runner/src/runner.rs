use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use testenv_core::TestKind;
use testenv_env::ExecutionEnv;
use tracing::{debug, warn};

use crate::process::interpreter_command;
use crate::{Interpreters, TestArtifactSet};

/// Launches a prepared command and waits for it.
pub type Executor<'a> = dyn FnMut(&mut Command) -> io::Result<ExitStatus> + 'a;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactStatus {
    Passed,
    /// The script ran and exited unsuccessfully; `code` is `None` when a signal ended it.
    Failed { code: Option<i32> },
    /// The interpreter could not be started at all.
    NotLaunched { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactOutcome {
    pub kind: TestKind,
    pub script: PathBuf,
    pub status: ArtifactStatus,
}

impl ArtifactOutcome {
    pub fn passed(&self) -> bool {
        self.status == ArtifactStatus::Passed
    }
}

/// Runs every artifact in `artifacts`, one after another, inside `scratch_dir`.
///
/// A failing or unlaunchable script is recorded and the remaining scripts still run.
pub fn run_artifacts(
    artifacts: &TestArtifactSet,
    scratch_dir: &Path,
    env: &ExecutionEnv,
    interpreters: &Interpreters,
) -> Vec<ArtifactOutcome> {
    run_artifacts_with_executor(artifacts, scratch_dir, env, interpreters, &mut |command| {
        command.status()
    })
}

pub fn run_artifacts_with_executor(
    artifacts: &TestArtifactSet,
    scratch_dir: &Path,
    env: &ExecutionEnv,
    interpreters: &Interpreters,
    executor: &mut Executor<'_>,
) -> Vec<ArtifactOutcome> {
    artifacts
        .iter()
        .map(|artifact| {
            let mut command = interpreter_command(artifact, scratch_dir, env, interpreters);
            debug!(kind = artifact.kind.as_str(), command = ?command, "running test script");

            let status = match executor(&mut command) {
                Ok(status) if status.success() => ArtifactStatus::Passed,
                Ok(status) => ArtifactStatus::Failed {
                    code: status.code(),
                },
                Err(err) => {
                    warn!(
                        kind = artifact.kind.as_str(),
                        script = %artifact.script.display(),
                        "failed to launch test script: {err}"
                    );
                    ArtifactStatus::NotLaunched {
                        reason: err.to_string(),
                    }
                }
            };

            ArtifactOutcome {
                kind: artifact.kind,
                script: artifact.script.clone(),
                status,
            }
        })
        .collect()
}
