use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use testenv_core::TestKind;
use testenv_env::{ExecutionEnv, PATH_VAR};
use tracing::debug;

use crate::{Interpreters, TestArtifact};

/// Builds the child process for one artifact, with `env` as its complete environment.
pub(crate) fn interpreter_command(
    artifact: &TestArtifact,
    scratch_dir: &Path,
    env: &ExecutionEnv,
    interpreters: &Interpreters,
) -> Command {
    let mut command = match artifact.kind {
        TestKind::Python => {
            let mut command = Command::new(resolve_program(&interpreters.python, env, scratch_dir));
            command.arg("-s").arg(&artifact.script);
            command
        }
        TestKind::Perl => {
            let mut command = Command::new(resolve_program(&interpreters.perl, env, scratch_dir));
            command.arg(&artifact.script);
            command
        }
        TestKind::Shell => shell_command(&artifact.script, env),
    };

    command
        .current_dir(scratch_dir)
        .env_clear()
        .envs(env.iter());
    command
}

#[cfg(windows)]
fn shell_command(script: &Path, env: &ExecutionEnv) -> Command {
    let comspec = env
        .get("COMSPEC")
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("cmd.exe"));
    let mut command = Command::new(comspec);
    command.arg("/c").arg("call").arg(script);
    command
}

#[cfg(not(windows))]
fn shell_command(script: &Path, _env: &ExecutionEnv) -> Command {
    let mut command = Command::new("/bin/bash");
    command.arg("-x").arg("-e").arg(script);
    command
}

/// Looks `program` up on the composed `PATH` rather than the parent's, so the
/// environment's own interpreter wins.
fn resolve_program(program: &str, env: &ExecutionEnv, scratch_dir: &Path) -> PathBuf {
    let search_path = env.get(PATH_VAR).map(OsString::from);
    match which::which_in(program, search_path, scratch_dir) {
        Ok(path) => path,
        Err(err) => {
            debug!(program, "interpreter not found on composed PATH: {err}");
            PathBuf::from(program)
        }
    }
}
