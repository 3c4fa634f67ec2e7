use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use testenv_core::{Recipe, TestKind};
use testenv_env::copy_dir_recursive;
use tracing::{debug, warn};

/// A generated, runnable test script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestArtifact {
    pub kind: TestKind,
    pub script: PathBuf,
}

/// The scripts generated for one package, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestArtifactSet {
    artifacts: Vec<TestArtifact>,
}

impl TestArtifactSet {
    pub fn new(artifacts: Vec<TestArtifact>) -> Self {
        let mut artifacts = artifacts;
        artifacts.sort_by_key(|artifact| artifact.kind);
        Self { artifacts }
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn get(&self, kind: TestKind) -> Option<&TestArtifact> {
        self.artifacts.iter().find(|artifact| artifact.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TestArtifact> {
        self.artifacts.iter()
    }
}

/// Writes the recipe's tests into `scratch_dir` and reports which scripts exist.
///
/// `test/files` are copied first so generated scripts can use them. Perl
/// packages get a `run_test.pl` instead of a `run_test.py`; every package may
/// get a shell script.
pub fn materialize(recipe: &Recipe, scratch_dir: &Path) -> Result<TestArtifactSet> {
    let metadata = recipe.metadata();
    copy_test_files(recipe, scratch_dir)?;

    if !metadata.test.source_files.is_empty() {
        warn!(
            package = metadata.name(),
            "test/source_files are not available for installed packages; ignored"
        );
    }
    if !metadata.test.requires.is_empty() {
        debug!(
            package = metadata.name(),
            requires = ?metadata.test.requires,
            "test requirements are not installed; relying on the environment"
        );
    }

    let mut artifacts = Vec::new();
    for kind in metadata.ecosystem().test_kinds() {
        let content = match kind {
            TestKind::Python => python_script(recipe)?,
            TestKind::Perl => perl_script(recipe)?,
            TestKind::Shell => shell_script(recipe)?,
        };
        let Some(content) = content else {
            continue;
        };

        let script = scratch_dir.join(kind.script_name());
        fs::write(&script, content)
            .with_context(|| format!("failed to write test script: {}", script.display()))?;
        artifacts.push(TestArtifact { kind, script });
    }

    Ok(TestArtifactSet::new(artifacts))
}

fn copy_test_files(recipe: &Recipe, scratch_dir: &Path) -> Result<()> {
    for entry in &recipe.metadata().test.files {
        let relative = Path::new(entry);
        if relative.is_absolute()
            || relative
                .components()
                .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir))
        {
            anyhow::bail!("test file must be a path inside the recipe: {entry}");
        }

        let source = recipe.dir().join(relative);
        let destination = scratch_dir.join(relative);
        if source.is_dir() {
            copy_dir_recursive(&source, &destination)?;
        } else if source.is_file() {
            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed creating directory {}", parent.display()))?;
            }
            fs::copy(&source, &destination).with_context(|| {
                format!(
                    "failed copying test file from {} to {}",
                    source.display(),
                    destination.display()
                )
            })?;
        } else {
            anyhow::bail!("test file not found in recipe: {}", source.display());
        }
    }
    Ok(())
}

fn read_bundled(recipe: &Recipe, kind: TestKind) -> Result<Option<String>> {
    let Some(path) = recipe.bundled_script(kind.script_name()) else {
        return Ok(None);
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read bundled test script: {}", path.display()))?;
    Ok(Some(content))
}

fn python_script(recipe: &Recipe) -> Result<Option<String>> {
    let metadata = recipe.metadata();
    let bundled = read_bundled(recipe, TestKind::Python)?;
    if metadata.test.imports.is_empty() && bundled.is_none() {
        return Ok(None);
    }

    let dist = metadata.dist();
    let mut script = String::new();
    script.push_str(&format!("# tests for {dist} (this is a generated file)\n"));
    script.push_str("from __future__ import absolute_import, division, print_function\n\n");
    script.push_str(&format!("print('===== testing package: {dist} =====')\n"));
    for name in &metadata.test.imports {
        script.push_str(&format!("print(\"import: '{name}'\")\n"));
        script.push_str(&format!("import {name}\n\n"));
    }
    match bundled {
        Some(content) => {
            script.push_str("print('running run_test.py')\n");
            script.push_str("# --- run_test.py (begin) ---\n");
            script.push_str(&content);
            if !content.ends_with('\n') {
                script.push('\n');
            }
            script.push_str("# --- run_test.py (end) ---\n");
        }
        None => script.push_str("# no run_test.py exists for this package\n"),
    }
    script.push_str(&format!("\nprint('===== {dist} OK =====')\n"));
    Ok(Some(script))
}

fn perl_script(recipe: &Recipe) -> Result<Option<String>> {
    let metadata = recipe.metadata();
    let bundled = read_bundled(recipe, TestKind::Perl)?;
    if metadata.test.imports.is_empty() && bundled.is_none() {
        return Ok(None);
    }

    let dist = metadata.dist();
    let expected_version = metadata.version().trim_end_matches('0');
    let mut script = String::new();
    script.push_str(&format!("# tests for {dist} (this is a generated file)\n"));
    script.push_str(&format!("print(\"===== testing package: {dist} =====\\n\");\n"));
    script.push_str(&format!("my $expected_version = \"{expected_version}\";\n"));
    for name in &metadata.test.imports {
        script.push_str(&format!("print(\"import: {name}\\n\");\n"));
        script.push_str(&format!("use {name};\n\n"));
        // Version checks only make sense for a bare module name.
        if !name.contains(' ') {
            script.push_str(&format!(
                "if (defined {name}->VERSION) {{\n\
                 \tmy $given_version = {name}->VERSION;\n\
                 \t$given_version =~ s/0+$//;\n\
                 \tdie('Expected version ' . $expected_version . ' but found ' . $given_version) \
                 unless ($expected_version eq $given_version);\n\
                 \tprint('\\tusing version ' . {name}->VERSION . \"\\n\");\n\
                 }}\n"
            ));
        }
    }
    match bundled {
        Some(content) => {
            script.push_str("# --- run_test.pl (begin) ---\n");
            script.push_str(&content);
            if !content.ends_with('\n') {
                script.push('\n');
            }
            script.push_str("# --- run_test.pl (end) ---\n");
        }
        None => script.push_str("# no run_test.pl exists for this package\n"),
    }
    script.push_str(&format!("\nprint(\"===== {dist} OK =====\\n\");\n"));
    Ok(Some(script))
}

fn shell_script(recipe: &Recipe) -> Result<Option<String>> {
    let metadata = recipe.metadata();
    let bundled = read_bundled(recipe, TestKind::Shell)?;
    if metadata.test.commands.is_empty() && bundled.is_none() {
        return Ok(None);
    }

    let mut script = bundled.unwrap_or_default();
    script.push_str("\n\n");
    for command in &metadata.test.commands {
        script.push_str(command);
        script.push('\n');
        if cfg!(windows) {
            script.push_str("if errorlevel 1 exit 1\n");
        }
    }
    Ok(Some(script))
}
