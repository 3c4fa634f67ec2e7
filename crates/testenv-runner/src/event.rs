use std::path::PathBuf;

use crate::ArtifactOutcome;

/// Progress notifications emitted while an environment's tests run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestEvent {
    PackageStarted {
        name: String,
        dist: String,
        scratch_dir: PathBuf,
    },
    /// Every generated script of the package exited successfully.
    PackagePassed { name: String },
    ArtifactFailed {
        name: String,
        dist: String,
        outcome: ArtifactOutcome,
    },
    /// The package has a recipe but it could not be turned into tests.
    PackageSkipped { source: PathBuf, reason: String },
    CleanupFailed { dir: PathBuf, error: String },
    /// Emitted exactly once, after every package has been handled.
    BatchFinished { report: BatchReport },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub name: String,
    pub dist: String,
    pub outcomes: Vec<ArtifactOutcome>,
}

impl PackageReport {
    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(ArtifactOutcome::passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPackage {
    pub source: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub packages_seen: usize,
    pub without_recipe: usize,
    pub without_tests: usize,
    pub tested: Vec<PackageReport>,
    pub skipped: Vec<SkippedPackage>,
    pub cleanup_failures: Vec<PathBuf>,
    /// Interpreter launches attempted across the whole batch.
    pub invocations: usize,
}

impl BatchReport {
    pub fn passed_count(&self) -> usize {
        self.tested.iter().filter(|report| report.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.tested.len() - self.passed_count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }
}
