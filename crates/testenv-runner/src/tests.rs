use super::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use testenv_core::{
    HostArch, HostOs, HostPlatform, Recipe, RenderConfig, TestKind, META_YAML, META_YAML_ORIG,
};
use testenv_env::{EnvLayout, ExecutionEnv, LinkedPackage, PATH_VAR};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn test_dir(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let seq = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "testenv-runner-{label}-{}-{nanos}-{seq}",
        std::process::id()
    ))
}

fn linux_config() -> RenderConfig {
    RenderConfig::new(HostPlatform::new(HostOs::Linux, HostArch::X86_64))
        .with_python("3.5")
        .with_numpy("1.11")
}

fn recipe_from(dir: &Path, meta: &str) -> Recipe {
    fs::create_dir_all(dir).expect("must create recipe dir");
    fs::write(dir.join(META_YAML), meta).expect("must write meta.yaml");
    Recipe::load(dir, &dir.join(META_YAML), &linux_config()).expect("recipe must parse")
}

struct Fixture {
    root: PathBuf,
    layout: EnvLayout,
    pkgs: PathBuf,
    scratch_root: PathBuf,
}

impl Fixture {
    fn new(label: &str) -> Self {
        let root = test_dir(label);
        let layout = EnvLayout::new(root.join("env"));
        fs::create_dir_all(layout.conda_meta_dir()).expect("must create conda-meta");
        fs::create_dir_all(layout.bin_dir()).expect("must create bin");
        let pkgs = root.join("pkgs");
        let scratch_root = root.join("scratch");
        fs::create_dir_all(&scratch_root).expect("must create scratch root");
        Self {
            root,
            layout,
            pkgs,
            scratch_root,
        }
    }

    fn options(&self) -> TestOptions {
        TestOptions {
            scratch_root: Some(self.scratch_root.clone()),
            ..TestOptions::default()
        }
    }

    /// Links `name` into the environment; `meta` of `None` means the package ships no recipe.
    fn add_package(&self, name: &str, version: &str, meta: Option<&str>) -> PathBuf {
        let dist = format!("{name}-{version}-0");
        let source = self.pkgs.join(&dist);
        fs::create_dir_all(source.join("info")).expect("must create info");
        if let Some(meta) = meta {
            let recipe = source.join("info").join("recipe");
            fs::create_dir_all(&recipe).expect("must create recipe");
            fs::write(recipe.join(META_YAML), meta).expect("must write meta.yaml");
        }
        let record = serde_json::json!({
            "name": name,
            "version": version,
            "build": "0",
            "link": { "source": source, "type": 1 },
        });
        fs::write(self.layout.record_path(&dist), record.to_string()).expect("must write record");
        source.join("info").join("recipe")
    }

    fn scratch_entries(&self) -> usize {
        fs::read_dir(&self.scratch_root)
            .expect("must read scratch root")
            .count()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

fn shell_meta(name: &str, command: &str) -> String {
    format!("package:\n  name: {name}\n  version: 1.0\ntest:\n  commands:\n    - {command}\n")
}

#[cfg(unix)]
fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[test]
fn materialize_python_imports_and_commands() {
    let dir = test_dir("py");
    let recipe = recipe_from(
        &dir.join("recipe"),
        "package:\n  name: b\n  version: 1.0\ntest:\n  imports:\n    - b\n    - b.sub\n  commands:\n    - echo \"hello from b\"\n",
    );
    let scratch = dir.join("scratch");
    fs::create_dir_all(&scratch).expect("must create scratch");

    let artifacts = materialize(&recipe, &scratch).expect("must materialize");
    assert_eq!(artifacts.len(), 2);
    let kinds = artifacts.iter().map(|artifact| artifact.kind).collect::<Vec<_>>();
    assert_eq!(kinds, vec![TestKind::Python, TestKind::Shell]);

    let python = fs::read_to_string(&artifacts.get(TestKind::Python).expect("python").script)
        .expect("must read python script");
    assert!(python.contains("# tests for b-1.0-0 (this is a generated file)"));
    assert!(python.contains("import b\n"));
    assert!(python.contains("import b.sub\n"));
    assert!(python.contains("# no run_test.py exists for this package"));
    assert!(python.trim_end().ends_with("print('===== b-1.0-0 OK =====')"));

    let shell = fs::read_to_string(&artifacts.get(TestKind::Shell).expect("shell").script)
        .expect("must read shell script");
    assert!(shell.contains("echo \"hello from b\"\n"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn materialize_perl_package_gets_perl_script() {
    let dir = test_dir("pl");
    let recipe = recipe_from(
        &dir.join("recipe"),
        "package:\n  name: perl-json\n  version: 2.90\ntest:\n  imports:\n    - JSON\n",
    );
    let scratch = dir.join("scratch");
    fs::create_dir_all(&scratch).expect("must create scratch");

    let artifacts = materialize(&recipe, &scratch).expect("must materialize");
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts.get(TestKind::Python).is_none());
    let perl = fs::read_to_string(&artifacts.get(TestKind::Perl).expect("perl").script)
        .expect("must read perl script");
    assert!(perl.contains("use JSON;"));
    assert!(perl.contains("my $expected_version = \"2.9\";"));
    assert!(!scratch.join("run_test.py").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn materialize_includes_bundled_scripts_and_test_files() {
    let dir = test_dir("bundled");
    let recipe_dir = dir.join("recipe");
    fs::create_dir_all(recipe_dir.join("data").join("nested")).expect("must create data");
    fs::write(recipe_dir.join("data").join("nested").join("x.txt"), "x").expect("must write x");
    fs::write(recipe_dir.join("input.csv"), "a,b\n").expect("must write input");
    fs::write(recipe_dir.join("run_test.py"), "print('bundled python')").expect("must write py");
    fs::write(recipe_dir.join("run_test.sh"), "echo bundled shell\n").expect("must write sh");
    let recipe = recipe_from(
        &recipe_dir,
        "package:\n  name: c\n  version: 2.0\ntest:\n  files:\n    - data\n    - input.csv\n  commands: echo after\n",
    );
    let scratch = dir.join("scratch");
    fs::create_dir_all(&scratch).expect("must create scratch");

    let artifacts = materialize(&recipe, &scratch).expect("must materialize");
    assert_eq!(artifacts.len(), 2);
    assert_eq!(
        fs::read_to_string(scratch.join("data").join("nested").join("x.txt")).expect("copied dir"),
        "x"
    );
    assert_eq!(
        fs::read_to_string(scratch.join("input.csv")).expect("copied file"),
        "a,b\n"
    );

    let python = fs::read_to_string(scratch.join("run_test.py")).expect("python script");
    let begin = python.find("# --- run_test.py (begin) ---").expect("begin marker");
    let bundled = python.find("print('bundled python')").expect("bundled body");
    let end = python.find("# --- run_test.py (end) ---").expect("end marker");
    assert!(begin < bundled && bundled < end);

    let shell = fs::read_to_string(scratch.join(TestKind::Shell.script_name())).expect("shell");
    assert!(shell.starts_with("echo bundled shell\n"));
    assert!(shell.find("echo bundled shell") < shell.find("echo after"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn materialize_without_tests_is_empty() {
    let dir = test_dir("empty");
    let recipe = recipe_from(&dir.join("recipe"), "package:\n  name: a\n  version: 1.0\n");
    let scratch = dir.join("scratch");
    fs::create_dir_all(&scratch).expect("must create scratch");

    let artifacts = materialize(&recipe, &scratch).expect("must materialize");
    assert!(artifacts.is_empty());
    assert_eq!(fs::read_dir(&scratch).expect("read scratch").count(), 0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn materialize_rejects_test_files_outside_recipe() {
    let dir = test_dir("escape");
    let recipe = recipe_from(
        &dir.join("recipe"),
        "package:\n  name: a\n  version: 1.0\ntest:\n  files:\n    - ../secret\n  commands:\n    - true\n",
    );
    let scratch = dir.join("scratch");
    fs::create_dir_all(&scratch).expect("must create scratch");

    let err = materialize(&recipe, &scratch).expect_err("escaping path must fail");
    assert!(err.to_string().contains("inside the recipe"), "unexpected error: {err}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_options_deserialize_from_toml() {
    let options: TestOptions = toml::from_str(
        r#"
metadata_handoff = "rename"
prepend_prefix = false
numpy = "1.11"

[interpreters]
python = "/opt/python3"
"#,
    )
    .expect("must parse options");
    assert_eq!(options.metadata_handoff, MetadataHandoff::Rename);
    assert!(!options.prepend_prefix);
    assert_eq!(options.numpy.as_deref(), Some("1.11"));
    assert_eq!(options.interpreters.python, "/opt/python3");
    assert_eq!(options.interpreters.perl, "perl");

    let defaults: TestOptions = toml::from_str("").expect("must parse empty options");
    assert_eq!(defaults, TestOptions::default());
    assert!(defaults.prepend_prefix);
}

#[test]
fn render_config_uses_environment_versions_and_numpy_placeholder() {
    let linked = |name: &str, version: &str| LinkedPackage {
        name: name.to_string(),
        version: version.to_string(),
        build: "0".to_string(),
        source: PathBuf::from("/pkgs").join(name),
    };
    let packages = vec![linked("python", "3.5.2"), linked("zlib", "1.2.8")];

    let config = render_config_for(&packages, &TestOptions::default());
    assert_eq!(config.python.as_deref(), Some("3.5.2"));
    assert_eq!(config.numpy.as_deref(), Some(NUMPY_PLACEHOLDER));

    let options = TestOptions {
        python: Some("2.7".to_string()),
        numpy: Some("1.9".to_string()),
        ..TestOptions::default()
    };
    let config = render_config_for(&packages, &options);
    assert_eq!(config.python.as_deref(), Some("2.7"));
    assert_eq!(config.numpy.as_deref(), Some("1.9"));
}

#[test]
fn package_test_env_exports_package_variables() {
    let dir = test_dir("vars");
    let recipe = recipe_from(
        &dir.join("recipe"),
        "package:\n  name: b\n  version: 1.0\nbuild:\n  number: 3\n",
    );
    let layout = EnvLayout::new("/envs/demo");

    let env = package_test_env(&ExecutionEnv::new(), &layout, &recipe);
    assert_eq!(env.get("PREFIX"), Some(Path::new("/envs/demo").as_os_str()));
    assert_eq!(env.get("PKG_NAME").and_then(|v| v.to_str()), Some("b"));
    assert_eq!(env.get("PKG_VERSION").and_then(|v| v.to_str()), Some("1.0"));
    assert_eq!(env.get("PKG_BUILDNUM").and_then(|v| v.to_str()), Some("3"));

    let _ = fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn run_artifacts_records_failures_and_keeps_going() {
    let dir = test_dir("artifacts");
    let recipe = recipe_from(
        &dir.join("recipe"),
        "package:\n  name: b\n  version: 1.0\ntest:\n  imports:\n    - b\n  commands:\n    - true\n",
    );
    let scratch = dir.join("scratch");
    fs::create_dir_all(&scratch).expect("must create scratch");
    let artifacts = materialize(&recipe, &scratch).expect("must materialize");

    let mut programs = Vec::new();
    let outcomes = run_artifacts_with_executor(
        &artifacts,
        &scratch,
        &ExecutionEnv::new(),
        &Interpreters::default(),
        &mut |command| {
            programs.push(command.get_program().to_string_lossy().to_string());
            assert_eq!(command.get_current_dir(), Some(scratch.as_path()));
            if programs.len() == 1 {
                Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no python"))
            } else {
                Ok(exit_status(0))
            }
        },
    );

    assert_eq!(programs, vec!["python".to_string(), "/bin/bash".to_string()]);
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        outcomes[0].status,
        ArtifactStatus::NotLaunched { .. }
    ));
    assert!(outcomes[1].passed());

    let _ = fs::remove_dir_all(&dir);
}

#[cfg(unix)]
#[test]
fn run_artifacts_reports_real_shell_exit_code() {
    let dir = test_dir("bash");
    let recipe_dir = dir.join("recipe");
    fs::create_dir_all(&recipe_dir).expect("must create recipe dir");
    fs::write(recipe_dir.join("marker.txt"), "").expect("must write marker");
    let recipe = recipe_from(
        &recipe_dir,
        "package:\n  name: b\n  version: 1.0\ntest:\n  files:\n    - marker.txt\n  commands:\n    - test -f marker.txt\n    - exit 3\n",
    );
    let scratch = dir.join("scratch");
    fs::create_dir_all(&scratch).expect("must create scratch");
    let artifacts = materialize(&recipe, &scratch).expect("must materialize");

    let outcomes = run_artifacts(
        &artifacts,
        &scratch,
        &ExecutionEnv::capture(),
        &Interpreters::default(),
    );
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].status, ArtifactStatus::Failed { code: Some(3) });

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn empty_environment_runs_nothing_and_finishes_once() {
    let fixture = Fixture::new("zero");
    let mut events = Vec::new();
    let report = run_env_tests_with_executor(
        &fixture.layout,
        &fixture.options(),
        &ExecutionEnv::new(),
        &mut |_command| panic!("no interpreter may start"),
        &mut |event| events.push(event.clone()),
    )
    .expect("environment must be readable");

    assert_eq!(report.packages_seen, 0);
    assert_eq!(report.invocations, 0);
    assert_eq!(events, vec![TestEvent::BatchFinished { report }]);
}

#[test]
fn package_without_recipe_gets_no_scratch_dir() {
    let fixture = Fixture::new("norecipe");
    fixture.add_package("a", "1.0", None);

    let mut events = Vec::new();
    let report = run_env_tests_with_executor(
        &fixture.layout,
        &fixture.options(),
        &ExecutionEnv::new(),
        &mut |_command| panic!("no interpreter may start"),
        &mut |event| events.push(event.clone()),
    )
    .expect("environment must be readable");

    assert_eq!(report.without_recipe, 1);
    assert!(report.tested.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(events.len(), 1);
    assert_eq!(fixture.scratch_entries(), 0);
}

#[cfg(unix)]
#[test]
fn scratch_dir_is_removed_after_tests_run() {
    let fixture = Fixture::new("cleanup");
    fixture.add_package("b", "1.0", Some(&shell_meta("b", "echo hello from b")));

    let mut seen_scripts = Vec::new();
    let mut events = Vec::new();
    let report = run_env_tests_with_executor(
        &fixture.layout,
        &fixture.options(),
        &ExecutionEnv::new(),
        &mut |command| {
            let script = command
                .get_args()
                .last()
                .map(PathBuf::from)
                .expect("script argument");
            assert!(script.is_file(), "script must exist while running");
            seen_scripts.push(script);
            Ok(exit_status(0))
        },
        &mut |event| events.push(event.clone()),
    )
    .expect("environment must be readable");

    assert_eq!(report.invocations, 1);
    assert_eq!(report.passed_count(), 1);
    assert!(!seen_scripts[0].exists());
    assert_eq!(fixture.scratch_entries(), 0);
    assert!(events.contains(&TestEvent::PackagePassed {
        name: "b".to_string()
    }));
    assert!(events
        .iter()
        .any(|event| matches!(event, TestEvent::PackageStarted { dist, .. } if dist == "b-1.0-0")));
}

#[test]
fn scratch_dir_is_removed_when_materialization_fails() {
    let fixture = Fixture::new("matfail");
    fixture.add_package(
        "a",
        "1.0",
        Some("package:\n  name: a\n  version: 1.0\ntest:\n  files:\n    - missing.txt\n  commands:\n    - true\n"),
    );

    let mut events = Vec::new();
    let report = run_env_tests_with_executor(
        &fixture.layout,
        &fixture.options(),
        &ExecutionEnv::new(),
        &mut |_command| panic!("no interpreter may start"),
        &mut |event| events.push(event.clone()),
    )
    .expect("environment must be readable");

    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("test file not found"));
    assert_eq!(fixture.scratch_entries(), 0);
    assert!(events
        .iter()
        .any(|event| matches!(event, TestEvent::PackageSkipped { .. })));
    assert!(matches!(
        events.last(),
        Some(TestEvent::BatchFinished { .. })
    ));
}

#[test]
fn unparseable_recipe_is_skipped_with_reason() {
    let fixture = Fixture::new("badyaml");
    fixture.add_package("a", "1.0", Some("package: [unterminated\n"));
    fixture.add_package("b", "1.0", None);

    let report = run_env_tests_with_executor(
        &fixture.layout,
        &fixture.options(),
        &ExecutionEnv::new(),
        &mut |_command| panic!("no interpreter may start"),
        &mut |_event| {},
    )
    .expect("environment must be readable");

    assert_eq!(report.packages_seen, 2);
    assert_eq!(report.without_recipe, 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].reason.contains("failed to parse recipe metadata"));
    assert!(!report.has_failures());
}

#[cfg(unix)]
#[test]
fn failing_package_does_not_stop_the_next_one() {
    let fixture = Fixture::new("isolation");
    fixture.add_package("a", "1.0", Some(&shell_meta("a", "exit 1")));
    fixture.add_package("b", "1.0", Some(&shell_meta("b", "echo hello from b")));

    let mut calls = 0;
    let mut events = Vec::new();
    let report = run_env_tests_with_executor(
        &fixture.layout,
        &fixture.options(),
        &ExecutionEnv::new(),
        &mut |_command| {
            calls += 1;
            Ok(exit_status(if calls == 1 { 1 } else { 0 }))
        },
        &mut |event| events.push(event.clone()),
    )
    .expect("environment must be readable");

    assert_eq!(calls, 2);
    assert_eq!(report.tested.len(), 2);
    assert!(!report.tested[0].passed());
    assert!(report.tested[1].passed());
    assert_eq!(report.failed_count(), 1);
    assert!(report.has_failures());

    let failed = events
        .iter()
        .find_map(|event| match event {
            TestEvent::ArtifactFailed { name, outcome, .. } => {
                Some((name.clone(), outcome.clone()))
            }
            _ => None,
        })
        .expect("failure event");
    assert_eq!(failed.0, "a");
    assert_eq!(failed.1.kind, TestKind::Shell);
    assert_eq!(failed.1.status, ArtifactStatus::Failed { code: Some(1) });
    assert!(events.contains(&TestEvent::PackagePassed {
        name: "b".to_string()
    }));
    assert!(!events.contains(&TestEvent::PackagePassed {
        name: "a".to_string()
    }));
}

#[cfg(unix)]
#[test]
fn cleanup_failure_is_reported_and_next_package_still_runs() {
    let fixture = Fixture::new("cleanupfail");
    fixture.add_package("a", "1.0", Some(&shell_meta("a", "true")));
    fixture.add_package("b", "1.0", Some(&shell_meta("b", "true")));

    let mut calls = 0;
    let mut events = Vec::new();
    let report = run_env_tests_with_executor(
        &fixture.layout,
        &fixture.options(),
        &ExecutionEnv::new(),
        &mut |command| {
            calls += 1;
            if calls == 1 {
                let scratch = command.get_current_dir().expect("scratch dir");
                fs::remove_dir_all(scratch).expect("must remove scratch dir");
            }
            Ok(exit_status(0))
        },
        &mut |event| events.push(event.clone()),
    )
    .expect("environment must be readable");

    assert_eq!(calls, 2);
    assert_eq!(report.tested.len(), 2);
    assert_eq!(report.passed_count(), 2);
    assert_eq!(report.cleanup_failures.len(), 1);

    let cleanup_events = events
        .iter()
        .filter_map(|event| match event {
            TestEvent::CleanupFailed { dir, .. } => Some(dir.clone()),
            _ => None,
        })
        .collect::<Vec<_>>();
    assert_eq!(cleanup_events, report.cleanup_failures);
    assert!(cleanup_events[0].starts_with(&fixture.scratch_root));
    assert!(events.contains(&TestEvent::PackagePassed {
        name: "b".to_string()
    }));
    assert!(matches!(
        events.last(),
        Some(TestEvent::BatchFinished { .. })
    ));
}

#[cfg(unix)]
#[test]
fn test_processes_see_environment_bin_dir_first() {
    let fixture = Fixture::new("path");
    fixture.add_package("b", "1.0", Some(&shell_meta("b", "true")));
    let mut base = ExecutionEnv::new();
    base.set(PATH_VAR, "/usr/bin:/bin");

    let mut paths = Vec::new();
    run_env_tests_with_executor(
        &fixture.layout,
        &fixture.options(),
        &base,
        &mut |command| {
            let path = command
                .get_envs()
                .find(|(key, _)| *key == PATH_VAR)
                .and_then(|(_, value)| value)
                .map(std::env::split_paths)
                .expect("PATH must be set")
                .collect::<Vec<_>>();
            paths.push(path);
            Ok(exit_status(0))
        },
        &mut |_event| {},
    )
    .expect("environment must be readable");

    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0][0], fixture.layout.bin_dir());
    assert_eq!(paths[0].last(), Some(&PathBuf::from("/bin")));
    assert_eq!(base.get(PATH_VAR).and_then(|v| v.to_str()), Some("/usr/bin:/bin"));
}

#[cfg(unix)]
#[test]
fn in_memory_handoff_reads_original_metadata_without_renaming() {
    let fixture = Fixture::new("inmemory");
    let recipe_dir = fixture.add_package("b", "1.0", Some("package:\n  name: b\n  version: 1.0\n"));
    fs::write(recipe_dir.join(META_YAML_ORIG), shell_meta("b", "echo from orig"))
        .expect("must write orig");
    let before = fs::read_dir(&recipe_dir).expect("read recipe").count();

    let mut calls = 0;
    let report = run_env_tests_with_executor(
        &fixture.layout,
        &fixture.options(),
        &ExecutionEnv::new(),
        &mut |_command| {
            assert!(recipe_dir.join(META_YAML_ORIG).is_file());
            calls += 1;
            Ok(exit_status(0))
        },
        &mut |_event| {},
    )
    .expect("environment must be readable");

    assert_eq!(calls, 1);
    assert_eq!(report.passed_count(), 1);
    assert_eq!(fs::read_dir(&recipe_dir).expect("read recipe").count(), before);
}

#[cfg(unix)]
#[test]
fn rename_handoff_restores_recipe_files() {
    let fixture = Fixture::new("rename");
    let rendered = "package:\n  name: b\n  version: 1.0\n";
    let original = shell_meta("b", "echo from orig");
    let recipe_dir = fixture.add_package("b", "1.0", Some(rendered));
    fs::write(recipe_dir.join(META_YAML_ORIG), &original).expect("must write orig");
    let options = TestOptions {
        metadata_handoff: MetadataHandoff::Rename,
        ..fixture.options()
    };

    let mut calls = 0;
    let report = run_env_tests_with_executor(
        &fixture.layout,
        &options,
        &ExecutionEnv::new(),
        &mut |_command| {
            assert!(!recipe_dir.join(META_YAML_ORIG).exists());
            calls += 1;
            Ok(exit_status(0))
        },
        &mut |_event| {},
    )
    .expect("environment must be readable");

    assert_eq!(calls, 1);
    assert_eq!(report.passed_count(), 1);
    assert_eq!(
        fs::read_to_string(recipe_dir.join(META_YAML)).expect("meta.yaml"),
        rendered
    );
    assert_eq!(
        fs::read_to_string(recipe_dir.join(META_YAML_ORIG)).expect("meta.yaml.orig"),
        original
    );
    assert!(!recipe_dir.join(testenv_env::META_YAML_TMP).exists());
}

#[test]
fn missing_environment_is_reported_before_any_event() {
    let layout = EnvLayout::new(test_dir("absent"));
    let mut events = Vec::new();
    let err = run_env_tests_with_executor(
        &layout,
        &TestOptions::default(),
        &ExecutionEnv::new(),
        &mut |_command| panic!("no interpreter may start"),
        &mut |event| events.push(event.clone()),
    )
    .expect_err("missing environment must fail");
    assert_eq!(err.prefix, layout.prefix());
    assert!(events.is_empty());
}
