//! End-to-end orchestration tests over temporary workspaces
//!
//! A shell-backed build type is registered into a fresh registry so the
//! whole pipeline runs: discovery, ordering, handler dispatch, context
//! assembly and real command execution.

use camino::Utf8Path;
use std::fs;
use std::sync::Arc;

use polybuild::Error;
use polybuild::build::{
    BuildActions, BuildArgs, BuildContext, BuildTypeHandler, BuildTypeRegistry, Builder,
    CommandAction, ContextExtender, NullExtender, PackageState, VerbOptions, action_sequence,
};
use polybuild::cache::ManifestCache;
use polybuild::workspace::Workspace;

/// Build type that runs small shell commands.
///
/// Behavior is encoded in the package name: packages containing "boom"
/// fail their build command, packages containing "flaky" fail a
/// test-marked command when testing is enabled.
struct ShellBuildType;

impl BuildTypeHandler for ShellBuildType {
    fn build_type(&self) -> &'static str {
        "shell"
    }

    fn extend_context(&self, _options: &VerbOptions) -> Box<dyn ContextExtender> {
        Box::new(NullExtender)
    }

    fn on_build(&self, context: &BuildContext) -> polybuild::Result<BuildActions> {
        let name = &context.package_manifest.name;
        let mut actions = vec![
            CommandAction::new([
                "sh",
                "-c",
                &format!("echo built > {}/built.txt", context.build_space),
            ])
            .into(),
        ];
        if name.contains("boom") {
            actions.push(CommandAction::new(["false"]).into());
        }
        if context.build_tests && name.contains("flaky") {
            actions.push(CommandAction::new(["false"]).test().into());
        }
        Ok(action_sequence(actions))
    }

    fn on_install(&self, context: &BuildContext) -> polybuild::Result<BuildActions> {
        let marker = context
            .install_space
            .join(format!("{}.installed", context.package_manifest.name));
        Ok(action_sequence(vec![
            CommandAction::new(["sh", "-c", &format!("touch {}", marker)]).into(),
        ]))
    }
}

fn create_package_xml(name: &str, deps: &[&str]) -> String {
    let dep_elements: String = deps
        .iter()
        .map(|d| format!("  <build_depend>{}</build_depend>\n", d))
        .collect();

    format!(
        r#"<?xml version="1.0"?>
<package format="3">
  <name>{}</name>
  <version>1.0.0</version>
{}  <export>
    <build_type>shell</build_type>
  </export>
</package>"#,
        name, dep_elements
    )
}

fn add_package(root: &std::path::Path, name: &str, deps: &[&str]) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("package.xml"), create_package_xml(name, deps)).unwrap();
}

struct TestRun {
    _temp_dir: tempfile::TempDir,
    workspace: Workspace,
    registry: BuildTypeRegistry,
    args: BuildArgs,
}

impl TestRun {
    fn new(temp_dir: tempfile::TempDir) -> Self {
        let root = Utf8Path::from_path(temp_dir.path()).unwrap();
        let mut cache = ManifestCache::new();
        let workspace = Workspace::discover(root, &mut cache).unwrap();

        let mut registry = BuildTypeRegistry::new();
        registry.register(Arc::new(ShellBuildType)).unwrap();

        let args = BuildArgs {
            build_space: workspace.root.join("build"),
            install_space: workspace.root.join("install"),
            test: false,
            abort_test_error: false,
            start_with: None,
            make_flags: Vec::new(),
            dry_run: false,
        };

        Self {
            _temp_dir: temp_dir,
            workspace,
            registry,
            args,
        }
    }

    fn build(&self) -> polybuild::Result<polybuild::build::BuildReport> {
        Builder::new(&self.workspace, &self.registry)
            .build(&self.args, &VerbOptions::from_extras(Default::default()))
    }

    fn built(&self, name: &str) -> bool {
        self.workspace
            .root
            .join("build")
            .join(name)
            .join("built.txt")
            .exists()
    }

    fn installed(&self, name: &str) -> bool {
        self.workspace
            .root
            .join("install")
            .join(format!("{}.installed", name))
            .exists()
    }
}

#[test]
fn test_order_of_simple_workspace() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    add_package(temp_dir.path(), "lib", &[]);
    add_package(temp_dir.path(), "app", &["lib"]);

    let run = TestRun::new(temp_dir);
    let order: Vec<_> = run
        .workspace
        .topological_order()
        .unwrap()
        .iter()
        .map(|p| p.manifest.name.clone())
        .collect();

    assert_eq!(order, vec!["lib", "app"]);
}

#[test]
fn test_cycle_is_fatal() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    add_package(temp_dir.path(), "a", &["b"]);
    add_package(temp_dir.path(), "b", &["a"]);

    let run = TestRun::new(temp_dir);
    match run.build() {
        Err(Error::CircularDependency { packages }) => {
            assert!(packages.contains(&"a".to_string()));
            assert!(packages.contains(&"b".to_string()));
        }
        other => panic!("Expected CircularDependency, got {:?}", other),
    }
}

#[test]
fn test_full_build_installs_in_order() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    add_package(temp_dir.path(), "lib", &[]);
    add_package(temp_dir.path(), "app", &["lib"]);

    let run = TestRun::new(temp_dir);
    let report = run.build().unwrap();

    assert_eq!(report.exit_code(), 0);
    assert!(run.built("lib") && run.installed("lib"));
    assert!(run.built("app") && run.installed("app"));
    assert_eq!(
        report.packages,
        vec![
            ("lib".to_string(), PackageState::Done),
            ("app".to_string(), PackageState::Done)
        ]
    );
}

#[test]
fn test_start_with_resumes_mid_order() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    add_package(temp_dir.path(), "lib", &[]);
    add_package(temp_dir.path(), "app", &["lib"]);
    add_package(temp_dir.path(), "tool", &["app"]);

    let mut run = TestRun::new(temp_dir);
    run.args.start_with = Some("app".to_string());
    let report = run.build().unwrap();

    assert!(!run.built("lib"));
    assert!(run.built("app") && run.built("tool"));
    assert_eq!(
        report.packages,
        vec![
            ("lib".to_string(), PackageState::Skipped),
            ("app".to_string(), PackageState::Done),
            ("tool".to_string(), PackageState::Done)
        ]
    );
}

#[test]
fn test_build_failure_halts_run_before_install() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    add_package(temp_dir.path(), "lib", &[]);
    add_package(temp_dir.path(), "boom", &["lib"]);
    add_package(temp_dir.path(), "tool", &["boom"]);

    let run = TestRun::new(temp_dir);
    let result = run.build();

    match result {
        Err(Error::CommandExecution { package, .. }) => assert_eq!(package, "boom"),
        other => panic!("Expected CommandExecution, got {:?}", other),
    }
    // The failing package's install hook never ran
    assert!(!run.installed("boom"));
    // Packages after the failure were never attempted
    assert!(!run.built("tool"));
    // Packages before it completed normally
    assert!(run.installed("lib"));
}

#[test]
fn test_test_failures_are_recorded_and_run_continues() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    add_package(temp_dir.path(), "flaky", &[]);
    add_package(temp_dir.path(), "later_a", &["flaky"]);
    add_package(temp_dir.path(), "later_b", &["later_a"]);

    let mut run = TestRun::new(temp_dir);
    run.args.test = true;
    let report = run.build().unwrap();

    assert_eq!(report.test_failures, vec!["flaky"]);
    assert_eq!(report.exit_code(), 1);
    assert!(run.built("flaky"));
    assert!(run.built("later_a") && run.installed("later_a"));
    assert!(run.built("later_b") && run.installed("later_b"));
    assert_eq!(report.packages[0], ("flaky".to_string(), PackageState::TestFailed));
}

#[test]
fn test_abort_test_error_halts_immediately() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    add_package(temp_dir.path(), "flaky", &[]);
    add_package(temp_dir.path(), "later", &["flaky"]);

    let mut run = TestRun::new(temp_dir);
    run.args.test = true;
    run.args.abort_test_error = true;
    let result = run.build();

    match result {
        Err(Error::TestFailure { package }) => assert_eq!(package, "flaky"),
        other => panic!("Expected TestFailure, got {:?}", other),
    }
    assert!(!run.built("later"));
}

#[test]
fn test_order_is_reproducible() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    add_package(temp_dir.path(), "standalone_c", &[]);
    add_package(temp_dir.path(), "standalone_a", &[]);
    add_package(temp_dir.path(), "standalone_b", &[]);

    let run = TestRun::new(temp_dir);
    let names = |ws: &Workspace| -> Vec<String> {
        ws.topological_order()
            .unwrap()
            .iter()
            .map(|p| p.manifest.name.clone())
            .collect()
    };

    let first = names(&run.workspace);
    let second = names(&run.workspace);
    assert_eq!(first, vec!["standalone_a", "standalone_b", "standalone_c"]);
    assert_eq!(first, second);
}
