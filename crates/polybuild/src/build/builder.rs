//! Build orchestration
//!
//! Ties the other build components together across a workspace: order
//! the packages, build each one in sequence through its build-type
//! handler, honor a resume point, and aggregate test failures.

use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;

use crate::package::PackageManifest;
use crate::workspace::Workspace;
use crate::{Error, Result};

use super::context::BuildContext;
use super::executor::ActionExecutor;
use super::handler::VerbOptions;
use super::registry::BuildTypeRegistry;

/// Arguments for a workspace build run
#[derive(Debug, Clone)]
pub struct BuildArgs {
    /// Prefix under which per-package build directories are created
    pub build_space: Utf8PathBuf,
    /// Install destination
    pub install_space: Utf8PathBuf,
    /// Enable testing of packages
    pub test: bool,
    /// Halt the run on the first test error instead of recording it
    pub abort_test_error: bool,
    /// Skip packages before this one in the build order
    pub start_with: Option<String>,
    /// Flags passed to make-style build steps
    pub make_flags: Vec<String>,
    /// Log what would be built without executing anything
    pub dry_run: bool,
}

/// Lifecycle of one package within a build run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageState {
    Pending,
    Skipped,
    Building,
    Installing,
    Done,
    TestFailed,
}

/// Outcome of a whole build run
#[derive(Debug)]
pub struct BuildReport {
    /// Final state per package, in build order
    pub packages: Vec<(String, PackageState)>,
    /// Packages whose tests failed without aborting the run
    pub test_failures: Vec<String>,
}

impl BuildReport {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.test_failures.is_empty() { 0 } else { 1 }
    }
}

/// Builds all packages of a workspace in dependency order
pub struct Builder<'a> {
    workspace: &'a Workspace,
    registry: &'a BuildTypeRegistry,
}

impl<'a> Builder<'a> {
    /// Create a builder for the given workspace
    pub fn new(workspace: &'a Workspace, registry: &'a BuildTypeRegistry) -> Self {
        Self {
            workspace,
            registry,
        }
    }

    /// Execute the build run
    pub fn build(&self, args: &BuildArgs, options: &VerbOptions) -> Result<BuildReport> {
        let order = self.workspace.topological_order()?;

        tracing::info!("Found {} packages", order.len());
        for package in &order {
            tracing::info!(" - {}", package.manifest.name);
        }

        if let Some(start_with) = &args.start_with {
            if !order.iter().any(|p| &p.manifest.name == start_with) {
                return Err(Error::workspace(
                    format!("Package '{}' given to --start-with does not exist", start_with),
                    "Use one of the discovered package names",
                ));
            }
        }

        if args.dry_run {
            for package in &order {
                tracing::info!(
                    "Would build '{}' at '{}'",
                    package.manifest.name,
                    package.path
                );
            }
            let packages = order
                .iter()
                .map(|p| (p.manifest.name.clone(), PackageState::Skipped))
                .collect();
            return Ok(BuildReport {
                packages,
                test_failures: Vec::new(),
            });
        }

        let executor = ActionExecutor::new()?;
        let mut states = vec![PackageState::Pending; order.len()];
        let mut test_failures = Vec::new();
        let mut started = args.start_with.is_none();

        for (i, package) in order.iter().enumerate() {
            let name = &package.manifest.name;

            if !started {
                if args.start_with.as_deref() == Some(name.as_str()) {
                    started = true;
                } else {
                    tracing::info!("Skipping '{}' (before --start-with)", name);
                    states[i] = PackageState::Skipped;
                    continue;
                }
            }

            let source_space = self.workspace.package_source_dir(package);
            let result = build_single_package(
                package.manifest.clone(),
                source_space,
                &args.build_space,
                &args.install_space,
                self.registry,
                &executor,
                args,
                options,
                &mut states[i],
            );

            match result {
                Ok(()) => states[i] = PackageState::Done,
                Err(Error::TestFailure { package }) => {
                    if args.abort_test_error {
                        return Err(Error::TestFailure { package });
                    }
                    tracing::warn!("Tests failed for '{}', continuing", package);
                    test_failures.push(package);
                    states[i] = PackageState::TestFailed;
                }
                Err(e) => return Err(e),
            }
        }

        let packages = order
            .iter()
            .map(|p| p.manifest.name.clone())
            .zip(states)
            .collect();

        Ok(BuildReport {
            packages,
            test_failures,
        })
    }
}

/// Build and install a single package through its build-type handler.
///
/// This is the per-package protocol the orchestration loop runs for
/// every non-skipped package; the `build-pkg` verb uses it directly.
#[allow(clippy::too_many_arguments)]
pub fn build_single_package(
    manifest: Arc<PackageManifest>,
    source_space: Utf8PathBuf,
    build_prefix: &Utf8Path,
    install_prefix: &Utf8Path,
    registry: &BuildTypeRegistry,
    executor: &ActionExecutor,
    args: &BuildArgs,
    options: &VerbOptions,
    state: &mut PackageState,
) -> Result<()> {
    let handler = registry.resolve_for(&manifest)?;
    let extender = handler.extend_context(options);

    let mut context = BuildContext::assemble(
        manifest.clone(),
        source_space,
        build_prefix,
        install_prefix,
        extender.as_ref(),
    );
    context.build_tests = args.test;
    context.make_flags = args.make_flags.clone();
    context.dry_run = args.dry_run;

    tracing::info!(
        package = %manifest.name,
        build_type = handler.build_type(),
        source_space = %context.source_space,
        build_space = %context.build_space,
        install_space = %context.install_space,
        "Building package"
    );

    if context.dry_run {
        tracing::info!("Dry run, not building '{}'", manifest.name);
        return Ok(());
    }

    std::fs::create_dir_all(&context.build_space)?;
    std::fs::create_dir_all(&context.install_space)?;

    *state = PackageState::Building;
    executor.run(
        handler.on_build(&context)?,
        &context.build_space,
        &manifest.name,
    )?;

    if context.install {
        *state = PackageState::Installing;
        executor.run(
            handler.on_install(&context)?,
            &context.build_space,
            &manifest.name,
        )?;
    }

    Ok(())
}
