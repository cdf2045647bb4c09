//! Build command implementation
//!
//! Builds every package of a workspace in dependency order.

use camino::Utf8PathBuf;
use clap::Args;

use crate::build::{BuildArgs as CoreBuildArgs, BuildTypeRegistry, Builder, VerbOptions};
use crate::cache::ManifestCache;
use crate::workspace::Workspace;
use crate::{Error, Result};

use super::{absolutize, current_dir, determine_path_argument};

/// Arguments for the build command
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Base path to the packages
    #[arg(value_name = "BASEPATH", default_value = ".")]
    pub basepath: Utf8PathBuf,

    /// The base path of the workspace
    #[arg(short = 'C', long, default_value = ".")]
    pub directory: Utf8PathBuf,

    /// Path to the build space (default '<directory>/build')
    #[arg(long)]
    pub build_space: Option<Utf8PathBuf>,

    /// Path to the install space (default '<directory>/install')
    #[arg(long)]
    pub install_space: Option<Utf8PathBuf>,

    /// Enable testing of packages
    #[arg(long)]
    pub test: bool,

    /// Abort the run on the first test error instead of continuing
    #[arg(long)]
    pub abort_test_error: bool,

    /// Skip all packages before this one in the build order
    #[arg(long, value_name = "PKGNAME")]
    pub start_with: Option<String>,

    /// Flags passed to make-style build steps; collects everything
    /// after the flag
    #[arg(long, num_args = 0.., allow_hyphen_values = true)]
    pub make_flags: Vec<String>,

    /// Show what would be built without executing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the build command; returns the process exit code
pub fn run(
    args: BuildArgs,
    options: &VerbOptions,
    registry: &BuildTypeRegistry,
    cache: &mut ManifestCache,
) -> Result<i32> {
    let cwd = current_dir()?;
    let directory = absolutize(&cwd, &args.directory);
    let basepath = absolutize(&cwd, &args.basepath);

    if !basepath.exists() {
        return Err(Error::workspace(
            format!("The specified base path '{}' does not exist", basepath),
            "Pass an existing directory containing the packages to build",
        ));
    }

    let workspace = Workspace::discover(&basepath, cache)?;

    let build_space = determine_path_argument(
        &cwd,
        &directory,
        args.build_space.as_deref(),
        &workspace.config.workspace.build_dir,
    );
    let install_space = determine_path_argument(
        &cwd,
        &directory,
        args.install_space.as_deref(),
        &workspace.config.workspace.install_dir,
    );

    let mut make_flags = options.args("make_flags");
    if make_flags.is_empty() {
        make_flags = args.make_flags.clone();
    }
    if make_flags.is_empty() {
        make_flags = workspace.config.build.make_flags.clone();
    }

    let core_args = CoreBuildArgs {
        build_space,
        install_space,
        test: args.test,
        abort_test_error: args.abort_test_error,
        start_with: args.start_with,
        make_flags,
        dry_run: args.dry_run,
    };

    let report = Builder::new(&workspace, registry).build(&core_args, options)?;

    for package in &report.test_failures {
        tracing::error!("Tests failed for package '{}'", package);
    }

    Ok(report.exit_code())
}
