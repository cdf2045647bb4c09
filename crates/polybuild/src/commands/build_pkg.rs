//! Build-pkg command implementation
//!
//! Builds and installs a single package, without workspace discovery.

use camino::Utf8PathBuf;
use clap::Args;

use crate::build::{
    ActionExecutor, BuildArgs as CoreBuildArgs, BuildTypeRegistry, PackageState, VerbOptions,
    build_single_package,
};
use crate::cache::ManifestCache;
use crate::{Error, Result};

use super::{absolutize, current_dir, validate_package_path};

/// Arguments for the build-pkg command
#[derive(Debug, Args)]
pub struct BuildPkgArgs {
    /// Path to the package
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: Utf8PathBuf,

    /// Path to the build prefix
    #[arg(long, default_value = "/tmp/polybuild/build")]
    pub build_prefix: Utf8PathBuf,

    /// Path to the install prefix
    #[arg(long, default_value = "/tmp/polybuild/install")]
    pub install_prefix: Utf8PathBuf,

    /// Enable testing of the package
    #[arg(long)]
    pub test: bool,

    /// Flags passed to make-style build steps; collects everything
    /// after the flag
    #[arg(long, num_args = 0.., allow_hyphen_values = true)]
    pub make_flags: Vec<String>,

    /// Log the steps without executing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the build-pkg command; returns the process exit code
pub fn run(
    args: BuildPkgArgs,
    options: &VerbOptions,
    registry: &BuildTypeRegistry,
    cache: &mut ManifestCache,
) -> Result<i32> {
    let cwd = current_dir()?;
    let package_dir = validate_package_path(&absolutize(&cwd, &args.path))?;
    let manifest = cache.get(&package_dir)?;

    let core_args = CoreBuildArgs {
        build_space: absolutize(&cwd, &args.build_prefix),
        install_space: absolutize(&cwd, &args.install_prefix),
        test: args.test,
        abort_test_error: false,
        start_with: None,
        make_flags: {
            let extracted = options.args("make_flags");
            if extracted.is_empty() {
                args.make_flags.clone()
            } else {
                extracted
            }
        },
        dry_run: args.dry_run,
    };

    let executor = ActionExecutor::new()?;
    let mut state = PackageState::Pending;
    let result = build_single_package(
        manifest.clone(),
        package_dir,
        &core_args.build_space,
        &core_args.install_space,
        registry,
        &executor,
        &core_args,
        options,
        &mut state,
    );

    match result {
        Ok(()) => Ok(0),
        Err(Error::TestFailure { package }) => {
            tracing::error!("Tests failed for package '{}'", package);
            Ok(1)
        }
        Err(e) => Err(e),
    }
}
