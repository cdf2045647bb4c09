//! cmake build-type handler
//!
//! Builds packages with the classic configure / make / make install
//! sequence. The configure step is skipped when it already ran with the
//! same arguments.

use clap::{Arg, ArgAction};

use crate::Result;

use super::action::{BuildAction, BuildActions, CommandAction, no_actions};
use super::common::{
    extract_argument_group, get_cached_config, makefile_exists_at, makefile_has_target,
    set_cached_config,
};
use super::context::{BuildContext, ContextExtender};
use super::handler::{BuildTypeHandler, ExtraOptions, ExtraValue, VerbOptions};

pub const CMAKE_EXECUTABLE: &str = "cmake";
pub const MAKE_EXECUTABLE: &str = "make";

/// Handler for cmake packages
pub struct CmakeBuildType;

/// Applies cmake options onto a build context
struct CmakeExtender {
    cmake_args: Vec<String>,
    force_configure: bool,
}

impl ContextExtender for CmakeExtender {
    fn apply_to(&self, context: &mut BuildContext) {
        context.set_extra_args("cmake_args", self.cmake_args.clone());
        context.set_extra_flag("force_cmake_configure", self.force_configure);
    }
}

impl BuildTypeHandler for CmakeBuildType {
    fn build_type(&self) -> &'static str {
        "cmake"
    }

    fn argument_preprocessor(&self, args: Vec<String>) -> (Vec<String>, ExtraOptions) {
        // The pass-through group collects dashed options, which the
        // argument parser would otherwise reject as unrecognized.
        let (args, cmake_args) = extract_argument_group(args, "--cmake-args");
        let mut extras = ExtraOptions::new();
        extras.insert("cmake_args".to_string(), ExtraValue::Args(cmake_args));
        (args, extras)
    }

    fn prepare_arguments(&self, command: clap::Command) -> clap::Command {
        command
            .arg(
                Arg::new("force_cmake_configure")
                    .long("force-cmake-configure")
                    .action(ArgAction::SetTrue)
                    .help("Invoke 'cmake' even if it has been executed before")
                    .help_heading("'cmake' build type options"),
            )
            .arg(
                Arg::new("cmake_args")
                    .long("cmake-args")
                    .num_args(0..)
                    .allow_hyphen_values(true)
                    .help("Arbitrary arguments passed to cmake; collects everything after the flag")
                    .help_heading("'cmake' build type options"),
            )
    }

    fn extend_context(&self, options: &VerbOptions) -> Box<dyn ContextExtender> {
        Box::new(CmakeExtender {
            cmake_args: options.args("cmake_args"),
            force_configure: options.flag("force_cmake_configure"),
        })
    }

    fn on_build(&self, context: &BuildContext) -> Result<BuildActions> {
        let cmake_args = context.extra_args("cmake_args").to_vec();

        // Decide whether cmake must run again
        let mut should_configure = context.extra_flag("force_cmake_configure")
            || !makefile_exists_at(&context.build_space);
        let cached_args: Option<Vec<String>> =
            get_cached_config(&context.build_space, "cmake_args");
        if cached_args.as_ref() != Some(&cmake_args) {
            if cached_args.is_some() {
                tracing::info!(
                    package = %context.package_manifest.name,
                    "Running cmake because its arguments have changed"
                );
            }
            should_configure = true;
        }
        set_cached_config(&context.build_space, "cmake_args", &cmake_args)?;

        let mut steps: Vec<BuildAction> = Vec::new();
        if should_configure {
            let mut argv = vec![
                CMAKE_EXECUTABLE.to_string(),
                context.source_space.to_string(),
            ];
            argv.extend(cmake_args);
            argv.push(format!("-DCMAKE_INSTALL_PREFIX={}", context.install_space));
            steps.push(CommandAction::new(argv).into());
        } else {
            steps.push(CommandAction::new([MAKE_EXECUTABLE, "cmake_check_build_system"]).into());
        }

        let mut make_argv = vec![MAKE_EXECUTABLE.to_string()];
        make_argv.extend(context.make_flags.iter().cloned());
        steps.push(CommandAction::new(make_argv).into());

        // The test target only exists once the configure step above has
        // run, so that check must wait until the step is consumed.
        let build_space = context.build_space.clone();
        let package = context.package_manifest.name.clone();
        let build_tests = context.build_tests;
        let test_step = std::iter::once_with(move || {
            if !build_tests {
                return None;
            }
            if !makefile_has_target(&build_space, "test") {
                tracing::warn!(
                    package = %package,
                    "Cannot run tests, the package has no 'test' target"
                );
                return None;
            }
            let mut argv = vec![MAKE_EXECUTABLE.to_string(), "test".to_string()];
            if std::env::var_os("ARGS").is_none() {
                argv.push("ARGS=-V".to_string());
            }
            Some(Ok(CommandAction::new(argv).test().into()))
        })
        .flatten();

        Ok(Box::new(steps.into_iter().map(Ok).chain(test_step)))
    }

    fn on_install(&self, context: &BuildContext) -> Result<BuildActions> {
        if !context.install {
            return Ok(no_actions());
        }

        // The install target appears only after the build has run
        let build_space = context.build_space.clone();
        let package = context.package_manifest.name.clone();
        let install_step = std::iter::once_with(move || {
            if !makefile_has_target(&build_space, "install") {
                tracing::warn!(
                    package = %package,
                    "Cannot install, the package has no 'install' target"
                );
                return None;
            }
            Some(Ok(CommandAction::new([MAKE_EXECUTABLE, "install"]).into()))
        })
        .flatten();

        Ok(Box::new(install_step))
    }
}
