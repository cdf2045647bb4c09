//! python build-type handler
//!
//! Builds setuptools-based packages. The heavy lifting happens at
//! install time through `setup.py`; the build hook only contributes a
//! test step when testing is requested, so it commonly yields nothing.

use crate::Result;

use super::action::{BuildActions, CommandAction, no_actions};
use super::context::{BuildContext, ContextExtender, NullExtender};
use super::handler::{BuildTypeHandler, VerbOptions};

pub const PYTHON_EXECUTABLE: &str = "python3";

/// Handler for setuptools-based python packages
pub struct PythonBuildType;

impl BuildTypeHandler for PythonBuildType {
    fn build_type(&self) -> &'static str {
        "python"
    }

    fn extend_context(&self, _options: &VerbOptions) -> Box<dyn ContextExtender> {
        Box::new(NullExtender)
    }

    fn on_build(&self, context: &BuildContext) -> Result<BuildActions> {
        if !context.build_tests {
            return Ok(no_actions());
        }

        let step = CommandAction::new([PYTHON_EXECUTABLE, "-m", "pytest"])
            .with_cwd(context.source_space.clone())
            .test();
        Ok(Box::new(std::iter::once(Ok(step.into()))))
    }

    fn on_install(&self, context: &BuildContext) -> Result<BuildActions> {
        if !context.install {
            return Ok(no_actions());
        }

        // Keep egg metadata, build artifacts and the install record out
        // of the source tree.
        let argv = vec![
            PYTHON_EXECUTABLE.to_string(),
            "setup.py".to_string(),
            "egg_info".to_string(),
            "--egg-base".to_string(),
            context.build_space.to_string(),
            "build".to_string(),
            "--build-base".to_string(),
            context.build_space.join("build").to_string(),
            "install".to_string(),
            "--prefix".to_string(),
            context.install_space.to_string(),
            "--record".to_string(),
            context.build_space.join("install.log").to_string(),
        ];
        let step = CommandAction::new(argv).with_cwd(context.source_space.clone());
        Ok(Box::new(std::iter::once(Ok(step.into()))))
    }
}
