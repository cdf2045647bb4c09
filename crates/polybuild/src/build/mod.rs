//! Build system for polybuild
//!
//! This module provides the build functionality for polybuild, including:
//! - Build orchestration with dependency ordering
//! - The build-type handler contract and registry
//! - Per-package build contexts and context extension
//! - Build action execution
//! - Built-in build types (cmake, python)

mod action;
mod builder;
mod cmake;
mod common;
mod context;
mod executor;
mod handler;
mod python;
mod registry;

pub use action::{BuildAction, BuildActions, CommandAction, action_sequence, no_actions};
pub use builder::{BuildArgs, BuildReport, Builder, PackageState, build_single_package};
pub use cmake::CmakeBuildType;
pub use common::{extract_argument_group, get_cached_config, set_cached_config};
pub use context::{BuildContext, ContextExtender, NullExtender};
pub use executor::ActionExecutor;
pub use handler::{BuildTypeHandler, ExtraOptions, ExtraValue, VerbOptions};
pub use python::PythonBuildType;
pub use registry::{BuildTypeRegistry, DEFAULT_BUILD_TYPE};
