//! Build-type handler contract
//!
//! A build type is a named strategy for building and installing one
//! package. Each strategy is implemented by a handler registered in the
//! [`BuildTypeRegistry`](super::BuildTypeRegistry); the orchestration
//! loop only ever talks to the trait defined here.

use std::collections::HashMap;

use crate::Result;

use super::action::BuildActions;
use super::context::{BuildContext, ContextExtender};

/// A value extracted from the command line by an argument preprocessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraValue {
    /// A boolean switch
    Flag(bool),
    /// An ordered argument list (e.g. a pass-through group)
    Args(Vec<String>),
}

/// Options extracted by argument preprocessors, keyed by option name
pub type ExtraOptions = HashMap<String, ExtraValue>;

/// Options a verb hands to handlers when extending the build context.
///
/// Combines the parsed command-line matches for the verb with the
/// pass-through groups its preprocessors extracted before parsing.
#[derive(Debug, Clone)]
pub struct VerbOptions {
    matches: clap::ArgMatches,
    extras: ExtraOptions,
}

impl VerbOptions {
    pub fn new(matches: clap::ArgMatches, extras: ExtraOptions) -> Self {
        Self { matches, extras }
    }

    /// Options with no command line behind them, e.g. for tests
    pub fn from_extras(extras: ExtraOptions) -> Self {
        Self {
            matches: clap::ArgMatches::default(),
            extras,
        }
    }

    /// Look up a boolean switch by name.
    ///
    /// Extracted extras take precedence over parsed matches; an option
    /// unknown to both is `false`.
    pub fn flag(&self, key: &str) -> bool {
        if let Some(ExtraValue::Flag(value)) = self.extras.get(key) {
            return *value;
        }
        self.matches
            .try_get_one::<bool>(key)
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false)
    }

    /// Look up an extracted argument group by name
    pub fn args(&self, key: &str) -> Vec<String> {
        match self.extras.get(key) {
            Some(ExtraValue::Args(values)) => values.clone(),
            _ => Vec::new(),
        }
    }
}

/// Capability set of a build-type handler.
///
/// `on_build` and `on_install` hand back a lazy action sequence which
/// the orchestrator executes; a hook that does all its work eagerly
/// returns [`no_actions`](super::no_actions).
pub trait BuildTypeHandler: Send + Sync {
    /// Build-type name this handler is registered under
    fn build_type(&self) -> &'static str;

    /// Split pass-through argument groups off the raw command line
    /// before it reaches the argument parser.
    fn argument_preprocessor(&self, args: Vec<String>) -> (Vec<String>, ExtraOptions) {
        (args, ExtraOptions::new())
    }

    /// Add this build type's options to the verb's argument parser
    fn prepare_arguments(&self, command: clap::Command) -> clap::Command {
        command
    }

    /// Turn user options into an extender that applies this build
    /// type's parameters onto a build context.
    fn extend_context(&self, options: &VerbOptions) -> Box<dyn ContextExtender>;

    /// Actions that build the package
    fn on_build(&self, context: &BuildContext) -> Result<BuildActions>;

    /// Actions that install the package
    fn on_install(&self, context: &BuildContext) -> Result<BuildActions>;
}
