//! Build actions
//!
//! A build action is one discrete step a handler asks the orchestrator
//! to execute on its behalf. Hooks hand actions back as a lazy, possibly
//! empty sequence; the executor consumes them one at a time.

use camino::Utf8PathBuf;

use crate::Result;

/// One step of a package build or install phase
#[derive(Debug, Clone)]
pub enum BuildAction {
    /// Run an external command
    Command(CommandAction),
    /// Reserved for in-process steps; executing one is an error
    Function,
}

/// An external command to run
#[derive(Debug, Clone)]
pub struct CommandAction {
    /// Command and arguments
    pub argv: Vec<String>,

    /// Working directory; defaults to the context's build space
    pub cwd: Option<Utf8PathBuf>,

    /// Whether a failure of this command is a test failure rather than
    /// a build failure
    pub test: bool,
}

impl CommandAction {
    /// Create a command action running in the build space
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            cwd: None,
            test: false,
        }
    }

    /// Override the working directory
    pub fn with_cwd(mut self, cwd: impl Into<Utf8PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Mark this command as a test step
    pub fn test(mut self) -> Self {
        self.test = true;
        self
    }
}

impl From<CommandAction> for BuildAction {
    fn from(action: CommandAction) -> Self {
        BuildAction::Command(action)
    }
}

/// Lazy sequence of build actions yielded by a handler hook
pub type BuildActions = Box<dyn Iterator<Item = Result<BuildAction>> + Send>;

/// The empty action sequence, for hooks that do all their work eagerly
pub fn no_actions() -> BuildActions {
    Box::new(std::iter::empty())
}

/// Wrap an eagerly computed list of actions into a lazy sequence
pub fn action_sequence(actions: Vec<BuildAction>) -> BuildActions {
    Box::new(actions.into_iter().map(Ok))
}
