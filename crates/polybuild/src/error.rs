//! Error types for polybuild

// This warning is a false positive from thiserror macro expansion
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for polybuild operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for polybuild
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// XML parsing error
    #[error("Failed to parse XML: {0}")]
    XmlParse(#[from] quick_xml::DeError),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String, help: String },

    /// Manifest could not be read or parsed
    #[error("Failed to read package manifest at '{path}': {message}")]
    #[diagnostic(help("Check that the path contains a well-formed manifest file"))]
    Manifest { path: String, message: String },

    /// Workspace error
    #[error("Workspace error: {message}")]
    Workspace { message: String, help: String },

    /// Circular dependency detected
    #[error("Circular dependency detected: {packages:?}")]
    #[diagnostic(help("Check the dependency declarations in the package manifests"))]
    CircularDependency {
        /// Packages involved in the cycle
        packages: Vec<String>,
    },

    /// No build-type handler registered for a declared build type
    #[error("No handler registered for build type '{build_type}'")]
    #[diagnostic(help("Check the <build_type> export in the package manifest"))]
    MissingPlugin { build_type: String },

    /// More than one handler registered under the same build-type name
    #[error("A handler for build type '{build_type}' is already registered")]
    #[diagnostic(help("The handler registration list is misconfigured"))]
    DuplicatePlugin { build_type: String },

    /// A build or install command exited with a failure status
    #[error("Command '{command}' failed for package '{package}'{desc}", desc = exit_status(.status))]
    CommandExecution {
        command: String,
        package: String,
        /// Exit code, if the process ran and terminated normally
        status: Option<i32>,
    },

    /// Tests failed for a package; recoverable unless abort-on-test-error is set
    #[error("Tests failed for package '{package}'")]
    TestFailure { package: String },

    /// A handler yielded a reserved function action
    #[error("Build action type 'function' is reserved and not supported")]
    UnsupportedAction,

    /// Build error
    #[error("Build error: {message}")]
    Build { message: String, help: String },
}

fn exit_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!(" (exit status {code})"),
        None => " (failed to start)".to_string(),
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a manifest read error
    pub fn manifest(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a workspace error
    pub fn workspace(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Workspace {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a circular dependency error
    pub fn circular_dependency(packages: Vec<String>) -> Self {
        Self::CircularDependency { packages }
    }

    /// Create a missing plugin error
    pub fn missing_plugin(build_type: impl Into<String>) -> Self {
        Self::MissingPlugin {
            build_type: build_type.into(),
        }
    }

    /// Create a duplicate plugin error
    pub fn duplicate_plugin(build_type: impl Into<String>) -> Self {
        Self::DuplicatePlugin {
            build_type: build_type.into(),
        }
    }

    /// Create a command execution error
    pub fn command_execution(
        command: impl Into<String>,
        package: impl Into<String>,
        status: Option<i32>,
    ) -> Self {
        Self::CommandExecution {
            command: command.into(),
            package: package.into(),
            status,
        }
    }

    /// Create a test failure error
    pub fn test_failure(package: impl Into<String>) -> Self {
        Self::TestFailure {
            package: package.into(),
        }
    }

    /// Create a build error
    pub fn build(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
            help: help.into(),
        }
    }
}
