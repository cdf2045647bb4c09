//! Configuration file parsing
//!
//! This module handles parsing of the optional `polybuild.toml` file at
//! the workspace root, which provides defaults for the build and install
//! directories, packages to skip, and make flags.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Main configuration structure for polybuild
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workspace settings
    pub workspace: WorkspaceConfig,

    /// Build settings
    pub build: BuildConfig,
}

/// Workspace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Build artifacts directory (default: "build")
    pub build_dir: Utf8PathBuf,

    /// Installation directory (default: "install")
    pub install_dir: Utf8PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            build_dir: Utf8PathBuf::from("build"),
            install_dir: Utf8PathBuf::from("install"),
        }
    }
}

/// Build configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Packages to skip during discovery
    pub skip_packages: Vec<String>,

    /// Default flags passed to make-style build steps
    pub make_flags: Vec<String>,
}

impl Config {
    /// Load configuration from a workspace directory.
    ///
    /// Returns the defaults when no `polybuild.toml` exists.
    pub fn load(workspace_root: &Utf8Path) -> Result<Self> {
        let config_path = workspace_root.join("polybuild.toml");

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }
}
