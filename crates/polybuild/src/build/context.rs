//! Per-package build context
//!
//! The build context carries the paths and flags for one package build.
//! It is assembled by the orchestration loop immediately before the
//! package's build begins and discarded when its install phase ends.

use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;

use crate::package::PackageManifest;

use super::handler::{ExtraOptions, ExtraValue};

/// Mutable, per-package build parameters
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Absolute path to the package source
    pub source_space: Utf8PathBuf,

    /// Absolute path to the package's build directory
    pub build_space: Utf8PathBuf,

    /// Absolute path to the install destination
    pub install_space: Utf8PathBuf,

    /// Manifest of the package being built
    pub package_manifest: Arc<PackageManifest>,

    /// Whether the install phase runs at all
    pub install: bool,

    /// Whether each package installs into its own prefix
    pub isolated_install: bool,

    /// Whether installation may use symbolic links
    pub symbolic_link_install: bool,

    /// Whether test steps are requested
    pub build_tests: bool,

    /// Flags passed to make-style build steps
    pub make_flags: Vec<String>,

    /// Whether to log steps without executing them
    pub dry_run: bool,

    /// Build-type specific entries, written by context extenders and
    /// read back only by the owning handler
    extras: ExtraOptions,
}

impl BuildContext {
    /// Assemble a context with the fixed defaults for a single,
    /// non-isolated package build, then apply the handler's extender.
    pub fn assemble(
        manifest: Arc<PackageManifest>,
        source_space: Utf8PathBuf,
        build_prefix: &Utf8Path,
        install_prefix: &Utf8Path,
        extender: &dyn ContextExtender,
    ) -> Self {
        let mut context = Self {
            source_space,
            build_space: build_prefix.join(&manifest.name),
            install_space: install_prefix.to_path_buf(),
            package_manifest: manifest,
            install: true,
            isolated_install: false,
            symbolic_link_install: false,
            build_tests: false,
            make_flags: Vec::new(),
            dry_run: false,
            extras: ExtraOptions::new(),
        };
        extender.apply_to(&mut context);
        context
    }

    /// Read back an argument list written by a context extender
    pub fn extra_args(&self, key: &str) -> &[String] {
        match self.extras.get(key) {
            Some(ExtraValue::Args(values)) => values,
            _ => &[],
        }
    }

    /// Read back a switch written by a context extender
    pub fn extra_flag(&self, key: &str) -> bool {
        matches!(self.extras.get(key), Some(ExtraValue::Flag(true)))
    }

    /// Record an argument list on the context
    pub fn set_extra_args(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.extras.insert(key.into(), ExtraValue::Args(values));
    }

    /// Record a switch on the context
    pub fn set_extra_flag(&mut self, key: impl Into<String>, value: bool) {
        self.extras.insert(key.into(), ExtraValue::Flag(value));
    }
}

/// Applies build-type specific parameters onto a build context.
///
/// The orchestration loop never inspects what an extender writes; this
/// is the sole extension point for build-type specific context fields.
pub trait ContextExtender {
    fn apply_to(&self, context: &mut BuildContext);
}

/// Extender that leaves the context untouched
pub struct NullExtender;

impl ContextExtender for NullExtender {
    fn apply_to(&self, _context: &mut BuildContext) {}
}
