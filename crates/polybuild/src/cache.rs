//! Manifest cache
//!
//! Parsed package manifests are memoized by package directory so that
//! repeated lookups (argument preprocessing, discovery, the build run)
//! do not re-read the manifest file. The cache is constructed once per
//! run and never invalidated.

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::sync::Arc;

use crate::Result;
use crate::package::{self, PackageManifest};

/// Memoizes parsed package manifests by package directory
#[derive(Debug, Default)]
pub struct ManifestCache {
    entries: HashMap<Utf8PathBuf, Arc<PackageManifest>>,
}

impl ManifestCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the manifest of the package at `package_dir`, parsing it on
    /// first access.
    ///
    /// Repeated calls with the same path return the identical cached
    /// value without re-reading the file.
    pub fn get(&mut self, package_dir: &Utf8Path) -> Result<Arc<PackageManifest>> {
        if let Some(manifest) = self.entries.get(package_dir) {
            return Ok(manifest.clone());
        }

        let manifest = Arc::new(package::parse_package(package_dir)?);
        self.entries
            .insert(package_dir.to_path_buf(), manifest.clone());
        Ok(manifest)
    }

    /// Number of cached manifests
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
