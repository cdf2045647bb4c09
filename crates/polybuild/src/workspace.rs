//! Workspace analysis and dependency resolution
//!
//! This module handles:
//! - Package discovery (finding package manifests)
//! - Dependency graph construction
//! - Topological sorting for build order

use camino::{Utf8Path, Utf8PathBuf};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use walkdir::WalkDir;

use crate::cache::ManifestCache;
use crate::config::Config;
use crate::package::{PACKAGE_MANIFEST_FILENAME, PackageManifest};
use crate::{Error, Result};

use std::sync::Arc;

/// Marker file that indicates a directory should be ignored
const IGNORE_MARKERS: &[&str] = &["POLYBUILD_IGNORE"];

/// Directories that are always excluded from search
const EXCLUDED_DIRS: &[&str] = &["build", "install", "log"];

/// A package found during workspace discovery
#[derive(Debug, Clone)]
pub struct DiscoveredPackage {
    /// Path of the package directory relative to the workspace root
    pub path: Utf8PathBuf,

    /// Parsed manifest, shared with the manifest cache
    pub manifest: Arc<PackageManifest>,
}

/// Represents a workspace of packages
#[derive(Debug)]
pub struct Workspace {
    /// Root directory of the workspace
    pub root: Utf8PathBuf,

    /// Configuration
    pub config: Config,

    /// Discovered packages, sorted by ascending relative path
    pub packages: Vec<DiscoveredPackage>,
}

impl Workspace {
    /// Discover and analyze a workspace
    pub fn discover(root: &Utf8Path, cache: &mut ManifestCache) -> Result<Self> {
        let config = Config::load(root)?;
        Self::with_config(root, config, cache)
    }

    /// Discover a workspace with a specific configuration
    pub fn with_config(root: &Utf8Path, config: Config, cache: &mut ManifestCache) -> Result<Self> {
        let root = root.canonicalize_utf8().map_err(|e| {
            Error::workspace(
                format!("Failed to canonicalize workspace root: {}", e),
                "Ensure the path exists and is accessible",
            )
        })?;

        let packages = discover_packages(&root, &config, cache)?;

        Ok(Workspace {
            root,
            config,
            packages,
        })
    }

    /// Get a discovered package by name
    pub fn get_package(&self, name: &str) -> Option<&DiscoveredPackage> {
        self.packages.iter().find(|p| p.manifest.name == name)
    }

    /// Absolute source directory of a discovered package
    pub fn package_source_dir(&self, package: &DiscoveredPackage) -> Utf8PathBuf {
        self.root.join(&package.path)
    }

    /// Compute the build order using a depth-first post-order topological sort.
    ///
    /// A package is emitted only after every package it depends on; among
    /// packages with no remaining ordering constraint, ties are broken by
    /// ascending relative path so the order is reproducible across runs.
    /// Dependencies naming packages outside the workspace impose no
    /// ordering constraint.
    pub fn topological_order(&self) -> Result<Vec<&DiscoveredPackage>> {
        let by_name: HashMap<&str, usize> = self
            .packages
            .iter()
            .enumerate()
            .map(|(i, p)| (p.manifest.name.as_str(), i))
            .collect();

        // Nodes are added in package order, which is ascending relative
        // path, so node-index order doubles as the tie-breaking order.
        let mut graph = DiGraph::<usize, ()>::new();
        let nodes: Vec<NodeIndex> = (0..self.packages.len())
            .map(|i| graph.add_node(i))
            .collect();

        // Edge dependent -> dependency, so the depth-first walk descends
        // into dependencies and emits them first.
        for (i, package) in self.packages.iter().enumerate() {
            for dep in package.manifest.build_order_dependencies() {
                if dep == package.manifest.name {
                    continue;
                }
                if let Some(&j) = by_name.get(dep) {
                    graph.add_edge(nodes[i], nodes[j], ());
                }
            }
        }

        let mut colors = vec![Color::White; self.packages.len()];
        let mut stack = Vec::new();
        let mut order = Vec::new();

        for node in &nodes {
            if colors[node.index()] == Color::White {
                self.visit(&graph, *node, &mut colors, &mut stack, &mut order)?;
            }
        }

        Ok(order.into_iter().map(|i| &self.packages[i]).collect())
    }

    fn visit(
        &self,
        graph: &DiGraph<usize, ()>,
        node: NodeIndex,
        colors: &mut [Color],
        stack: &mut Vec<NodeIndex>,
        order: &mut Vec<usize>,
    ) -> Result<()> {
        colors[node.index()] = Color::Gray;
        stack.push(node);

        let mut deps: Vec<NodeIndex> = graph.neighbors(node).collect();
        deps.sort();
        deps.dedup();

        for dep in deps {
            match colors[dep.index()] {
                Color::White => self.visit(graph, dep, colors, stack, order)?,
                Color::Gray => {
                    // Back edge; the slice of the visitation stack from the
                    // first occurrence of `dep` is the full cycle.
                    let pos = stack.iter().position(|n| *n == dep).unwrap_or(0);
                    let cycle = stack[pos..]
                        .iter()
                        .map(|n| self.packages[graph[*n]].manifest.name.clone())
                        .collect();
                    return Err(Error::circular_dependency(cycle));
                }
                Color::Black => {}
            }
        }

        stack.pop();
        colors[node.index()] = Color::Black;
        order.push(graph[node]);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Discover all packages under a workspace root
fn discover_packages(
    root: &Utf8Path,
    config: &Config,
    cache: &mut ManifestCache,
) -> Result<Vec<DiscoveredPackage>> {
    let mut packages: Vec<DiscoveredPackage> = Vec::new();
    let mut seen_names: HashMap<String, Utf8PathBuf> = HashMap::new();
    let skip_packages: HashSet<_> = config.build.skip_packages.iter().collect();

    let walker = WalkDir::new(root).follow_links(true);

    for entry in walker.into_iter().filter_entry(|e| should_visit(e, root)) {
        let entry = entry.map_err(|e| {
            Error::workspace(
                format!("Failed to read directory entry: {}", e),
                "Check directory permissions",
            )
        })?;

        let path = entry.path();
        if !path.is_file() || path.file_name() != Some(std::ffi::OsStr::new(PACKAGE_MANIFEST_FILENAME))
        {
            continue;
        }

        let manifest_path = Utf8Path::from_path(path).ok_or_else(|| {
            Error::workspace(
                format!("Path is not valid UTF-8: {:?}", path),
                "Ensure all paths are valid UTF-8",
            )
        })?;
        let package_dir = manifest_path
            .parent()
            .expect("manifest file always has a parent directory");

        let manifest = cache.get(package_dir)?;

        if skip_packages.contains(&manifest.name) {
            tracing::debug!(name = %manifest.name, "Skipping package (in skip_packages)");
            continue;
        }

        let rel_path = package_dir
            .strip_prefix(root)
            .map(Utf8Path::to_path_buf)
            .unwrap_or_else(|_| Utf8PathBuf::from("."));
        let rel_path = if rel_path.as_str().is_empty() {
            Utf8PathBuf::from(".")
        } else {
            rel_path
        };

        tracing::debug!(name = %manifest.name, path = %rel_path, "Discovered package");

        if let Some(existing) = seen_names.insert(manifest.name.clone(), rel_path.clone()) {
            return Err(Error::workspace(
                format!("Duplicate package name: {}", manifest.name),
                format!(
                    "Package '{}' exists at both '{}' and '{}'",
                    manifest.name, existing, rel_path
                ),
            ));
        }

        packages.push(DiscoveredPackage {
            path: rel_path,
            manifest,
        });
    }

    packages.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(packages)
}

/// Check if a directory entry should be visited during package discovery
fn should_visit(entry: &walkdir::DirEntry, workspace_root: &Utf8Path) -> bool {
    let path = entry.path();

    // Always visit files
    if path.is_file() {
        return true;
    }

    let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };

    // Skip hidden directories (starting with .)
    if dir_name.starts_with('.') && path != workspace_root.as_std_path() {
        return false;
    }

    // Skip build output directories at the workspace root level
    if let Some(parent) = path.parent() {
        if parent == workspace_root.as_std_path() && EXCLUDED_DIRS.contains(&dir_name) {
            return false;
        }
    }

    // Check for ignore markers
    for marker in IGNORE_MARKERS {
        if path.join(marker).exists() {
            return false;
        }
    }

    true
}
