//! Package manifest parsing and representation
//!
//! This module handles parsing of `package.xml` manifests and provides
//! the PackageManifest structure for workspace analysis.

use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::{Error, Result};

/// File name of the package manifest inside a package directory
pub const PACKAGE_MANIFEST_FILENAME: &str = "package.xml";

/// Represents a package parsed from its manifest
#[derive(Debug, Clone)]
pub struct PackageManifest {
    /// Package name
    pub name: String,

    /// Package version
    pub version: String,

    /// Package description
    pub description: Option<String>,

    /// Declared build type; `None` means the registry default applies
    pub build_type: Option<String>,

    /// Path to the package directory
    pub path: Utf8PathBuf,

    /// Build dependencies
    pub build_depend: Vec<String>,

    /// Build tool dependencies
    pub buildtool_depend: Vec<String>,

    /// Build export dependencies
    pub build_export_depend: Vec<String>,

    /// Execution dependencies
    pub exec_depend: Vec<String>,

    /// Test dependencies
    pub test_depend: Vec<String>,

    /// General dependencies (applies to build, exec, and test)
    pub depend: Vec<String>,
}

impl PackageManifest {
    /// Parse a package manifest from a manifest file path
    pub fn from_path(manifest_path: &Utf8Path) -> Result<Self> {
        let content = std::fs::read_to_string(manifest_path)
            .map_err(|e| Error::manifest(manifest_path.as_str(), e.to_string()))?;
        let package_dir = manifest_path
            .parent()
            .ok_or_else(|| Error::manifest(manifest_path.as_str(), "path has no parent directory"))?
            .to_path_buf();

        Self::from_str(&content, package_dir)
            .map_err(|e| Error::manifest(manifest_path.as_str(), e.to_string()))
    }

    /// Parse a package manifest from XML content
    pub fn from_str(content: &str, path: Utf8PathBuf) -> Result<Self> {
        let raw: RawPackageXml = from_str(content)?;

        let build_type = raw.export.as_ref().and_then(|e| e.build_type.clone());

        Ok(PackageManifest {
            name: raw.name,
            version: raw.version,
            description: raw.description,
            build_type,
            path,
            build_depend: extract_deps(&raw.build_depend),
            buildtool_depend: extract_deps(&raw.buildtool_depend),
            build_export_depend: extract_deps(&raw.build_export_depend),
            exec_depend: extract_deps(&raw.exec_depend),
            test_depend: extract_deps(&raw.test_depend),
            depend: extract_deps(&raw.depend),
        })
    }

    /// Get all dependencies that affect build order
    pub fn build_order_dependencies(&self) -> impl Iterator<Item = &str> {
        self.build_depend
            .iter()
            .chain(self.buildtool_depend.iter())
            .chain(self.build_export_depend.iter())
            .chain(self.depend.iter())
            .map(|s| s.as_str())
    }
}

/// Parse the manifest of the package at the given directory
pub fn parse_package(package_dir: &Utf8Path) -> Result<PackageManifest> {
    PackageManifest::from_path(&package_dir.join(PACKAGE_MANIFEST_FILENAME))
}

/// Check whether a directory contains a package manifest
pub fn package_exists_at(package_dir: &Utf8Path) -> bool {
    package_dir.join(PACKAGE_MANIFEST_FILENAME).is_file()
}

/// Raw package.xml structure for deserialization
#[derive(Debug, Deserialize)]
struct RawPackageXml {
    name: String,
    version: String,
    description: Option<String>,
    #[serde(default)]
    build_depend: Vec<Dependency>,
    #[serde(default)]
    buildtool_depend: Vec<Dependency>,
    #[serde(default)]
    build_export_depend: Vec<Dependency>,
    #[serde(default)]
    exec_depend: Vec<Dependency>,
    #[serde(default)]
    test_depend: Vec<Dependency>,
    #[serde(default)]
    depend: Vec<Dependency>,
    export: Option<Export>,
}

/// Dependency element
#[derive(Debug, Deserialize)]
struct Dependency {
    #[serde(rename = "$text")]
    name: String,
    #[serde(rename = "@condition")]
    condition: Option<String>,
}

/// Export section
#[derive(Debug, Deserialize)]
struct Export {
    build_type: Option<String>,
}

/// Extract dependency names from raw dependency list
///
/// Conditional dependencies (with a `condition` attribute) are skipped;
/// evaluating their conditions requires environment inspection that the
/// orchestrator does not perform.
fn extract_deps(deps: &[Dependency]) -> Vec<String> {
    deps.iter()
        .filter(|d| d.condition.is_none())
        .map(|d| d.name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_manifest() {
        let xml = r#"<?xml version="1.0"?>
<package format="3">
  <name>test_package</name>
  <version>1.0.0</version>
</package>"#;

        let package = PackageManifest::from_str(xml, Utf8PathBuf::from("/test")).unwrap();

        assert_eq!(package.name, "test_package");
        assert_eq!(package.version, "1.0.0");
        assert_eq!(package.build_type, None);
        assert!(package.build_depend.is_empty());
    }

    #[test]
    fn test_parse_full_manifest() {
        let xml = r#"<?xml version="1.0"?>
<package format="3">
  <name>my_package</name>
  <version>2.1.0</version>
  <description>A test package</description>

  <buildtool_depend>toolchain</buildtool_depend>
  <build_depend>libcore</build_depend>
  <build_depend>libmsg</build_depend>
  <build_export_depend>libcore</build_export_depend>
  <exec_depend>libcore</exec_depend>
  <test_depend>testkit</test_depend>
  <depend>libgeometry</depend>

  <export>
    <build_type>cmake</build_type>
  </export>
</package>"#;

        let package = PackageManifest::from_str(xml, Utf8PathBuf::from("/my_package")).unwrap();

        assert_eq!(package.name, "my_package");
        assert_eq!(package.version, "2.1.0");
        assert_eq!(package.description.as_deref(), Some("A test package"));
        assert_eq!(package.build_type.as_deref(), Some("cmake"));
        assert_eq!(package.buildtool_depend, vec!["toolchain"]);
        assert_eq!(package.build_depend, vec!["libcore", "libmsg"]);
        assert_eq!(package.build_export_depend, vec!["libcore"]);
        assert_eq!(package.exec_depend, vec!["libcore"]);
        assert_eq!(package.test_depend, vec!["testkit"]);
        assert_eq!(package.depend, vec!["libgeometry"]);
    }

    #[test]
    fn test_parse_python_package() {
        let xml = r#"<?xml version="1.0"?>
<package format="3">
  <name>python_package</name>
  <version>1.0.0</version>
  <export>
    <build_type>python</build_type>
  </export>
</package>"#;

        let package = PackageManifest::from_str(xml, Utf8PathBuf::from("/python_pkg")).unwrap();

        assert_eq!(package.build_type.as_deref(), Some("python"));
    }

    #[test]
    fn test_build_order_dependencies() {
        let xml = r#"<?xml version="1.0"?>
<package format="3">
  <name>test_pkg</name>
  <version>1.0.0</version>
  <build_depend>dep_a</build_depend>
  <buildtool_depend>dep_b</buildtool_depend>
  <build_export_depend>dep_c</build_export_depend>
  <exec_depend>dep_d</exec_depend>
  <depend>dep_e</depend>
</package>"#;

        let package = PackageManifest::from_str(xml, Utf8PathBuf::from("/test")).unwrap();
        let deps: Vec<_> = package.build_order_dependencies().collect();

        // exec_depend should not be included in build order
        assert!(deps.contains(&"dep_a"));
        assert!(deps.contains(&"dep_b"));
        assert!(deps.contains(&"dep_c"));
        assert!(deps.contains(&"dep_e"));
        assert!(!deps.contains(&"dep_d"));
    }

    #[test]
    fn test_conditional_dependencies_skipped() {
        let xml = r#"<?xml version="1.0"?>
<package format="3">
  <name>test_pkg</name>
  <version>1.0.0</version>
  <build_depend>always</build_depend>
  <build_depend condition="$PLATFORM == special">sometimes</build_depend>
</package>"#;

        let package = PackageManifest::from_str(xml, Utf8PathBuf::from("/test")).unwrap();

        assert_eq!(package.build_depend, vec!["always"]);
    }

    #[test]
    fn test_package_exists_at() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();

        assert!(!package_exists_at(dir));

        std::fs::write(
            dir.join(PACKAGE_MANIFEST_FILENAME),
            "<package><name>p</name><version>0.1.0</version></package>",
        )
        .unwrap();

        assert!(package_exists_at(dir));
        assert_eq!(parse_package(dir).unwrap().name, "p");
    }
}
