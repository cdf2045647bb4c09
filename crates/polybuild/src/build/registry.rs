//! Build-type handler registry
//!
//! Maps build-type names to handlers. The registry is populated
//! explicitly at process start; "exactly one handler per name" is
//! enforced when a handler is registered, not when it is looked up.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::package::PackageManifest;
use crate::{Error, Result};

use super::cmake::CmakeBuildType;
use super::handler::BuildTypeHandler;
use super::python::PythonBuildType;

/// Build type assumed when a manifest declares none
pub const DEFAULT_BUILD_TYPE: &str = "cmake";

/// Registry of build-type handlers
#[derive(Default)]
pub struct BuildTypeRegistry {
    handlers: BTreeMap<String, Arc<dyn BuildTypeHandler>>,
}

impl BuildTypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in handlers registered
    pub fn with_default_handlers() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(CmakeBuildType))?;
        registry.register(Arc::new(PythonBuildType))?;
        Ok(registry)
    }

    /// Register a handler under its build-type name.
    ///
    /// Registering a second handler under the same name is a fatal
    /// misconfiguration.
    pub fn register(&mut self, handler: Arc<dyn BuildTypeHandler>) -> Result<()> {
        let name = handler.build_type();
        if self.handlers.contains_key(name) {
            return Err(Error::duplicate_plugin(name));
        }
        self.handlers.insert(name.to_string(), handler);
        Ok(())
    }

    /// Resolve a build-type name to its handler
    pub fn resolve(&self, build_type: &str) -> Result<Arc<dyn BuildTypeHandler>> {
        self.handlers
            .get(build_type)
            .cloned()
            .ok_or_else(|| Error::missing_plugin(build_type))
    }

    /// Resolve the handler for a package manifest, falling back to the
    /// default build type when the manifest declares none.
    pub fn resolve_for(&self, manifest: &PackageManifest) -> Result<Arc<dyn BuildTypeHandler>> {
        let build_type = manifest.build_type.as_deref().unwrap_or(DEFAULT_BUILD_TYPE);
        self.resolve(build_type)
    }

    /// All registered handlers, in build-type name order
    pub fn handlers(&self) -> impl Iterator<Item = &Arc<dyn BuildTypeHandler>> {
        self.handlers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_idempotent() {
        let registry = BuildTypeRegistry::with_default_handlers().unwrap();

        let first = registry.resolve("cmake").unwrap();
        let second = registry.resolve("cmake").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.build_type(), "cmake");
    }

    #[test]
    fn test_resolve_unknown_build_type() {
        let registry = BuildTypeRegistry::with_default_handlers().unwrap();

        let result = registry.resolve("imaginary");
        assert!(matches!(result, Err(Error::MissingPlugin { .. })));
    }

    #[test]
    fn test_duplicate_registration_is_fatal() {
        let mut registry = BuildTypeRegistry::with_default_handlers().unwrap();

        let result = registry.register(Arc::new(CmakeBuildType));
        assert!(matches!(result, Err(Error::DuplicatePlugin { .. })));
    }

    #[test]
    fn test_default_build_type_fallback() {
        let registry = BuildTypeRegistry::with_default_handlers().unwrap();
        let manifest = crate::package::PackageManifest::from_str(
            "<package><name>p</name><version>0.1.0</version></package>",
            camino::Utf8PathBuf::from("/p"),
        )
        .unwrap();

        let handler = registry.resolve_for(&manifest).unwrap();
        assert_eq!(handler.build_type(), DEFAULT_BUILD_TYPE);
    }

    #[test]
    fn test_handlers_are_sorted_by_name() {
        let registry = BuildTypeRegistry::with_default_handlers().unwrap();
        let names: Vec<_> = registry.handlers().map(|h| h.build_type()).collect();
        assert_eq!(names, vec!["cmake", "python"]);
    }
}
