//! Command implementations and shared CLI plumbing
//!
//! Pass-through argument groups (`--make-flags …`, handler groups such
//! as `--cmake-args …`) must be split off the raw command line before
//! the argument parser sees it; the preprocessing helpers here run the
//! verb-level and handler-level preprocessors and collect the extracted
//! extras.

pub mod build;
pub mod build_pkg;

use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;

use crate::build::{
    BuildTypeHandler, BuildTypeRegistry, ExtraOptions, ExtraValue, extract_argument_group,
};
use crate::cache::ManifestCache;
use crate::package::{PACKAGE_MANIFEST_FILENAME, package_exists_at};
use crate::{Error, Result};

/// Current working directory as a UTF-8 path
pub fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| {
        Error::workspace(
            format!("Current directory is not valid UTF-8: {}", e),
            "Run polybuild from a UTF-8 path",
        )
    })
}

/// Make a path absolute relative to the current working directory
pub fn absolutize(cwd: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Resolve an optional path argument.
///
/// Without an argument the default applies relative to the base path;
/// a given argument is taken relative to the current working directory.
pub fn determine_path_argument(
    cwd: &Utf8Path,
    base_path: &Utf8Path,
    argument: Option<&Utf8Path>,
    default: &Utf8Path,
) -> Utf8PathBuf {
    match argument {
        None => base_path.join(default),
        Some(path) => absolutize(cwd, path),
    }
}

/// Check that a path names a package directory (or its manifest file)
/// and return the package directory.
pub fn validate_package_path(path: &Utf8Path) -> Result<Utf8PathBuf> {
    let mut package_dir = path.to_path_buf();
    if !package_dir.is_dir() && package_dir.file_name() == Some(PACKAGE_MANIFEST_FILENAME) {
        package_dir.pop();
    }
    if !package_dir.is_dir() {
        return Err(Error::workspace(
            format!("Path '{}' is not a directory or does not exist", path),
            "Pass the package directory or its manifest file",
        ));
    }
    if !package_exists_at(&package_dir) {
        return Err(Error::workspace(
            format!(
                "Path '{}' does not contain a '{}' manifest file",
                package_dir, PACKAGE_MANIFEST_FILENAME
            ),
            "Pass the package directory or its manifest file",
        ));
    }
    Ok(package_dir)
}

/// Split the verb-level `--make-flags` group off the command line
fn extract_make_flags(args: Vec<String>, extras: &mut ExtraOptions) -> Vec<String> {
    let (args, make_flags) = extract_argument_group(args, "--make-flags");
    if !make_flags.is_empty() {
        extras.insert("make_flags".to_string(), ExtraValue::Args(make_flags));
    }
    args
}

/// Run every registered handler's argument preprocessor for the build
/// verb, which operates over packages of arbitrary build types.
pub fn preprocess_build_args(
    registry: &BuildTypeRegistry,
    args: Vec<String>,
) -> (Vec<String>, ExtraOptions) {
    let mut extras = ExtraOptions::new();
    let mut args = extract_make_flags(args, &mut extras);

    for handler in registry.handlers() {
        let (remaining, handler_extras) = handler.argument_preprocessor(args);
        args = remaining;
        extras.extend(handler_extras);
    }

    (args, extras)
}

/// Detect the target package of a `build-pkg` invocation and run only
/// that package's handler preprocessor.
///
/// Detection failures (bad path, unknown build type) are swallowed here
/// so that `--help` can still be produced; the verb itself reports them
/// when it actually runs.
pub fn preprocess_build_pkg_args(
    registry: &BuildTypeRegistry,
    cache: &mut ManifestCache,
    args: Vec<String>,
) -> (Vec<String>, ExtraOptions, Option<Arc<dyn BuildTypeHandler>>) {
    let mut extras = ExtraOptions::new();
    let mut args = extract_make_flags(args, &mut extras);

    let handler = detect_build_pkg_handler(registry, cache, &args);
    if let Some(handler) = &handler {
        let (remaining, handler_extras) = handler.argument_preprocessor(args);
        args = remaining;
        extras.extend(handler_extras);
    }

    (args, extras, handler)
}

/// Resolve the handler of the package a `build-pkg` command line
/// targets, if that can be determined.
fn detect_build_pkg_handler(
    registry: &BuildTypeRegistry,
    cache: &mut ManifestCache,
    args: &[String],
) -> Option<Arc<dyn BuildTypeHandler>> {
    // A throwaway parser that knows just enough of the verb's surface
    // to bind the positional path argument correctly.
    let detect = clap::Command::new("build-pkg")
        .ignore_errors(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(clap::Arg::new("path").default_value("."))
        .arg(clap::Arg::new("build_prefix").long("build-prefix"))
        .arg(clap::Arg::new("install_prefix").long("install-prefix"));

    // Skip the program name so the verb takes its place
    let matches = detect.try_get_matches_from(args.iter().skip(1)).ok()?;
    let path = Utf8PathBuf::from(matches.get_one::<String>("path")?);

    let cwd = std::env::current_dir()
        .ok()
        .and_then(|p| Utf8PathBuf::try_from(p).ok())?;
    let package_dir = validate_package_path(&absolutize(&cwd, &path)).ok()?;
    let manifest = cache.get(&package_dir).ok()?;

    match registry.resolve_for(&manifest) {
        Ok(handler) => Some(handler),
        Err(e) => {
            tracing::debug!("Could not detect package build type: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_determine_path_argument() {
        let cwd = Utf8Path::new("/cwd");
        let base = Utf8Path::new("/ws");

        assert_eq!(
            determine_path_argument(cwd, base, None, Utf8Path::new("build")),
            "/ws/build"
        );
        assert_eq!(
            determine_path_argument(cwd, base, Some(Utf8Path::new("out")), Utf8Path::new("build")),
            "/cwd/out"
        );
        assert_eq!(
            determine_path_argument(
                cwd,
                base,
                Some(Utf8Path::new("/abs/out")),
                Utf8Path::new("build")
            ),
            "/abs/out"
        );
    }

    #[test]
    fn test_validate_package_path() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let dir = Utf8Path::from_path(temp_dir.path()).unwrap();

        assert!(validate_package_path(dir).is_err());

        std::fs::write(
            dir.join(PACKAGE_MANIFEST_FILENAME),
            "<package><name>p</name><version>0.1.0</version></package>",
        )
        .unwrap();

        assert_eq!(validate_package_path(dir).unwrap(), dir);
        assert_eq!(
            validate_package_path(&dir.join(PACKAGE_MANIFEST_FILENAME)).unwrap(),
            dir
        );
        assert!(validate_package_path(&dir.join("missing")).is_err());
    }

    #[test]
    fn test_preprocess_build_args_extracts_groups() {
        let registry = BuildTypeRegistry::with_default_handlers().unwrap();

        let (rest, extras) = preprocess_build_args(
            &registry,
            args(&[
                "polybuild",
                "build",
                "--test",
                "--make-flags",
                "-j4",
            ]),
        );

        assert_eq!(rest, args(&["polybuild", "build", "--test"]));
        assert_eq!(
            extras.get("make_flags"),
            Some(&ExtraValue::Args(args(&["-j4"])))
        );
        // Handler preprocessors ran as well
        assert_eq!(extras.get("cmake_args"), Some(&ExtraValue::Args(vec![])));
    }

    #[test]
    fn test_preprocess_build_pkg_swallows_bad_path() {
        let registry = BuildTypeRegistry::with_default_handlers().unwrap();
        let mut cache = ManifestCache::new();

        let (rest, _extras, handler) = preprocess_build_pkg_args(
            &registry,
            &mut cache,
            args(&["polybuild", "build-pkg", "/no/such/package"]),
        );

        assert_eq!(rest, args(&["polybuild", "build-pkg", "/no/such/package"]));
        assert!(handler.is_none());
    }
}
