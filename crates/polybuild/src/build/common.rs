//! Shared helpers for build-type handlers

use camino::Utf8Path;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::Result;

/// Split a pass-through group off an argument list at a delimiting option.
///
/// Everything after the delimiter belongs to the group:
///
/// `["build", "--cmake-args", "-DFOO=1"]` split at `--cmake-args`
/// yields `(["build"], ["-DFOO=1"])`.
pub fn extract_argument_group(
    args: Vec<String>,
    delimiting_option: &str,
) -> (Vec<String>, Vec<String>) {
    match args.iter().position(|a| a == delimiting_option) {
        Some(index) => {
            let mut args = args;
            let group = args.split_off(index + 1);
            args.pop();
            (args, group)
        }
        None => (args, Vec::new()),
    }
}

/// Read a cached handler configuration value from the build space.
///
/// Returns `None` when the cache file does not exist or no longer
/// deserializes.
pub fn get_cached_config<T: DeserializeOwned>(build_space: &Utf8Path, name: &str) -> Option<T> {
    let path = build_space.join(format!("{name}.cache"));
    let content = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Persist a handler configuration value into the build space
pub fn set_cached_config<T: Serialize>(
    build_space: &Utf8Path,
    name: &str,
    value: &T,
) -> Result<()> {
    std::fs::create_dir_all(build_space)?;
    let path = build_space.join(format!("{name}.cache"));
    let content = serde_json::to_string(value).map_err(|e| {
        crate::Error::build(
            format!("Failed to serialize '{name}' cache"),
            e.to_string(),
        )
    })?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Whether a Makefile exists in the given directory
pub fn makefile_exists_at(path: &Utf8Path) -> bool {
    path.join("Makefile").is_file()
}

/// Whether the Makefile in the given directory declares a target.
///
/// A plain text scan is enough here; generated Makefiles declare their
/// top-level targets at column zero.
pub fn makefile_has_target(path: &Utf8Path, target: &str) -> bool {
    let Ok(content) = std::fs::read_to_string(path.join("Makefile")) else {
        return false;
    };
    let prefix = format!("{target}:");
    content.lines().any(|line| line.starts_with(&prefix))
}
