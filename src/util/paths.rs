use std::env;
use std::path::{Component, Path, PathBuf};

use directories_next::BaseDirs;

use crate::error::{BackedupError, Result};

pub fn path_has_parent_dir(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::ParentDir))
}

/// Lexically normalise `path`: drops `.` components, repeated and trailing
/// separators, and folds `..` into the preceding component.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            // `..` at the root stays at the root
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// `path` with its root stripped, so it can be re-rooted with `join`.
pub fn without_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

pub fn resolve_home() -> Result<PathBuf> {
    if let Some(home) = env::var_os("HOME").filter(|h| !h.is_empty()) {
        return Ok(normalize(Path::new(&home)));
    }
    BaseDirs::new()
        .map(|dirs| normalize(dirs.home_dir()))
        .ok_or(BackedupError::HomeDirUnresolved)
}
