//! Maps a configured path to the place its content lives under the backup root.
//!
//! Paths under the home directory are collected in a `_HOME` namespace so the
//! backup can be restored for a different user name; every other path is
//! mirrored verbatim below the root.

use std::path::{Path, PathBuf};

use crate::util::paths::without_root;

pub const BACKUP_HOME_DIR_NAME: &str = "_HOME";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathClass {
    HomeRelative,
    AbsoluteOther,
}

pub fn classify(path: &Path, home: &Path) -> PathClass {
    if path != home && path.starts_with(home) {
        PathClass::HomeRelative
    } else {
        PathClass::AbsoluteOther
    }
}

pub fn backup_home_dir(backup_root: &Path) -> PathBuf {
    backup_root.join(BACKUP_HOME_DIR_NAME)
}

/// Backup-side location of `path`. Both sides are expected to be absolute and
/// normalised; the same rule serves backup, restore and uninstall.
pub fn backup_path(path: &Path, home: &Path, backup_root: &Path) -> PathBuf {
    match classify(path, home) {
        PathClass::HomeRelative => {
            let rel = path.strip_prefix(home).unwrap_or(path);
            backup_home_dir(backup_root).join(without_root(rel))
        }
        PathClass::AbsoluteOther => backup_root.join(without_root(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: &str = "/home/user";
    const ROOT: &str = "/home/user/Dropbox/backedup";

    fn map(path: &str) -> PathBuf {
        backup_path(Path::new(path), Path::new(HOME), Path::new(ROOT))
    }

    #[test]
    fn home_file_lands_in_home_namespace() {
        assert_eq!(map("/home/user/.bashrc"), PathBuf::from(ROOT).join("_HOME/.bashrc"));
    }

    #[test]
    fn nested_home_paths_keep_their_parents() {
        assert_eq!(
            map("/home/user/.m2/settings.xml"),
            PathBuf::from(ROOT).join("_HOME/.m2/settings.xml")
        );
        assert_eq!(
            map("/home/user/.dirhome/somedir"),
            PathBuf::from(ROOT).join("_HOME/.dirhome/somedir")
        );
    }

    #[test]
    fn other_paths_mirror_the_absolute_structure() {
        assert_eq!(map("/tmp/src/.file1"), PathBuf::from(ROOT).join("tmp/src/.file1"));
        assert_eq!(
            map("/Library/Application Support/Sequel Pro/Data"),
            PathBuf::from(ROOT).join("Library/Application Support/Sequel Pro/Data")
        );
    }

    #[test]
    fn home_prefix_must_match_whole_components() {
        let home = Path::new(HOME);
        assert_eq!(classify(Path::new("/home/user2/.bashrc"), home), PathClass::AbsoluteOther);
        assert_eq!(map("/home/user2/.bashrc"), PathBuf::from(ROOT).join("home/user2/.bashrc"));
    }

    #[test]
    fn home_itself_is_not_home_relative() {
        assert_eq!(classify(Path::new(HOME), Path::new(HOME)), PathClass::AbsoluteOther);
    }

    #[test]
    fn mapping_is_deterministic_and_stays_under_root() {
        for path in ["/home/user/.ssh", "/etc/hosts", "/home/user/a/b/c"] {
            let first = map(path);
            assert_eq!(first, map(path));
            assert!(first.starts_with(ROOT));
            assert_eq!(first.file_name(), Path::new(path).file_name());
        }
    }
}
