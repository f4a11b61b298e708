use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::fs::CopyFailure;

#[derive(Debug, Error)]
pub enum BackedupError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{} does not exist", .0.display())]
    BackupRootMissing(PathBuf),
    #[error("config not created")]
    ConfigNotCreated,
    #[error("cannot resolve home directory")]
    HomeDirUnresolved,
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse config: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
    #[error("expand {0}")]
    Expand(String),
}

/// Failure of a single configured path. These never abort a batch.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("{0}")]
    Inspect(io::Error),
    #[error("backup path doesn't exist")]
    BackupRootVanished,
    #[error("overlaps backup root {}", .0.display())]
    OverlapsBackupRoot(PathBuf),
    #[error("mkdir {}: {source}", .dir.display())]
    CreateDir { dir: PathBuf, source: io::Error },
    #[error("move to {}: {source}", .to.display())]
    Move { to: PathBuf, source: io::Error },
    #[error("merge into {}: {source}", .to.display())]
    Merge { to: PathBuf, source: io::Error },
    #[error("remove after merging into backup: {0}")]
    RemoveMerged(io::Error),
    #[error("moved to {} but not linked, relink manually: {source}", .backup.display())]
    LinkAfterMove { backup: PathBuf, source: io::Error },
    #[error("symlink to {}: {source}", .target.display())]
    Link { target: PathBuf, source: io::Error },
    #[error("remove symlink: {0}")]
    RemoveLink(io::Error),
    #[error("backup {}: {source}", .backup.display())]
    MissingBackup { backup: PathBuf, source: io::Error },
    #[error("copy from {}: {source}", .from.display())]
    Copy { from: PathBuf, source: io::Error },
    #[error("{} item(s) not copied from {}", .failures.len(), .from.display())]
    PartialCopy {
        from: PathBuf,
        failures: Vec<CopyFailure>,
    },
}

pub type Result<T> = std::result::Result<T, BackedupError>;

impl BackedupError {
    pub fn message(msg: impl Into<String>) -> Self {
        BackedupError::Message(msg.into())
    }
}

impl From<ConfigError> for BackedupError {
    fn from(err: ConfigError) -> Self {
        BackedupError::Config(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_errors_render_like_the_cli_expects() {
        let err = BackedupError::BackupRootMissing(PathBuf::from("/tmp/bk"));
        assert_eq!(err.to_string(), "/tmp/bk does not exist");
        assert_eq!(BackedupError::ConfigNotCreated.to_string(), "config not created");

        let err: BackedupError = ConfigError::Parse("bad yaml".to_string()).into();
        assert_eq!(err.to_string(), "parse config: bad yaml");
    }

    #[test]
    fn path_errors_name_the_failing_step() {
        let err = PathError::Move {
            to: PathBuf::from("/bk/_HOME/.bashrc"),
            source: io::Error::new(io::ErrorKind::Other, "cross-device link"),
        };
        assert_eq!(err.to_string(), "move to /bk/_HOME/.bashrc: cross-device link");

        let err = PathError::PartialCopy {
            from: PathBuf::from("/bk/_HOME/.vim"),
            failures: vec![CopyFailure {
                path: PathBuf::from("/bk/_HOME/.vim/x"),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            }],
        };
        assert_eq!(err.to_string(), "1 item(s) not copied from /bk/_HOME/.vim");
    }
}
