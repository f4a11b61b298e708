use std::io::Write;
use std::path::Path;

use crate::engine::{Backedup, Operation, Report, SkipReason, Status};
use crate::error::{BackedupError, PathError, Result};
use crate::fs::{Filesystem, DIR_MODE};

impl<F: Filesystem, W: Write> Backedup<F, W> {
    /// Move every configured path under the backup root and leave a symlink
    /// in its place. Paths that are already links are skipped.
    pub fn backup(&mut self) -> Result<Report> {
        let root = self.config.backup_root.clone();
        self.fs
            .create_dir_all(&root, DIR_MODE)
            .map_err(|e| BackedupError::message(format!("create {}: {}", root.display(), e)))?;
        self.ensure_backup_home()?;
        Ok(self.each_path(Operation::Backup, Self::backup_one))
    }

    fn backup_one(&self, path: &Path) -> Status {
        let meta = match self.fs.lstat(path) {
            Ok(meta) => meta,
            Err(err) => return Status::Failed(PathError::Inspect(err)),
        };
        if meta.is_symlink() {
            return Status::Skipped(SkipReason::AlreadySymlink);
        }
        let root = &self.config.backup_root;
        if path.starts_with(root) || root.starts_with(path) {
            return Status::Failed(PathError::OverlapsBackupRoot(root.clone()));
        }

        let backup = self.backup_path(path);
        if let Err(err) = self.ensure_parent(&backup) {
            return Status::Failed(err);
        }
        // a directory left behind by uninstall is merged into, not renamed over
        let merge = meta.is_dir()
            && matches!(self.fs.lstat(&backup), Ok(existing) if existing.is_dir());
        if merge {
            if let Err(err) = self.merge_into_backup(path, &backup) {
                return Status::Failed(err);
            }
        } else {
            tracing::debug!(from = %path.display(), to = %backup.display(), "move");
            if let Err(source) = self.fs.rename(path, &backup) {
                return Status::Failed(PathError::Move { to: backup, source });
            }
        }
        tracing::debug!(link = %path.display(), target = %backup.display(), "symlink");
        if let Err(source) = self.fs.symlink(&backup, path) {
            return Status::Failed(PathError::LinkAfterMove { backup, source });
        }
        Status::Done { backup }
    }

    /// Copy the local tree over the existing backup directory, then drop the
    /// local tree. Nothing is removed unless every item was copied.
    fn merge_into_backup(&self, path: &Path, backup: &Path) -> std::result::Result<(), PathError> {
        tracing::debug!(from = %path.display(), to = %backup.display(), "merge");
        match self.fs.copy_dir(path, backup) {
            Ok(failures) if failures.is_empty() => {}
            Ok(failures) => {
                return Err(PathError::PartialCopy {
                    from: path.to_path_buf(),
                    failures,
                })
            }
            Err(source) => {
                return Err(PathError::Merge {
                    to: backup.to_path_buf(),
                    source,
                })
            }
        }
        self.fs.remove_dir_all(path).map_err(PathError::RemoveMerged)
    }
}
