use std::io::Write;
use std::path::Path;

use crate::engine::{Backedup, Operation, Report, SkipReason, Status};
use crate::error::{PathError, Result};
use crate::fs::Filesystem;

impl<F: Filesystem, W: Write> Backedup<F, W> {
    /// Replace each link with a copy of its backed up content. The backup
    /// root is left untouched, so a later `backup` can relink.
    pub fn uninstall(&mut self) -> Result<Report> {
        self.require_backup_root()?;
        self.ensure_backup_home()?;
        Ok(self.each_path(Operation::Uninstall, Self::uninstall_one))
    }

    fn uninstall_one(&self, path: &Path) -> Status {
        let meta = match self.fs.lstat(path) {
            Ok(meta) => meta,
            Err(err) => return Status::Failed(PathError::Inspect(err)),
        };
        if !meta.is_symlink() {
            return Status::Skipped(SkipReason::NotSymlink);
        }

        // inspect the backup first so a missing copy keeps the link in place
        let backup = self.backup_path(path);
        let backup_meta = match self.fs.lstat(&backup) {
            Ok(meta) => meta,
            Err(source) => return Status::Failed(PathError::MissingBackup { backup, source }),
        };

        tracing::debug!(link = %path.display(), "remove symlink");
        if let Err(err) = self.fs.remove_file(path) {
            return Status::Failed(PathError::RemoveLink(err));
        }
        if let Err(err) = self.ensure_parent(path) {
            return Status::Failed(err);
        }

        tracing::debug!(from = %backup.display(), to = %path.display(), "copy");
        if backup_meta.is_dir() {
            match self.fs.copy_dir(&backup, path) {
                Ok(failures) if failures.is_empty() => {}
                Ok(failures) => {
                    return Status::Failed(PathError::PartialCopy {
                        from: backup,
                        failures,
                    })
                }
                Err(source) => {
                    return Status::Failed(PathError::Copy {
                        from: backup,
                        source,
                    })
                }
            }
        } else if let Err(source) = self.fs.copy_file(&backup, path) {
            return Status::Failed(PathError::Copy {
                from: backup,
                source,
            });
        }
        Status::Done { backup }
    }
}
