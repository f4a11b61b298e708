use std::io::Write;
use std::path::Path;

use crate::engine::{Backedup, Operation, Report, SkipReason, Status};
use crate::error::{PathError, Result};
use crate::fs::Filesystem;

impl<F: Filesystem, W: Write> Backedup<F, W> {
    /// Point each configured path at its already populated backup copy, e.g.
    /// on a fresh machine. Content is not checked; an occupied path fails.
    pub fn restore(&mut self) -> Result<Report> {
        self.require_backup_root()?;
        self.ensure_backup_home()?;
        Ok(self.each_path(Operation::Restore, Self::restore_one))
    }

    fn restore_one(&self, path: &Path) -> Status {
        // the root may disappear under us, e.g. a sync client unmounting it
        match self.fs.exists(&self.config.backup_root) {
            Ok(true) => {}
            Ok(false) => return Status::Failed(PathError::BackupRootVanished),
            Err(err) => return Status::Failed(PathError::Inspect(err)),
        }

        let backup = self.backup_path(path);
        if matches!(self.fs.read_link(path), Ok(target) if target == backup) {
            return Status::Skipped(SkipReason::AlreadyLinked);
        }
        if let Err(err) = self.ensure_parent(path) {
            return Status::Failed(err);
        }

        println!("creating symlink {} {}", backup.display(), path.display());
        if let Err(source) = self.fs.symlink(&backup, path) {
            return Status::Failed(PathError::Link {
                target: backup,
                source,
            });
        }
        Status::Done { backup }
    }
}
