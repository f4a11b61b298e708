//! Moves configured paths between their three on-disk states: the original
//! file or directory, a symlink into the backup root, and content that lives
//! only under the backup root.
//!
//! Every operation walks `Config::paths` in order and never stops early for a
//! single path; failures are written to the log sink and returned in the
//! [`Report`]. Only a missing backup root (restore/uninstall) or an unusable
//! backup root (backup) aborts before the loop.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{init_config, load_config, Config};
use crate::error::{BackedupError, PathError, Result};
use crate::fs::{Filesystem, DIR_MODE};
use crate::mapper;
use crate::util::paths::normalize;

mod backup;
mod report;
mod restore;
mod uninstall;

pub use report::{Operation, Outcome, Report, SkipReason, Status};

pub struct Backedup<F: Filesystem, W: Write> {
    config: Config,
    home: PathBuf,
    fs: F,
    logger: W,
}

impl<F: Filesystem, W: Write> Backedup<F, W> {
    /// Load the config at `conf_path`, prompting on `input` to create it when
    /// missing. `home` is captured once and used for every path decision.
    pub fn new<R: BufRead>(
        fs: F,
        input: &mut R,
        mut logger: W,
        conf_path: &Path,
        home: &Path,
    ) -> Result<Self> {
        let home = normalize(home);
        init_config(&fs, input, &mut logger, conf_path, &home)?;
        let config = load_config(&fs, conf_path, &home)?;
        tracing::debug!(
            config = %conf_path.display(),
            backup_root = %config.backup_root.display(),
            paths = config.paths.len(),
            "loaded config"
        );
        Ok(Self {
            config,
            home,
            fs,
            logger,
        })
    }

    pub fn from_config(fs: F, logger: W, config: Config, home: &Path) -> Self {
        Self {
            config,
            home: normalize(home),
            fs,
            logger,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn fs(&self) -> &F {
        &self.fs
    }

    pub fn logger(&self) -> &W {
        &self.logger
    }

    pub fn run(&mut self, operation: Operation) -> Result<Report> {
        match operation {
            Operation::Backup => self.backup(),
            Operation::Restore => self.restore(),
            Operation::Uninstall => self.uninstall(),
        }
    }

    fn backup_path(&self, path: &Path) -> PathBuf {
        mapper::backup_path(path, &self.home, &self.config.backup_root)
    }

    fn require_backup_root(&self) -> Result<()> {
        if !self.fs.exists(&self.config.backup_root)? {
            return Err(BackedupError::BackupRootMissing(
                self.config.backup_root.clone(),
            ));
        }
        Ok(())
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        self.fs
            .create_dir_all(dir, DIR_MODE)
            .map_err(|e| BackedupError::message(format!("create {}: {}", dir.display(), e)))
    }

    fn ensure_backup_home(&self) -> Result<()> {
        self.ensure_dir(&mapper::backup_home_dir(&self.config.backup_root))
    }

    /// Create the parent of `path`, mapping failure to a per-path error.
    fn ensure_parent(&self, path: &Path) -> std::result::Result<(), PathError> {
        match path.parent() {
            Some(dir) => self
                .fs
                .create_dir_all(dir, DIR_MODE)
                .map_err(|source| PathError::CreateDir {
                    dir: dir.to_path_buf(),
                    source,
                }),
            None => Ok(()),
        }
    }

    fn each_path(&mut self, operation: Operation, step: fn(&Self, &Path) -> Status) -> Report {
        let mut report = Report::new(operation);
        for path in self.config.paths.clone() {
            let status = step(self, &path);
            self.record(&mut report, path, status);
        }
        tracing::info!(
            %operation,
            completed = report.completed(),
            skipped = report.skipped(),
            failed = report.failed(),
            "finished"
        );
        report
    }

    fn record(&mut self, report: &mut Report, path: PathBuf, status: Status) {
        let operation = report.operation;
        match &status {
            Status::Done { backup } => {
                tracing::debug!(%operation, path = %path.display(), backup = %backup.display(), "done");
            }
            Status::Skipped(reason) => {
                tracing::warn!(%operation, path = %path.display(), %reason, "skipped");
                let _ = writeln!(self.logger, "ERRO: {} {}", path.display(), reason);
            }
            Status::Failed(err) => {
                if let PathError::PartialCopy { failures, .. } = err {
                    for failure in failures {
                        let _ = writeln!(self.logger, "ERRO: {}", failure);
                    }
                }
                tracing::error!(%operation, path = %path.display(), error = %err, "failed");
                let _ = writeln!(self.logger, "ERRO: {} {}", path.display(), err);
            }
        }
        report.outcomes.push(Outcome { path, status });
    }
}
