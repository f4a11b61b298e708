use std::fmt;
use std::path::PathBuf;

use crate::error::PathError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Backup,
    Restore,
    Uninstall,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Backup => "backup",
            Operation::Restore => "restore",
            Operation::Uninstall => "uninstall",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path left alone on purpose. Logged like an error for compatibility but
/// never counted as one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadySymlink,
    NotSymlink,
    AlreadyLinked,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::AlreadySymlink => "symlink exists",
            SkipReason::NotSymlink => "file exists, not symlink",
            SkipReason::AlreadyLinked => "already linked",
        })
    }
}

#[derive(Debug)]
pub enum Status {
    Done { backup: PathBuf },
    Skipped(SkipReason),
    Failed(PathError),
}

#[derive(Debug)]
pub struct Outcome {
    pub path: PathBuf,
    pub status: Status,
}

/// Per-path outcomes of one operation, in configuration order.
#[derive(Debug)]
pub struct Report {
    pub operation: Operation,
    pub outcomes: Vec<Outcome>,
}

impl Report {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            outcomes: Vec::new(),
        }
    }

    pub fn completed(&self) -> usize {
        self.count(|s| matches!(s, Status::Done { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, Status::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, Status::Failed(_)))
    }

    pub fn status_of(&self, path: &std::path::Path) -> Option<&Status> {
        self.outcomes
            .iter()
            .find(|o| o.path == path)
            .map(|o| &o.status)
    }

    fn count(&self, pred: impl Fn(&Status) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}
