//! Filesystem capability used by the engine.
//!
//! [`OsFs`] talks to the real filesystem, [`MemFs`] keeps a tree in memory
//! with the same symlink semantics so the engine can be exercised without
//! touching disk.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod mem;
pub mod os;

pub use mem::MemFs;
pub use os::OsFs;

pub const DIR_MODE: u32 = 0o755;
pub const FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    Symlink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub kind: FileKind,
    pub mode: u32,
}

impl FileStat {
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }
}

/// A sub-item that could not be copied during a recursive copy.
#[derive(Debug, Error)]
#[error("{}: {source}", .path.display())]
pub struct CopyFailure {
    pub path: PathBuf,
    pub source: io::Error,
}

pub trait Filesystem {
    /// Metadata of `path` itself; a symlink is reported as a symlink.
    fn lstat(&self, path: &Path) -> io::Result<FileStat>;

    /// Metadata of whatever `path` resolves to.
    fn stat(&self, path: &Path) -> io::Result<FileStat>;

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Create a link at `link` pointing to `target`.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Remove a file or a symlink, never a directory.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything below it. A symlink at `path` is
    /// not followed.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn write(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()>;

    /// Copy file content and permission bits, replacing `to` if it exists.
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Full paths of the entries of a directory, sorted by name.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;

    fn exists(&self, path: &Path) -> io::Result<bool> {
        match self.stat(path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Recursively copy `from` into `to`, merging into `to` if it already
    /// exists. Returns `Err` only when the copy cannot start; failures below
    /// the top level are collected and the walk carries on.
    fn copy_dir(&self, from: &Path, to: &Path) -> io::Result<Vec<CopyFailure>> {
        let root = self.stat(from)?;
        self.create_dir_all(to, DIR_MODE)?;
        let mut failures = Vec::new();
        copy_children(self, from, to, &mut failures)?;
        if let Err(source) = self.set_mode(to, root.mode) {
            failures.push(CopyFailure {
                path: to.to_path_buf(),
                source,
            });
        }
        Ok(failures)
    }
}

fn copy_children<F: Filesystem + ?Sized>(
    fs: &F,
    from: &Path,
    to: &Path,
    failures: &mut Vec<CopyFailure>,
) -> io::Result<()> {
    for src in fs.read_dir(from)? {
        let Some(name) = src.file_name() else {
            continue;
        };
        let dst = to.join(name);
        if let Err(source) = copy_entry(fs, &src, &dst, failures) {
            failures.push(CopyFailure { path: src, source });
        }
    }
    Ok(())
}

fn copy_entry<F: Filesystem + ?Sized>(
    fs: &F,
    src: &Path,
    dst: &Path,
    failures: &mut Vec<CopyFailure>,
) -> io::Result<()> {
    let meta = fs.lstat(src)?;
    match meta.kind {
        FileKind::Dir => {
            fs.create_dir_all(dst, DIR_MODE)?;
            copy_children(fs, src, dst, failures)?;
            fs.set_mode(dst, meta.mode)
        }
        FileKind::Symlink => {
            let target = fs.read_link(src)?;
            if fs.lstat(dst).is_ok() {
                fs.remove_file(dst)?;
            }
            fs.symlink(&target, dst)
        }
        FileKind::File => fs.copy_file(src, dst),
    }
}
