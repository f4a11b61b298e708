use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{symlink, DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::fs::{CopyFailure, FileKind, FileStat, Filesystem, DIR_MODE};

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFs;

fn to_stat(meta: &fs::Metadata) -> FileStat {
    let ft = meta.file_type();
    let kind = if ft.is_symlink() {
        FileKind::Symlink
    } else if ft.is_dir() {
        FileKind::Dir
    } else {
        FileKind::File
    };
    FileStat {
        kind,
        mode: meta.permissions().mode() & 0o7777,
    }
}

impl Filesystem for OsFs {
    fn lstat(&self, path: &Path) -> io::Result<FileStat> {
        fs::symlink_metadata(path).map(|m| to_stat(&m))
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        fs::metadata(path).map(|m| to_stat(&m))
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        DirBuilder::new().recursive(true).mode(mode).create(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        symlink(target, link)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(path)?;
        file.write_all(data)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        // fs::copy carries the permission bits over on unix
        fs::copy(from, to).map(|_| ())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut out = Vec::new();
        for entry in fs::read_dir(path)? {
            out.push(entry?.path());
        }
        out.sort();
        Ok(out)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    fn copy_dir(&self, from: &Path, to: &Path) -> io::Result<Vec<CopyFailure>> {
        fs::metadata(from)?;
        self.create_dir_all(to, DIR_MODE)?;

        let mut failures = Vec::new();
        let mut dir_modes = Vec::new();
        for entry in WalkDir::new(from).follow_links(false).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(from).to_path_buf();
                    failures.push(CopyFailure {
                        path,
                        source: err.into(),
                    });
                    continue;
                }
            };
            let src = entry.path();
            let rel = src.strip_prefix(from).unwrap_or(src);
            let dst = to.join(rel);
            if let Err(source) = copy_one(self, &entry, &dst, &mut dir_modes) {
                failures.push(CopyFailure {
                    path: src.to_path_buf(),
                    source,
                });
            }
        }

        // deepest first, so a read-only directory is sealed after its children
        for (dir, mode) in dir_modes.into_iter().rev() {
            if let Err(source) = self.set_mode(&dir, mode) {
                failures.push(CopyFailure { path: dir, source });
            }
        }
        Ok(failures)
    }
}

fn copy_one(
    os: &OsFs,
    entry: &walkdir::DirEntry,
    dst: &Path,
    dir_modes: &mut Vec<(PathBuf, u32)>,
) -> io::Result<()> {
    let src = entry.path();
    let ft = entry.file_type();
    if ft.is_dir() {
        let mode = entry.metadata()?.permissions().mode() & 0o7777;
        os.create_dir_all(dst, DIR_MODE)?;
        dir_modes.push((dst.to_path_buf(), mode));
    } else if ft.is_symlink() {
        let target = fs::read_link(src)?;
        if fs::symlink_metadata(dst).is_ok() {
            fs::remove_file(dst)?;
        }
        symlink(&target, dst)?;
    } else {
        fs::copy(src, dst)?;
    }
    Ok(())
}
