use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::fs::{FileKind, FileStat, Filesystem, DIR_MODE, FILE_MODE};
use crate::util::paths::normalize;

const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File { data: Vec<u8>, mode: u32 },
    Dir { mode: u32 },
    Symlink { target: PathBuf },
}

impl Node {
    fn stat(&self) -> FileStat {
        match self {
            Node::File { mode, .. } => FileStat {
                kind: FileKind::File,
                mode: *mode,
            },
            Node::Dir { mode } => FileStat {
                kind: FileKind::Dir,
                mode: *mode,
            },
            Node::Symlink { .. } => FileStat {
                kind: FileKind::Symlink,
                mode: 0o777,
            },
        }
    }
}

type Tree = BTreeMap<PathBuf, Node>;

/// In-memory filesystem rooted at `/`. Only absolute paths are accepted.
#[derive(Debug)]
pub struct MemFs {
    nodes: Mutex<Tree>,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file or directory", path.display()),
    )
}

fn other(path: &Path, what: &str) -> io::Error {
    io::Error::other(format!("{}: {}", path.display(), what))
}

fn names(path: &Path) -> io::Result<Vec<OsString>> {
    if !path.is_absolute() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{}: path is not absolute", path.display()),
        ));
    }
    Ok(normalize(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_os_string()),
            _ => None,
        })
        .collect())
}

/// Key of the node `path` refers to. Links in intermediate components are
/// always followed, the final one only when `follow` is set. The returned key
/// may not exist yet.
fn resolve(tree: &Tree, path: &Path, follow: bool) -> io::Result<PathBuf> {
    let mut pending: Vec<OsString> = names(path)?;
    pending.reverse();
    let mut current = PathBuf::from("/");
    let mut hops = 0;
    while let Some(name) = pending.pop() {
        let candidate = current.join(&name);
        let last = pending.is_empty();
        match tree.get(&candidate) {
            Some(Node::Symlink { target }) if !last || follow => {
                hops += 1;
                if hops > MAX_LINK_HOPS {
                    return Err(other(path, "too many levels of symbolic links"));
                }
                let target = normalize(&current.join(target));
                let mut rest = names(&target)?;
                rest.reverse();
                pending.extend(rest);
                current = PathBuf::from("/");
            }
            Some(Node::File { .. }) if !last => return Err(other(path, "not a directory")),
            None if !last => return Err(not_found(path)),
            _ => current = candidate,
        }
    }
    Ok(current)
}

/// Key for a new entry at `path`: the parent is resolved and must be a
/// directory, the final component is taken literally.
fn entry_key(tree: &Tree, path: &Path) -> io::Result<PathBuf> {
    let path = normalize(path);
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return Err(other(&path, "invalid path"));
    };
    let parent_key = resolve(tree, parent, true)?;
    match tree.get(&parent_key) {
        Some(Node::Dir { .. }) => Ok(parent_key.join(name)),
        Some(_) => Err(other(parent, "not a directory")),
        None => Err(not_found(parent)),
    }
}

fn has_children(tree: &Tree, key: &Path) -> bool {
    tree.keys().any(|k| k.parent() == Some(key))
}

impl MemFs {
    pub fn new() -> Self {
        let mut tree = Tree::new();
        tree.insert(PathBuf::from("/"), Node::Dir { mode: DIR_MODE });
        Self {
            nodes: Mutex::new(tree),
        }
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        self.nodes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every path in the tree, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.tree().keys().cloned().collect()
    }
}

impl Filesystem for MemFs {
    fn lstat(&self, path: &Path) -> io::Result<FileStat> {
        let tree = self.tree();
        let key = resolve(&tree, path, false)?;
        tree.get(&key).map(Node::stat).ok_or_else(|| not_found(path))
    }

    fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let tree = self.tree();
        let key = resolve(&tree, path, true)?;
        tree.get(&key).map(Node::stat).ok_or_else(|| not_found(path))
    }

    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut tree = self.tree();
        let mut prefix = PathBuf::from("/");
        for name in names(path)? {
            prefix.push(name);
            let key = resolve(&tree, &prefix, true)?;
            match tree.get(&key) {
                Some(Node::Dir { .. }) => {}
                Some(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{}: file exists", prefix.display()),
                    ))
                }
                None => {
                    tree.insert(key, Node::Dir { mode });
                }
            }
        }
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut tree = self.tree();
        let src = resolve(&tree, from, false)?;
        let moving = tree.get(&src).cloned().ok_or_else(|| not_found(from))?;
        let dst = entry_key(&tree, to)?;
        if src == dst {
            return Ok(());
        }
        if dst.starts_with(&src) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot move {} into itself", from.display()),
            ));
        }
        match (tree.get(&dst), &moving) {
            (Some(Node::Dir { .. }), Node::Dir { .. }) if has_children(&tree, &dst) => {
                return Err(other(to, "directory not empty"))
            }
            (Some(Node::Dir { .. }), Node::Dir { .. }) | (None, _) => {}
            (Some(Node::Dir { .. }), _) => return Err(other(to, "is a directory")),
            (Some(_), Node::Dir { .. }) => return Err(other(to, "not a directory")),
            (Some(_), _) => {}
        }

        let keys: Vec<PathBuf> = tree.keys().filter(|k| k.starts_with(&src)).cloned().collect();
        for key in keys {
            if let Some(node) = tree.remove(&key) {
                let rel = key.strip_prefix(&src).unwrap_or(Path::new(""));
                let new_key = if rel.as_os_str().is_empty() {
                    dst.clone()
                } else {
                    dst.join(rel)
                };
                tree.insert(new_key, node);
            }
        }
        Ok(())
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let mut tree = self.tree();
        let key = entry_key(&tree, link)?;
        if tree.contains_key(&key) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: file exists", link.display()),
            ));
        }
        tree.insert(
            key,
            Node::Symlink {
                target: target.to_path_buf(),
            },
        );
        Ok(())
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        let tree = self.tree();
        let key = resolve(&tree, path, false)?;
        match tree.get(&key) {
            Some(Node::Symlink { target }) => Ok(target.clone()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{}: not a symlink", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut tree = self.tree();
        let key = resolve(&tree, path, false)?;
        match tree.get(&key) {
            Some(Node::Dir { .. }) => Err(other(path, "is a directory")),
            Some(_) => {
                tree.remove(&key);
                Ok(())
            }
            None => Err(not_found(path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut tree = self.tree();
        let key = resolve(&tree, path, false)?;
        match tree.get(&key) {
            Some(Node::Dir { .. }) if key.parent().is_some() => {}
            Some(Node::Dir { .. }) => return Err(other(path, "refusing to remove /")),
            Some(_) => return Err(other(path, "not a directory")),
            None => return Err(not_found(path)),
        }
        tree.retain(|k, _| !k.starts_with(&key));
        Ok(())
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let tree = self.tree();
        let key = resolve(&tree, path, true)?;
        match tree.get(&key) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(_) => Err(other(path, "is a directory")),
            None => Err(not_found(path)),
        }
    }

    fn write(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        let mut tree = self.tree();
        let key = match resolve(&tree, path, true) {
            Ok(key) if tree.contains_key(&key) => key,
            _ => entry_key(&tree, path)?,
        };
        let mode = match tree.get(&key) {
            Some(Node::Dir { .. }) => return Err(other(path, "is a directory")),
            Some(Node::File { mode, .. }) => *mode,
            _ => mode,
        };
        tree.insert(
            key,
            Node::File {
                data: data.to_vec(),
                mode,
            },
        );
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mode = self.stat(from)?.mode;
        let data = self.read(from)?;
        self.write(to, &data, FILE_MODE)?;
        self.set_mode(to, mode)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let tree = self.tree();
        let key = resolve(&tree, path, true)?;
        match tree.get(&key) {
            Some(Node::Dir { .. }) => {}
            Some(_) => return Err(other(path, "not a directory")),
            None => return Err(not_found(path)),
        }
        Ok(tree
            .keys()
            .filter(|k| k.parent() == Some(key.as_path()))
            .filter_map(|k| k.file_name().map(|name| path.join(name)))
            .collect())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut tree = self.tree();
        let key = resolve(&tree, path, true)?;
        match tree.get_mut(&key) {
            Some(Node::File { mode: m, .. }) | Some(Node::Dir { mode: m }) => {
                *m = mode;
                Ok(())
            }
            Some(Node::Symlink { .. }) => Err(not_found(path)),
            None => Err(not_found(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(path: &str) -> PathBuf {
        PathBuf::from(path)
    }

    #[test]
    fn files_need_an_existing_parent() {
        let fs = MemFs::new();
        let err = fs.write(&p("/a/b"), b"x", FILE_MODE).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        fs.create_dir_all(&p("/a"), DIR_MODE).expect("mkdir");
        fs.write(&p("/a/b"), b"x", FILE_MODE).expect("write");
        assert_eq!(fs.read(&p("/a/b")).expect("read"), b"x");
        assert!(fs.create_dir_all(&p("/a/b/c"), DIR_MODE).is_err());
    }

    #[test]
    fn symlinks_are_followed_except_by_lstat() {
        let fs = MemFs::new();
        fs.create_dir_all(&p("/data/dir"), DIR_MODE).expect("mkdir");
        fs.write(&p("/data/dir/f"), b"hello", 0o600).expect("write");
        fs.symlink(&p("/data/dir"), &p("/link")).expect("symlink");

        assert!(fs.lstat(&p("/link")).expect("lstat").is_symlink());
        assert!(fs.stat(&p("/link")).expect("stat").is_dir());
        assert_eq!(fs.read(&p("/link/f")).expect("read"), b"hello");
        assert_eq!(fs.read_dir(&p("/link")).expect("ls"), vec![p("/link/f")]);

        let err = fs.symlink(&p("/elsewhere"), &p("/link")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        fs.remove_file(&p("/link")).expect("unlink");
        assert!(fs.exists(&p("/data/dir/f")).expect("exists"));
        assert!(fs.remove_file(&p("/data/dir")).is_err());
    }

    #[test]
    fn dangling_link_exists_only_for_lstat() {
        let fs = MemFs::new();
        fs.symlink(&p("/nowhere"), &p("/dangling")).expect("symlink");
        assert!(!fs.exists(&p("/dangling")).expect("exists"));
        assert!(fs.lstat(&p("/dangling")).is_ok());
    }

    #[test]
    fn remove_dir_all_drops_the_subtree_only() {
        let fs = MemFs::new();
        fs.create_dir_all(&p("/a/dir/nested"), DIR_MODE).expect("mkdir");
        fs.write(&p("/a/dir/nested/f"), b"1", FILE_MODE).expect("write");
        fs.write(&p("/a/dirty"), b"2", FILE_MODE).expect("write");
        fs.symlink(&p("/a/dirty"), &p("/a/link")).expect("symlink");

        assert!(fs.remove_dir_all(&p("/a/link")).is_err());
        fs.remove_dir_all(&p("/a/dir")).expect("rm -r");
        assert_eq!(fs.paths(), vec![p("/"), p("/a"), p("/a/dirty"), p("/a/link")]);
    }

    #[test]
    fn rename_moves_whole_subtrees() {
        let fs = MemFs::new();
        fs.create_dir_all(&p("/src/dir/nested"), DIR_MODE).expect("mkdir");
        fs.write(&p("/src/dir/nested/f"), b"1", FILE_MODE).expect("write");
        fs.create_dir_all(&p("/dst"), DIR_MODE).expect("mkdir");

        fs.rename(&p("/src/dir"), &p("/dst/dir")).expect("rename");
        assert!(!fs.exists(&p("/src/dir")).expect("exists"));
        assert_eq!(fs.read(&p("/dst/dir/nested/f")).expect("read"), b"1");

        assert!(fs.rename(&p("/dst"), &p("/dst/dir/inner")).is_err());
    }

    #[test]
    fn rename_follows_posix_rules_for_existing_targets() {
        let fs = MemFs::new();
        fs.create_dir_all(&p("/a/full"), DIR_MODE).expect("mkdir");
        fs.write(&p("/a/full/x"), b"x", FILE_MODE).expect("write");
        fs.create_dir_all(&p("/a/dir"), DIR_MODE).expect("mkdir");
        fs.write(&p("/a/f1"), b"one", FILE_MODE).expect("write");
        fs.write(&p("/a/f2"), b"two", FILE_MODE).expect("write");

        assert!(fs.rename(&p("/a/dir"), &p("/a/full")).is_err());
        assert!(fs.rename(&p("/a/f1"), &p("/a/dir")).is_err());
        fs.rename(&p("/a/f1"), &p("/a/f2")).expect("rename over file");
        assert_eq!(fs.read(&p("/a/f2")).expect("read"), b"one");
    }

    #[test]
    fn copy_dir_merges_and_keeps_modes() {
        let fs = MemFs::new();
        fs.create_dir_all(&p("/bk/.ssh"), 0o700).expect("mkdir");
        fs.write(&p("/bk/.ssh/id"), b"key", 0o600).expect("write");
        fs.symlink(&p("id"), &p("/bk/.ssh/alias")).expect("symlink");
        fs.create_dir_all(&p("/home/.ssh"), DIR_MODE).expect("mkdir");
        fs.write(&p("/home/.ssh/known_hosts"), b"h", FILE_MODE).expect("write");

        let failures = fs.copy_dir(&p("/bk/.ssh"), &p("/home/.ssh")).expect("copy");
        assert!(failures.is_empty());
        assert_eq!(fs.read(&p("/home/.ssh/id")).expect("read"), b"key");
        assert_eq!(fs.stat(&p("/home/.ssh/id")).expect("stat").mode, 0o600);
        assert_eq!(fs.stat(&p("/home/.ssh")).expect("stat").mode, 0o700);
        assert!(fs.exists(&p("/home/.ssh/known_hosts")).expect("exists"));
        assert_eq!(fs.read_link(&p("/home/.ssh/alias")).expect("readlink"), p("id"));
    }

    #[test]
    fn copy_dir_reports_items_it_cannot_copy() {
        let fs = MemFs::new();
        fs.create_dir_all(&p("/bk/conf"), DIR_MODE).expect("mkdir");
        fs.write(&p("/bk/conf/a"), b"a", FILE_MODE).expect("write");
        fs.write(&p("/bk/conf/b"), b"b", FILE_MODE).expect("write");
        fs.create_dir_all(&p("/out/conf/a"), DIR_MODE).expect("mkdir");
        fs.write(&p("/out/conf/a/blocker"), b"", FILE_MODE).expect("write");

        let failures = fs.copy_dir(&p("/bk/conf"), &p("/out/conf")).expect("copy");
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, p("/bk/conf/a"));
        assert_eq!(fs.read(&p("/out/conf/b")).expect("read"), b"b");
    }
}
