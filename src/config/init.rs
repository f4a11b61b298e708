use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::defaults::{DEFAULT_BACKUP_TO, DEFAULT_CONFIG, DEFAULT_CONFIG_FILENAME};
use crate::config::load::expand;
use crate::error::{BackedupError, Result};
use crate::fs::{Filesystem, DIR_MODE, FILE_MODE};
use crate::mapper;

/// Make sure a config exists at `conf_path`. When it is missing, offer to copy
/// one left in the default backup root (a new machine), either where backup
/// put it or at the top of the root, or to write the built-in default. Anything but "yes" aborts with `ConfigNotCreated`.
pub fn init_config<F, R, W>(
    fs: &F,
    input: &mut R,
    out: &mut W,
    conf_path: &Path,
    home: &Path,
) -> Result<()>
where
    F: Filesystem,
    R: BufRead,
    W: Write,
{
    if fs.exists(conf_path)? {
        return Ok(());
    }

    let root = PathBuf::from(expand(DEFAULT_BACKUP_TO, home)?);
    let mut found = None;
    for candidate in [
        mapper::backup_path(conf_path, home, &root),
        root.join(DEFAULT_CONFIG_FILENAME),
    ] {
        if fs.exists(&candidate)? {
            found = Some(candidate);
            break;
        }
    }
    let data = if let Some(backed_up) = found {
        write!(out, "{} exists, copy that to ~? <Yes|No>: ", backed_up.display())?;
        out.flush()?;
        if !confirmed(input)? {
            return Err(BackedupError::ConfigNotCreated);
        }
        writeln!(
            out,
            "copying {} config to {}",
            backed_up.display(),
            conf_path.display()
        )?;
        fs.read(&backed_up)
            .map_err(|e| BackedupError::message(format!("read {}: {}", backed_up.display(), e)))?
    } else {
        write!(
            out,
            "{} does not exist, create a default one? <Yes|No>: ",
            conf_path.display()
        )?;
        out.flush()?;
        if !confirmed(input)? {
            return Err(BackedupError::ConfigNotCreated);
        }
        writeln!(out, "creating {}", conf_path.display())?;
        DEFAULT_CONFIG.as_bytes().to_vec()
    };

    if let Some(parent) = conf_path.parent() {
        fs.create_dir_all(parent, DIR_MODE)
            .map_err(|e| BackedupError::message(format!("create {}: {}", parent.display(), e)))?;
    }
    fs.write(conf_path, &data, FILE_MODE)
        .map_err(|e| BackedupError::message(format!("write {}: {}", conf_path.display(), e)))?;
    tracing::info!(path = %conf_path.display(), "config created");
    Ok(())
}

fn confirmed<R: BufRead>(input: &mut R) -> Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().eq_ignore_ascii_case("yes"))
}
