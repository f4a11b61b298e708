use std::env;
use std::path::{Path, PathBuf};

use crate::config::model::{Config, ConfigFile};
use crate::error::{BackedupError, ConfigError, Result};
use crate::fs::Filesystem;
use crate::util::paths::{normalize, path_has_parent_dir};

pub fn load_config<F: Filesystem>(fs: &F, path: &Path, home: &Path) -> Result<Config> {
    let data = fs
        .read(path)
        .map_err(|e| BackedupError::message(format!("read {}: {}", path.display(), e)))?;
    let file: ConfigFile =
        serde_yaml::from_slice(&data).map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_config(file, home)
}

/// Expand `$VAR`, `${VAR}` and a leading `~`. `HOME` always resolves to
/// `home`; any other variable comes from the process environment and must be set.
pub fn expand(value: &str, home: &Path) -> std::result::Result<String, ConfigError> {
    let home_str = home.to_string_lossy().into_owned();
    let expanded = shellexpand::env_with_context(value, |var: &str| match var {
        "HOME" => Ok(Some(home_str.clone())),
        _ => env::var(var).map(Some),
    })
    .map_err(|e| ConfigError::Expand(format!("{}: {}", value, e)))?;
    Ok(shellexpand::tilde_with_context(&*expanded, || Some(home_str.as_str())).into_owned())
}

pub fn parse_config(file: ConfigFile, home: &Path) -> Result<Config> {
    if file.backup_to.trim().is_empty() {
        return Err(ConfigError::Invalid("backup_to is required".to_string()).into());
    }
    let backup_root = expand_path("backup_to", &file.backup_to, home)?;

    let mut paths = Vec::with_capacity(file.paths.len());
    for (idx, raw) in file.paths.iter().enumerate() {
        if raw.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("paths[{}] is empty", idx)).into());
        }
        paths.push(expand_path(&format!("paths[{}]", idx), raw, home)?);
    }

    Ok(Config { backup_root, paths })
}

fn expand_path(field: &str, raw: &str, home: &Path) -> Result<PathBuf> {
    let expanded = PathBuf::from(expand(raw, home)?);
    if !expanded.is_absolute() {
        return Err(ConfigError::Invalid(format!(
            "{} {}: path must be absolute",
            field,
            expanded.display()
        ))
        .into());
    }
    if path_has_parent_dir(&expanded) {
        return Err(ConfigError::Invalid(format!(
            "{} {}: path must not contain ..",
            field,
            expanded.display()
        ))
        .into());
    }
    Ok(normalize(&expanded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::DEFAULT_CONFIG;
    use crate::fs::{MemFs, DIR_MODE, FILE_MODE};

    fn home() -> PathBuf {
        PathBuf::from("/home/user")
    }

    fn write_config(fs: &MemFs, yaml: &str) -> PathBuf {
        let path = PathBuf::from("/home/user/.backedup.yaml");
        fs.create_dir_all(&home(), DIR_MODE).expect("mkdir");
        fs.write(&path, yaml.as_bytes(), FILE_MODE).expect("write");
        path
    }

    #[test]
    fn load_config_expands_home_and_keeps_order() {
        let fs = MemFs::new();
        let path = write_config(
            &fs,
            r#"
backup_to: $HOME/Dropbox/backedup
paths:
  - $HOME/.zshrc
  - /etc/hosts
  - ${HOME}/.vim/
  - ~/.ssh
"#,
        );
        let cfg = load_config(&fs, &path, &home()).expect("load");
        assert_eq!(cfg.backup_root, PathBuf::from("/home/user/Dropbox/backedup"));
        assert_eq!(
            cfg.paths,
            vec![
                PathBuf::from("/home/user/.zshrc"),
                PathBuf::from("/etc/hosts"),
                PathBuf::from("/home/user/.vim"),
                PathBuf::from("/home/user/.ssh"),
            ]
        );
    }

    #[test]
    fn default_config_loads() {
        let fs = MemFs::new();
        let path = write_config(&fs, DEFAULT_CONFIG);
        let cfg = load_config(&fs, &path, &home()).expect("load");
        assert_eq!(cfg.backup_root, PathBuf::from("/home/user/Dropbox/backedup"));
        assert_eq!(cfg.paths.first(), Some(&PathBuf::from("/home/user/.ackrc")));
        assert!(cfg
            .paths
            .contains(&PathBuf::from("/Library/Application Support/Sequel Pro/Data")));
    }

    #[test]
    fn undefined_variable_is_an_error() {
        let file = ConfigFile {
            backup_to: "$BACKEDUP_TEST_SURELY_UNSET_VAR/bk".to_string(),
            paths: Vec::new(),
        };
        let err = parse_config(file, &home()).unwrap_err();
        assert!(matches!(err, BackedupError::Config(ConfigError::Expand(_))));
    }

    #[test]
    fn relative_and_dotdot_paths_are_rejected() {
        for bad in ["relative/path", "/home/user/../other"] {
            let file = ConfigFile {
                backup_to: "/bk".to_string(),
                paths: vec![bad.to_string()],
            };
            let err = parse_config(file, &home()).unwrap_err();
            assert!(
                matches!(err, BackedupError::Config(ConfigError::Invalid(_))),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn missing_backup_to_is_rejected() {
        let fs = MemFs::new();
        let path = write_config(&fs, "paths:\n  - /etc/hosts\n");
        let err = load_config(&fs, &path, &home()).unwrap_err();
        assert_eq!(err.to_string(), "backup_to is required");
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let fs = MemFs::new();
        let path = write_config(&fs, "backup_to: [unterminated\n");
        let err = load_config(&fs, &path, &home()).unwrap_err();
        assert!(matches!(err, BackedupError::Config(ConfigError::Parse(_))));
    }
}
