use std::path::PathBuf;

use serde::Deserialize;

/// The YAML document as written by the user, before expansion.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub backup_to: String,
    #[serde(default)]
    pub paths: Vec<String>,
}

/// Fully expanded configuration. Built once per run and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backup_root: PathBuf,
    /// Iteration order for every operation.
    pub paths: Vec<PathBuf>,
}
