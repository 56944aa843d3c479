use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::compare::CompareMode;

pub const CONFIG_FILE: &str = "curldiff.json";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CurldiffConfig {
    pub override_token: Option<String>,
    /// Dotenv file, relative to the config directory.
    pub env: Option<String>,
    pub session_file: Option<String>,
    pub archive_dir: Option<String>,
    pub default_group: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub compare_mode: Option<CompareMode>,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: CurldiffConfig,
    pub path: PathBuf,
    pub dir: PathBuf,
}

/// Reads `curldiff.json` from `target`, which is either the file itself or
/// the directory holding it. A missing file is not an error.
pub fn load_config(target: &Path) -> Result<Option<LoadedConfig>> {
    let cwd = std::env::current_dir()?;
    let resolved = if target.is_absolute() {
        target.to_path_buf()
    } else {
        cwd.join(target)
    };

    let (file_path, dir) = if resolved.is_dir() {
        (resolved.join(CONFIG_FILE), resolved)
    } else {
        let dir = resolved.parent().map(Path::to_path_buf).unwrap_or(cwd);
        (resolved, dir)
    };

    if !file_path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&file_path)
        .with_context(|| format!("reading config {}", file_path.display()))?;

    let config: CurldiffConfig = serde_json::from_str(&contents)
        .with_context(|| format!("parsing config {}", file_path.display()))?;

    Ok(Some(LoadedConfig {
        config,
        path: file_path,
        dir,
    }))
}
