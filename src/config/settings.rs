use std::{
    collections::HashMap,
    fs,
    io::Cursor,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};

use super::loader::LoadedConfig;
use crate::compare::CompareMode;
use crate::workbench::DEFAULT_GROUP;

pub type EnvMap = HashMap<String, String>;

/// Environment variable (process or dotenv file) holding the override token.
pub const TOKEN_VAR: &str = "CURLDIFF_TOKEN";

const DEFAULT_SESSION_FILE: &str = ".curldiff/session.json";
const DEFAULT_ARCHIVE_DIR: &str = ".curldiff/archive";

fn resolve_relative(base: &Path, value: &str) -> PathBuf {
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn load_env_file(path: &Path, env: &mut EnvMap) -> Result<PathBuf> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading env file {}", path.display()))?;
    let iter = dotenvy::from_read_iter(Cursor::new(content));

    for item in iter {
        let (key, value) = item.with_context(|| format!("parsing env file {}", path.display()))?;
        env.insert(key, value);
    }

    Ok(path.to_path_buf())
}

/// Everything the CLI needs, resolved to absolute paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub session_file: PathBuf,
    pub archive_dir: PathBuf,
    pub default_group: String,
    pub override_token: Option<String>,
    pub concurrency: Option<usize>,
    pub timeout: Option<Duration>,
    pub compare_mode: CompareMode,
    pub env_files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    base_dir: PathBuf,
    config: Option<LoadedConfig>,
    explicit_env: Option<PathBuf>,
    explicit_session: Option<PathBuf>,
    explicit_token: Option<String>,
    process_token: Option<String>,
}

impl SettingsBuilder {
    pub fn new(base_dir: PathBuf, config: Option<LoadedConfig>) -> Self {
        Self {
            base_dir,
            config,
            explicit_env: None,
            explicit_session: None,
            explicit_token: None,
            process_token: None,
        }
    }

    pub fn env_file(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_env = path;
        self
    }

    pub fn session_file(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_session = path;
        self
    }

    pub fn token(mut self, token: Option<String>) -> Self {
        self.explicit_token = token;
        self
    }

    /// Token taken from the process environment.
    pub fn process_token(mut self, token: Option<String>) -> Self {
        self.process_token = token;
        self
    }

    pub fn build(&self) -> Result<Settings> {
        let config = self.config.as_ref();
        let config_dir = config
            .map(|loaded| loaded.dir.clone())
            .unwrap_or_else(|| self.base_dir.clone());

        let mut dotenv = EnvMap::new();
        let mut env_files = Vec::new();
        let env_path = match &self.explicit_env {
            Some(explicit) => Some(explicit.clone()),
            None => config
                .and_then(|loaded| loaded.config.env.as_deref())
                .map(|env| resolve_relative(&config_dir, env)),
        };
        if let Some(env_path) = env_path {
            env_files.push(load_env_file(&env_path, &mut dotenv)?);
        }

        let override_token = non_empty(self.explicit_token.as_deref())
            .or_else(|| non_empty(self.process_token.as_deref()))
            .or_else(|| non_empty(dotenv.get(TOKEN_VAR).map(String::as_str)))
            .or_else(|| non_empty(config.and_then(|c| c.config.override_token.as_deref())));

        let session_file = self.explicit_session.clone().unwrap_or_else(|| {
            config
                .and_then(|loaded| loaded.config.session_file.as_deref())
                .map(|file| resolve_relative(&config_dir, file))
                .unwrap_or_else(|| self.base_dir.join(DEFAULT_SESSION_FILE))
        });

        let archive_dir = config
            .and_then(|loaded| loaded.config.archive_dir.as_deref())
            .map(|dir| resolve_relative(&config_dir, dir))
            .unwrap_or_else(|| self.base_dir.join(DEFAULT_ARCHIVE_DIR));

        let default_group = non_empty(config.and_then(|c| c.config.default_group.as_deref()))
            .unwrap_or_else(|| DEFAULT_GROUP.to_string());

        Ok(Settings {
            session_file,
            archive_dir,
            default_group,
            override_token,
            concurrency: config
                .and_then(|loaded| loaded.config.concurrency)
                .filter(|limit| *limit > 0),
            timeout: config
                .and_then(|loaded| loaded.config.timeout_secs)
                .map(Duration::from_secs),
            compare_mode: config
                .and_then(|loaded| loaded.config.compare_mode)
                .unwrap_or_default(),
            env_files,
        })
    }
}
