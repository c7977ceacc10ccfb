use crate::app_dirs::AppDirs;
use crate::error_filter::DEFAULT_KEYWORDS;
use crate::game::UNKNOWN_LABEL;
use crate::level::{LevelIds, DEFAULT_CAMPAIGN_PREFIX, DEFAULT_REFLEX_LEVEL_ID};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub app_id: String,
    pub campaign_prefix: String,
    pub reflex_level_id: String,
    pub unknown_label: String,
    pub report_dir: Option<PathBuf>,
    pub log_level: String,
    pub suppress_keywords: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: "card-match".to_string(),
            campaign_prefix: DEFAULT_CAMPAIGN_PREFIX.to_string(),
            reflex_level_id: DEFAULT_REFLEX_LEVEL_ID.to_string(),
            unknown_label: UNKNOWN_LABEL.to_string(),
            report_dir: None,
            log_level: "info".to_string(),
            suppress_keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn level_ids(&self) -> LevelIds {
        LevelIds {
            campaign_prefix: self.campaign_prefix.clone(),
            reflex_level_id: self.reflex_level_id.clone(),
        }
    }

    /// Configured report directory, or the platform default
    pub fn report_dir(&self) -> PathBuf {
        self.report_dir
            .clone()
            .or_else(AppDirs::report_dir)
            .unwrap_or_else(|| PathBuf::from("cardtrace_reports"))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Result<Config, ConfigError>;
    fn save(&self, cfg: &Config) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("cardtrace_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// A missing file means defaults; an unreadable or malformed one is an error
    fn load(&self) -> Result<Config, ConfigError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, cfg: &Config) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(io::Error::other)?;
        fs::write(&self.path, data)
    }
}
