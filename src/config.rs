use crate::activities::DEFAULT_RECENT_LIMIT;
use crate::errors::{AppError, AppResult};
use crate::search::DEFAULT_LIMIT;
use crate::stats::DEFAULT_COST_PER_TOKEN;
use crate::tasks::DEFAULT_LIST_LIMIT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const HOME_ENV: &str = "MISSION_CONTROL_HOME";
pub const CONFIG_ENV: &str = "MISSION_CONTROL_CONFIG";
const DATA_DIR_NAME: &str = ".mission-control";
const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    pub default_limit: usize,
    /// Trimmed queries shorter than this return nothing without reading the store.
    pub min_query_length: usize,
    pub record_history: bool,
    pub suggestion_limit: usize,
    pub suggestion_scan: usize,
    pub history_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            min_query_length: 3,
            record_history: true,
            suggestion_limit: 5,
            suggestion_scan: 100,
            history_limit: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityConfig {
    pub cost_per_token: f64,
    pub recent_limit: usize,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            cost_per_token: DEFAULT_COST_PER_TOKEN,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskConfig {
    pub list_limit: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Filled from the environment, never from the file.
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub database_file: PathBuf,
    pub log_dir: PathBuf,
    pub search: SearchConfig,
    pub activity: ActivityConfig,
    pub tasks: TaskConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            database_file: PathBuf::from("state.sqlite"),
            log_dir: PathBuf::from("logs"),
            search: SearchConfig::default(),
            activity: ActivityConfig::default(),
            tasks: TaskConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolves the data directory and config file from the environment and
    /// reads the file when present.
    pub fn load() -> AppResult<Self> {
        let data_dir = std::env::var_os(HOME_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        Self::load_in(data_dir)
    }

    /// Like [`AppConfig::load`] with the data directory already chosen.
    pub fn load_in(data_dir: PathBuf) -> AppResult<Self> {
        let config_path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(CONFIG_FILE_NAME));
        Self::load_from(data_dir, &config_path)
    }

    /// A missing file yields the defaults.
    pub fn load_from(data_dir: PathBuf, config_path: &Path) -> AppResult<Self> {
        let mut config = if config_path.exists() {
            let raw = fs::read_to_string(config_path)?;
            if raw.trim().is_empty() {
                Self::default()
            } else {
                serde_yaml::from_str::<Self>(&raw)?
            }
        } else {
            Self::default()
        };
        config.data_dir = data_dir;
        config.validate()?;
        Ok(config)
    }

    /// Defaults rooted at `data_dir`; used by tests and embedders.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.search.default_limit == 0 {
            return Err(AppError::Validation("search.defaultLimit must be at least 1".to_string()));
        }
        if self.search.min_query_length == 0 {
            return Err(AppError::Validation("search.minQueryLength must be at least 1".to_string()));
        }
        let rate = self.activity.cost_per_token;
        if !rate.is_finite() || rate < 0.0 {
            return Err(AppError::Validation(format!(
                "activity.costPerToken must be a non-negative number, got {rate}"
            )));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.resolve(&self.database_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.resolve(&self.log_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join(DATA_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(DATA_DIR_NAME))
}
