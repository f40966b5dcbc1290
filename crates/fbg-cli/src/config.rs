//! CLI settings.
//!
//! Settings are read from `--config` or from `settings.toml` in the platform
//! config directory. Every section is optional and falls back to defaults;
//! [`Settings::validate`] reports what is still missing.

use std::path::{Path, PathBuf};
use std::time::Duration;

use fbg_model::{ColumnDef, GridLayout, LayoutError};
use fbg_store::{StoreConfig, StoreError};
use fbg_sync::{
    DEFAULT_MAX_CONFLICT_RETRIES, DEFAULT_PRESENCE_TTL, SessionConfig, WriteConfig,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings error.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("Failed to read settings file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for [`Settings`].
    #[error("Invalid settings file: {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A required value is not set.
    #[error("Missing setting: {0}")]
    Missing(&'static str),

    /// A value is out of range.
    #[error("Invalid setting: {0}")]
    Invalid(String),

    /// The column layout is inconsistent.
    #[error("Invalid column layout: {0}")]
    Layout(#[from] LayoutError),

    /// The store section is unusable.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConfigError {
    /// Get a user-friendly message for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Read { path, .. } => format!("Could not read settings at {}", path.display()),
            Self::Parse { path, source } => {
                format!("Settings at {} are not valid: {}", path.display(), source)
            }
            Self::Missing(name) => format!("Please set `{name}` in the settings file."),
            Self::Invalid(detail) => format!("Invalid setting: {detail}"),
            Self::Layout(e) => format!("The column layout is invalid: {e}"),
            Self::Store(e) => e.to_string(),
        }
    }
}

/// Settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Annotation store connection.
    pub store: StoreConfig,
    /// Dataset and column layout.
    pub dataset: DatasetSettings,
    /// Paging and refresh.
    pub grid: GridSettings,
    /// Batch write tuning.
    pub writer: WriterSettings,
    /// Edit presence.
    pub presence: PresenceSettings,
    /// Who is editing.
    pub identity: IdentitySettings,
    /// Durable edit mirror.
    pub mirror: MirrorSettings,
}

/// Dataset and column layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    /// Dataset id; defaults to the CSV file stem.
    pub id: Option<String>,
    /// Column holding the natural key.
    pub key_column: String,
    /// Dimension columns.
    pub dimensions: Vec<String>,
    /// Measure columns.
    pub measures: Vec<String>,
    /// Annotation columns.
    pub overlays: Vec<String>,
}

/// Paging and refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub page_size: usize,
    /// Annotation poll interval; 0 disables polling.
    pub refresh_interval_secs: u64,
    pub post_save_refresh_ms: u64,
    pub navigation_guard_ms: u64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            page_size: 100,
            refresh_interval_secs: 30,
            post_save_refresh_ms: 1500,
            navigation_guard_ms: 2000,
        }
    }
}

/// Batch write tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    pub pacing_ms: u64,
    pub max_conflict_retries: u32,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            pacing_ms: 150,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

/// Edit presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenceSettings {
    pub ttl_secs: u64,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_PRESENCE_TTL.as_secs(),
        }
    }
}

/// Who is editing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySettings {
    /// User name; defaults to `$USER`.
    pub user: Option<String>,
}

/// Durable edit mirror.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorSettings {
    /// Mirror file; defaults to the platform data directory.
    pub path: Option<PathBuf>,
}

impl Settings {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    tracing::debug!("No settings at {}; using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load settings from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let settings = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "FeedbackGrid", "fbg")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }

    /// Check that the settings describe a usable grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset.key_column.trim().is_empty() {
            return Err(ConfigError::Missing("dataset.key_column"));
        }
        if self.dataset.overlays.is_empty() {
            return Err(ConfigError::Missing("dataset.overlays"));
        }
        if self.grid.page_size == 0 {
            return Err(ConfigError::Invalid("grid.page_size must be positive".to_string()));
        }
        self.store.validate()?;
        self.layout()?;
        Ok(())
    }

    /// Column layout of the grid.
    pub fn layout(&self) -> Result<GridLayout, ConfigError> {
        let columns = |ids: &[String]| ids.iter().map(ColumnDef::new).collect::<Vec<_>>();
        Ok(GridLayout::new(
            columns(&self.dataset.dimensions),
            columns(&self.dataset.measures),
            columns(&self.dataset.overlays),
            self.dataset.key_column.clone(),
        )?)
    }

    /// Dataset id, falling back to the stem of `csv`.
    pub fn dataset_id(&self, csv: Option<&Path>) -> Result<String, ConfigError> {
        self.dataset
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| {
                csv.and_then(Path::file_stem)
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .ok_or(ConfigError::Missing("dataset.id"))
    }

    /// Editing user.
    pub fn user(&self) -> String {
        self.identity
            .user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .or_else(|| std::env::var("USERNAME").ok())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    /// Edit mirror file.
    pub fn mirror_path(&self) -> PathBuf {
        self.mirror.path.clone().unwrap_or_else(|| {
            directories::ProjectDirs::from("com", "FeedbackGrid", "fbg")
                .map(|dirs| dirs.data_dir().join(fbg_persistence::MIRROR_FILE_NAME))
                .unwrap_or_else(|| PathBuf::from(fbg_persistence::MIRROR_FILE_NAME))
        })
    }

    /// Session tuning derived from these settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            page_size: self.grid.page_size,
            guard_delay: Duration::from_millis(self.grid.navigation_guard_ms),
            refresh_interval: (self.grid.refresh_interval_secs > 0)
                .then(|| Duration::from_secs(self.grid.refresh_interval_secs)),
            post_save_refresh: Duration::from_millis(self.grid.post_save_refresh_ms),
            write: WriteConfig {
                pacing: Duration::from_millis(self.writer.pacing_ms),
                max_conflict_retries: self.writer.max_conflict_retries,
            },
            presence_ttl: Duration::from_secs(self.presence.ttl_secs),
        }
    }
}
