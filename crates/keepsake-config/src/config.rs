//! Application configuration: TOML file plus environment overrides.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_RELAY_URL: &str = "http://127.0.0.1:8710/api/generate-recap";
pub const DEFAULT_RECAP_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_RECAP_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Credentials for the remote entry store. All-or-nothing: a partial set
/// counts as unconfigured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub api_key: String,
    pub project_id: String,
    /// Defaults to the conventional URL derived from the project id.
    #[serde(default)]
    pub database_url: String,
}

impl RemoteConfig {
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        let database_url = default_database_url(&project_id);
        Self {
            api_key: api_key.into(),
            project_id,
            database_url,
        }
    }

    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    fn fill_defaults(&mut self) {
        if self.database_url.is_empty() {
            self.database_url = default_database_url(&self.project_id);
        }
    }
}

fn default_database_url(project_id: &str) -> String {
    format!("https://{project_id}-default-rtdb.firebaseio.com")
}

/// Local cache location and write quota.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub data_dir: PathBuf,
    pub quota_bytes: u64,
}

impl Default for LocalConfig {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("", "", "keepsake")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".keepsake"));
        Self {
            data_dir,
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

/// Where the recap client sends its requests and what it asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecapConfig {
    pub relay_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for RecapConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            model: DEFAULT_RECAP_MODEL.to_string(),
            max_tokens: DEFAULT_RECAP_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub remote: Option<RemoteConfig>,
    pub local: LocalConfig,
    pub recap: RecapConfig,
}

impl AppConfig {
    /// Load configuration: `KEEPSAKE_CONFIG` (or the platform config dir)
    /// for the TOML file, then environment overrides on top. A missing
    /// file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("KEEPSAKE_CONFIG")
            .map(PathBuf::from)
            .or_else(default_config_path);
        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&text)?;
        if let Some(remote) = config.remote.as_mut() {
            remote.fill_defaults();
        }
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Environment variables win over the file.
    fn apply_env(&mut self) {
        let api_key = std::env::var("KEEPSAKE_REMOTE_API_KEY").ok();
        let project_id = std::env::var("KEEPSAKE_REMOTE_PROJECT_ID").ok();
        if let (Some(api_key), Some(project_id)) = (api_key, project_id) {
            let mut remote = RemoteConfig::new(api_key, project_id);
            if let Ok(url) = std::env::var("KEEPSAKE_REMOTE_DATABASE_URL") {
                remote = remote.with_database_url(url);
            }
            self.remote = Some(remote);
        }

        if let Some(dir) = std::env::var_os("KEEPSAKE_DATA_DIR") {
            self.local.data_dir = PathBuf::from(dir);
        }
        if let Ok(quota) = std::env::var("KEEPSAKE_LOCAL_QUOTA_BYTES") {
            match quota.parse() {
                Ok(bytes) => self.local.quota_bytes = bytes,
                Err(_) => {
                    tracing::warn!(value = %quota, "ignoring unparseable KEEPSAKE_LOCAL_QUOTA_BYTES")
                }
            }
        }
        if let Ok(url) = std::env::var("KEEPSAKE_RELAY_URL") {
            self.recap.relay_url = url;
        }
    }

    /// Remote credentials present?
    pub fn remote_configured(&self) -> bool {
        self.remote.is_some()
    }
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "keepsake").map(|dirs| dirs.config_dir().join("keepsake.toml"))
}
