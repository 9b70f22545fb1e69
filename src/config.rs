//! Portal list configuration.
//!
//! Configuration is stored as YAML (by default in the platform config
//! directory, `hirelist/config.yaml`) and includes:
//! - Data API base URL and token
//! - Request timeout for the HTTP transport
//! - Search debounce delay and default page size
//! - URL history policy
//! - Location of the UI preference file

use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{ListError, Result};
use crate::list::url_binding::HistoryPolicy;

const TOKEN_ENV: &str = "HIRELIST_API_TOKEN";

/// Main configuration structure
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the data API, e.g. `https://portal.example.com/api`
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer token for the data API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Request timeout in seconds (default: 30, 0 = no timeout)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Quiet period before a typed search is committed (default: 300)
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Page size used when neither the URL nor a stored preference sets one
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// How settled state changes are written to browser history
    #[serde(default)]
    pub history_policy: HistoryPolicy,

    /// Where UI preferences (view mode, page size) are persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_path: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_search_debounce_ms() -> u64 {
    300
}

fn default_page_size() -> u32 {
    crate::query::DEFAULT_PAGE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_token: None,
            request_timeout: default_request_timeout(),
            search_debounce_ms: default_search_debounce_ms(),
            default_page_size: default_page_size(),
            history_policy: HistoryPolicy::default(),
            preferences_path: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .field("search_debounce_ms", &self.search_debounce_ms)
            .field("default_page_size", &self.default_page_size)
            .field("history_policy", &self.history_policy)
            .field("preferences_path", &self.preferences_path)
            .finish()
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "hirelist")
}

impl Config {
    /// Default location of the config file, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Load configuration from file, or return default if not found
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ListError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ListError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(path, content).map_err(|e| {
            ListError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // The file may hold an API token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(path, permissions)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(ListError::Config(
                "default_page_size must be at least 1".to_string(),
            ));
        }
        url::Url::parse(&self.api_base_url)?;
        Ok(())
    }

    /// Get the API token from the environment or the config file
    pub fn api_token(&self) -> Option<String> {
        if let Ok(token) = env::var(TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }

        self.api_token.clone()
    }

    /// Request timeout for the HTTP transport; `None` when disabled
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout > 0).then(|| Duration::from_secs(self.request_timeout))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Configured preference file, falling back to the platform data dir
    pub fn preferences_path(&self) -> Option<PathBuf> {
        self.preferences_path.clone().or_else(|| {
            project_dirs().map(|dirs| dirs.data_dir().join("preferences.yaml"))
        })
    }
}
