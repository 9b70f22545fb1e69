use thiserror::Error;

#[derive(Error, Debug)]
pub enum ListError {
    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    #[error("filter '{key}' expects {expected}")]
    FilterType { key: String, expected: &'static str },

    #[error("invalid sort order '{0}'")]
    InvalidSortOrder(String),

    #[error("invalid view mode '{0}'")]
    InvalidViewMode(String),

    #[error("invalid history policy '{0}'")]
    InvalidHistoryPolicy(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("API error ({status}): {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("list screen is no longer mounted")]
    Unmounted,
}

impl ListError {
    /// Whether the failure is worth offering a retry for (timeouts, connection
    /// failures, 5xx). The controller itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            ListError::Api { status, .. } => status.is_server_error(),
            ListError::Http(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.status().is_some_and(|s| s.is_server_error())
            }
            _ => false,
        }
    }

    pub fn invalid_sort_order(s: String) -> Self {
        ListError::InvalidSortOrder(s)
    }

    pub fn invalid_view_mode(s: String) -> Self {
        ListError::InvalidViewMode(s)
    }

    pub fn invalid_history_policy(s: String) -> Self {
        ListError::InvalidHistoryPolicy(s)
    }
}

pub type Result<T> = std::result::Result<T, ListError>;
