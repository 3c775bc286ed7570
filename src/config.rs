use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_API_BASE: &str = "https://api.trello.com/1";
pub const DEFAULT_AUTHORIZE_URL: &str = "https://trello.com/1/authorize";
pub const DEFAULT_APP_NAME: &str = "ChatGPT Connector";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Configuration file not found at {path}: {reason}")]
    FileNotFound { path: String, reason: String },

    #[error("Invalid session key: {0}")]
    InvalidSessionKey(String),

    #[error("Invalid number for {name}: {value}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::error::Error),
}

/// Configuration file format (for deserialization)
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    api_key: String,
    #[serde(default)]
    api_secret: Option<String>,
    base_url: String,
    #[serde(default)]
    port: Option<u16>,
    /// 32-byte hex string
    #[serde(default)]
    session_key: Option<String>,
    #[serde(default)]
    api_base: Option<String>,
    #[serde(default)]
    authorize_url: Option<String>,
    #[serde(default)]
    app_name: Option<String>,
    #[serde(default)]
    session_capacity: Option<usize>,
}

/// Configuration for the Trello connector
#[derive(Debug, Clone)]
pub struct Config {
    /// Trello API key, sent as the `key` query parameter on every upstream call
    pub api_key: String,

    /// Trello API secret. Not used by the token flow.
    pub api_secret: Option<String>,

    /// Public root of this deployment, without trailing slash
    pub base_url: String,

    /// HTTP listen port
    pub port: u16,

    /// Key for session cookie encryption (32 bytes)
    pub session_key: [u8; 32],

    /// Trello REST root
    pub api_base: String,

    /// Trello authorization page
    pub authorize_url: String,

    /// Application name shown on the Trello consent page
    pub app_name: String,

    /// Maximum number of sessions kept in memory
    pub session_capacity: usize,
}

impl Config {
    /// Build a configuration with defaults for everything but the required settings.
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, ConfigError> {
        Ok(Config {
            api_key: api_key.into(),
            api_secret: None,
            base_url: Self::normalize_base_url(base_url)?,
            port: DEFAULT_PORT,
            session_key: Self::random_session_key(),
            api_base: DEFAULT_API_BASE.to_string(),
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            app_name: DEFAULT_APP_NAME.to_string(),
            session_capacity: DEFAULT_SESSION_CAPACITY,
        })
    }

    /// Load from environment variables (and `.env`), falling back to the config file
    /// when `TRELLO_KEY` is not set.
    pub fn from_env_or_file() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        if std::env::var("TRELLO_KEY").is_ok() {
            Self::from_env()
        } else {
            Self::from_file()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("TRELLO_KEY").map_err(|_| ConfigError::Missing("TRELLO_KEY"))?;
        let base_url = std::env::var("BASE_URL").map_err(|_| ConfigError::Missing("BASE_URL"))?;

        let mut config = Config::new(api_key, &base_url)?;
        config.api_secret = std::env::var("TRELLO_SECRET").ok();

        if let Ok(port) = std::env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { name: "PORT", value: port })?;
        }

        match std::env::var("SESSION_KEY") {
            Ok(key) => config.session_key = Self::parse_session_key(&key)?,
            Err(_) => warn!("SESSION_KEY not set, sessions will not survive a restart"),
        }

        if let Ok(api_base) = std::env::var("TRELLO_API_BASE") {
            config.api_base = Self::normalize_base_url(&api_base)?;
        }
        if let Ok(authorize_url) = std::env::var("TRELLO_AUTHORIZE_URL") {
            url::Url::parse(&authorize_url)?;
            config.authorize_url = authorize_url;
        }
        if let Ok(app_name) = std::env::var("TRELLO_APP_NAME") {
            config.app_name = app_name;
        }
        if let Ok(capacity) = std::env::var("SESSION_CAPACITY") {
            config.session_capacity = capacity.parse().map_err(|_| ConfigError::InvalidNumber {
                name: "SESSION_CAPACITY",
                value: capacity,
            })?;
        }

        Ok(config)
    }

    /// Load configuration from ~/.config/mcp/trello-mcp-connector/config.json
    pub fn from_file() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;

        let contents = fs::read_to_string(&config_path).map_err(|e| ConfigError::FileNotFound {
            path: config_path.display().to_string(),
            reason: format!(
                "{}. Either set TRELLO_KEY and BASE_URL in the environment or create \
                 the file with at least \"api_key\" and \"base_url\".",
                e
            ),
        })?;

        Self::from_json(&contents)
    }

    fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = serde_json::from_str(contents)?;

        let mut config = Config::new(file.api_key, &file.base_url)?;
        config.api_secret = file.api_secret;
        config.port = file.port.unwrap_or(DEFAULT_PORT);
        match file.session_key {
            Some(key) => config.session_key = Self::parse_session_key(&key)?,
            None => warn!("session_key not set, sessions will not survive a restart"),
        }
        if let Some(api_base) = file.api_base {
            config.api_base = Self::normalize_base_url(&api_base)?;
        }
        if let Some(authorize_url) = file.authorize_url {
            url::Url::parse(&authorize_url)?;
            config.authorize_url = authorize_url;
        }
        if let Some(app_name) = file.app_name {
            config.app_name = app_name;
        }
        if let Some(capacity) = file.session_capacity {
            config.session_capacity = capacity;
        }

        Ok(config)
    }

    /// Get the configuration file path: ~/.config/mcp/trello-mcp-connector/config.json
    fn get_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::home_dir()
            .map(|home| home.join(".config/mcp/trello-mcp-connector"))
            .ok_or_else(|| ConfigError::FileNotFound {
                path: "~/.config/mcp/trello-mcp-connector/config.json".to_string(),
                reason: "Could not determine home directory".to_string(),
            })?;

        Ok(config_dir.join("config.json"))
    }

    /// URL Trello sends the browser back to after authorization
    pub fn callback_url(&self) -> String {
        format!("{}/callback", self.base_url)
    }

    /// Scheme of the configured public root ("http" or "https")
    pub fn base_scheme(&self) -> &str {
        self.base_url.split_once("://").map(|(s, _)| s).unwrap_or("https")
    }

    fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
        let trimmed = raw.trim().trim_end_matches('/');
        url::Url::parse(trimmed)?;
        Ok(trimmed.to_string())
    }

    /// Parse session key from hex string (must be 32 bytes)
    fn parse_session_key(hex_str: &str) -> Result<[u8; 32], ConfigError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| ConfigError::InvalidSessionKey(format!("Invalid hex: {}", e)))?;

        if bytes.len() != 32 {
            return Err(ConfigError::InvalidSessionKey(format!(
                "Expected 32 bytes, got {}",
                bytes.len()
            )));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(key)
    }

    fn random_session_key() -> [u8; 32] {
        rand::thread_rng().gen()
    }
}
