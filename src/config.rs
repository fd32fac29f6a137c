use crate::api::DEFAULT_API_URL;
use crate::cache::{create_cache, Cache, CacheError, CacheType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "TODOSYNC_CONFIG";
/// Environment variable overriding `api.url` at runtime.
pub const API_URL_ENV: &str = "TODOSYNC_API_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

const VALID_CACHE_TYPES: &[&str] = &["json", "sqlite"];
pub const KEYS: &[&str] = &["api.url", "cache.type", "cache.path"];

fn validate_cache_path(path: &str) -> Result<PathBuf, ConfigError> {
    if path.contains('\0') {
        return Err(ConfigError::InvalidConfig(
            "Path contains invalid characters".to_string(),
        ));
    }
    if path.trim().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "Path cannot be empty".to_string(),
        ));
    }

    let path = PathBuf::from(shellexpand::tilde(path).into_owned());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ConfigError::InvalidConfig(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            if let Ok(metadata) = parent.metadata() {
                if metadata.mode() & 0o200 == 0 {
                    return Err(ConfigError::InvalidConfig(format!(
                        "Directory is not writable: {}",
                        parent.display()
                    )));
                }
            }
        }
    }

    Ok(path)
}

fn validate_cache_type(value: &str) -> Result<(), ConfigError> {
    if !VALID_CACHE_TYPES.contains(&value) {
        return Err(ConfigError::InvalidConfig(format!(
            "cache.type must be one of: {}",
            VALID_CACHE_TYPES.join(", ")
        )));
    }
    Ok(())
}

fn validate_api_url(value: &str) -> Result<(), ConfigError> {
    let url = reqwest::Url::parse(value)
        .map_err(|e| ConfigError::InvalidConfig(format!("api.url is not a valid URL: {}", e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidConfig(
            "api.url must use http or https".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub cache_type: Option<String>,
    #[serde(default)]
    pub cache_path: Option<String>,
}

impl Config {
    pub fn with_defaults() -> Self {
        Self {
            api_url: Some(DEFAULT_API_URL.to_string()),
            cache_type: default_cache_type(),
            cache_path: default_cache_path(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.api_url {
            validate_api_url(url)?;
        }
        if let Some(ref cache_type) = self.cache_type {
            validate_cache_type(cache_type)?;
        }
        if let Some(ref path) = self.cache_path {
            validate_cache_path(path)?;
        }
        Ok(())
    }
}

fn default_cache_type() -> Option<String> {
    Some(CacheType::Json.as_str().to_string())
}

fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("todosync"))
}

fn default_cache_path() -> Option<String> {
    config_dir().map(|dir| dir.join("cache.json").to_string_lossy().to_string())
}

/// Location of the config file: explicit path, then `TODOSYNC_CONFIG`, then the
/// per-user default.
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(shellexpand::tilde(&path).into_owned()));
        }
    }
    config_dir()
        .map(|dir| dir.join("config.json"))
        .ok_or_else(|| ConfigError::InvalidConfig("Could not determine home directory".to_string()))
}

/// Reads and writes the JSON config file.
///
/// Only explicitly set values are stored; everything else falls back to
/// [`Config::with_defaults`].
pub struct ConfigManager {
    path: PathBuf,
    config: Config,
}

impl ConfigManager {
    pub fn new(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = resolve_config_path(config_path)?;
        Self::load(path)
    }

    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                Config::default()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            Config::default()
        };
        Ok(Self { path, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.config)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Explicitly set value for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api.url" => self.config.api_url.clone(),
            "cache.type" => self.config.cache_type.clone(),
            "cache.path" => self.config.cache_path.clone(),
            _ => None,
        }
    }

    /// Set value for `key`, or its default.
    pub fn get_or_default(&self, key: &str) -> Option<String> {
        self.get(key).or_else(|| {
            let defaults = Config::with_defaults();
            match key {
                "api.url" => defaults.api_url,
                "cache.type" => defaults.cache_type,
                "cache.path" => defaults.cache_path,
                _ => None,
            }
        })
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut config = self.config.clone();

        match key {
            "api.url" => {
                let value = value.trim_end_matches('/');
                validate_api_url(value)?;
                config.api_url = Some(value.to_string());
            }
            "cache.type" => {
                validate_cache_type(value)?;
                config.cache_type = Some(value.to_string());
            }
            "cache.path" => {
                let path = validate_cache_path(value)?;
                config.cache_path = Some(path.to_string_lossy().to_string());
            }
            _ => {
                return Err(ConfigError::InvalidKey(key.to_string()));
            }
        }
        config.validate()?;
        self.config = config;
        self.save()
    }

    pub fn unset(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "api.url" => self.config.api_url = None,
            "cache.type" => self.config.cache_type = None,
            "cache.path" => self.config.cache_path = None,
            _ => return Err(ConfigError::InvalidKey(key.to_string())),
        }
        self.save()
    }

    /// Defaults first (flagged `true`), then any explicitly set values.
    pub fn list(&self) -> Vec<(String, String, bool)> {
        let defaults = Config::with_defaults();
        let mut list = vec![
            (
                "api.url".to_string(),
                defaults.api_url.unwrap_or_else(|| "null".to_string()),
                true,
            ),
            (
                "cache.type".to_string(),
                defaults.cache_type.unwrap_or_else(|| "null".to_string()),
                true,
            ),
            (
                "cache.path".to_string(),
                defaults.cache_path.unwrap_or_else(|| "null".to_string()),
                true,
            ),
        ];

        for key in KEYS {
            if let Some(value) = self.get(key) {
                list.push((key.to_string(), value, false));
            }
        }
        list
    }

    /// Effective API base URL; `TODOSYNC_API_URL` wins over the file.
    pub fn api_url(&self) -> String {
        std::env::var(API_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.get_or_default("api.url"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn cache_type(&self) -> Result<CacheType, ConfigError> {
        let value = self
            .get_or_default("cache.type")
            .unwrap_or_else(|| CacheType::Json.as_str().to_string());
        Ok(value.parse()?)
    }

    pub fn cache_path(&self) -> Result<PathBuf, ConfigError> {
        self.get_or_default("cache.path")
            .map(|p| PathBuf::from(shellexpand::tilde(&p).into_owned()))
            .ok_or_else(|| ConfigError::InvalidConfig("Cache path not configured".to_string()))
    }

    pub fn create_cache(&self) -> Result<Box<dyn Cache>, ConfigError> {
        let cache_type = self.cache_type()?;
        let path = self.cache_path()?;
        Ok(create_cache(cache_type, &path)?)
    }
}
