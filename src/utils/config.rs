use std::path::PathBuf;
use std::sync::Arc;

use easy_config_store::ConfigStore;
use eyre::Result;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Config = Arc<ConfigInner>;

/// Environment variable holding the language model API key.
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

pub fn config(path: PathBuf) -> Result<Config> {
    let config_store = ConfigStore::<ConfigInner>::read(path, "config".to_string())?;
    let inner = (*config_store).clone();

    info!("config parsing successful");
    debug!("loaded configuration:\n{}", toml::to_string_pretty(&inner)?);

    Ok(Arc::new(inner))
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ConfigInner {
    pub app: AppConfig,
    pub llm: LLMConfig,
    pub portfolio: PortfolioConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_url")]
    pub default_url: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct LLMConfig {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct PortfolioConfig {
    pub source: PathBuf,
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct ScraperConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

fn default_title() -> String {
    "Cold Email Generator".to_string()
}

fn default_url() -> String {
    "https://jobs.nike.com/job/R-39013".to_string()
}

fn default_llm_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_index_path() -> PathBuf {
    PathBuf::from("vectorstore")
}

fn default_collection() -> String {
    "portfolio".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

impl Default for ConfigInner {
    fn default() -> Self {
        let cfg = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.default.toml",));

        toml::from_str(cfg).unwrap() // should be okay
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("API key not found. Please set the {0} environment variable.")]
    MissingCredential(&'static str),
}

/// Secret used to authenticate against the language model endpoint.
///
/// Read once at startup and handed to every client that talks to the model.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Loads `.env` if present, then reads [`API_KEY_VAR`].
    pub fn from_env() -> Result<Self, ConfigurationError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("loaded environment from {}", path.display());
        }

        Self::from_value(std::env::var(API_KEY_VAR).ok())
    }

    fn from_value(value: Option<String>) -> Result<Self, ConfigurationError> {
        match value {
            Some(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(ConfigurationError::MissingCredential(API_KEY_VAR)),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .finish()
    }
}
