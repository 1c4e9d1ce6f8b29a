use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const PAL_DIR: &str = ".pal";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    /// Sampling temperature; left to the provider default when unset.
    pub temperature: Option<f64>,
    pub system_prompt: Option<String>,
    /// Directory Bash commands run in; the process cwd when unset.
    pub working_dir: Option<PathBuf>,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            api_key: String::new(),
            base_url: None,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4096,
            temperature: None,
            system_prompt: None,
            working_dir: None,
            server: ServerConfig::default(),
        }
    }
}

pub fn get_pal_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(PAL_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_pal_dir().join("config.toml")
}

pub fn ensure_pal_dir() -> Result<PathBuf> {
    let pal_dir = get_pal_dir();

    if !pal_dir.exists() {
        std::fs::create_dir_all(&pal_dir)
            .with_context(|| format!("Failed to create pal directory at {}", pal_dir.display()))?;
    }

    Ok(pal_dir)
}

impl Config {
    /// Loads `~/.pal/config.toml` when present, then applies `.env` and
    /// environment overrides.
    pub fn load_or_init() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = if config_exists() {
            load_config_from(&get_config_path())?
        } else {
            Config::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overrides fields from `MODEL_NAME`, `MAX_TOKENS`, `TEMPERATURE`,
    /// `PAL_PROVIDER` and `PAL_BASE_URL`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = var("PAL_PROVIDER") {
            self.provider = Some(provider);
        }
        if let Some(base_url) = var("PAL_BASE_URL") {
            self.base_url = Some(base_url);
        }
        if let Some(model) = var("MODEL_NAME") {
            self.model = model;
        }
        if let Some(max_tokens) = var("MAX_TOKENS") {
            self.max_tokens = max_tokens
                .trim()
                .parse()
                .with_context(|| format!("MAX_TOKENS must be a positive integer, got '{max_tokens}'"))?;
        }
        if let Some(temperature) = var("TEMPERATURE") {
            self.temperature = Some(
                temperature
                    .trim()
                    .parse()
                    .with_context(|| format!("TEMPERATURE must be a number, got '{temperature}'"))?,
            );
        }

        Ok(())
    }

    /// True when a key is configured or one of the provider key variables
    /// is set.
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty()
            || ["ANTHROPIC_API_KEY", "OPENAI_API_KEY"]
                .iter()
                .any(|k| std::env::var(k).is_ok_and(|v| !v.is_empty()))
    }
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    toml::from_str(&content).with_context(|| format!("Failed to parse config from {}", path.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_pal_dir()?;

    let config_path = get_config_path();
    let content = toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}
