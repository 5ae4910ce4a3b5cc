//! Configuration file support

use lcv_proto::Endpoints;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_ANALYSE_PATH: &str = "/analyse";
pub const DEFAULT_RESUME_PATH: &str = "/resume";

/// Configuration for lcv
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the analysis backend
    pub base_url: Option<String>,
    /// Path of the start-analysis endpoint
    pub analyse_path: Option<String>,
    /// Path of the resume endpoint
    pub resume_path: Option<String>,
    /// Answer every interrupt with this value instead of prompting
    pub auto_answer: Option<bool>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lcv")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("LCV_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse config file: {}", e);
                Self::default()
            }),
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(&path, content)?;
        Ok(path)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            analyse_path: Some(DEFAULT_ANALYSE_PATH.to_string()),
            resume_path: Some(DEFAULT_RESUME_PATH.to_string()),
            auto_answer: None,
        };
        default_config.save()
    }

    /// Resolve both endpoint URLs, falling back to the defaults
    pub fn endpoints(&self) -> lcv_proto::Result<Endpoints> {
        Endpoints::from_base(
            self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
            self.analyse_path.as_deref().unwrap_or(DEFAULT_ANALYSE_PATH),
            self.resume_path.as_deref().unwrap_or(DEFAULT_RESUME_PATH),
        )
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# lcv configuration file
# Place at ~/.config/lcv/config.toml (Linux) or set LCV_CONFIG_PATH

# Base URL of the analysis backend
base_url = "http://localhost:8000"

# Endpoint paths, joined onto base_url
analyse_path = "/analyse"
resume_path = "/resume"

# Answer interrupts automatically instead of prompting (optional)
# auto_answer = true
"#
}
