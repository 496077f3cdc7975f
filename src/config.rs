use serde::Deserialize;
use std::path::{Path, PathBuf};

fn default_port() -> u16 {
    8000
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/interviews.sqlite")
}

fn default_recordings_dir() -> PathBuf {
    PathBuf::from("recordings")
}

fn default_public_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// Configuration file structure (TOML)
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Port the HTTP server listens on (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite database file path (created if missing)
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    /// Directory where audio recordings are written (created at startup)
    #[serde(default = "default_recordings_dir")]
    pub recordings_dir: PathBuf,
    /// Base URL used to build public recording links
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    /// OpenAI API settings (maps to [openai] section in TOML)
    #[serde(default)]
    pub openai: OpenAiConfig,
    /// Twilio settings (maps to [twilio] section in TOML)
    #[serde(default)]
    pub twilio: TwilioConfig,
}

/// [openai] section. A missing api_key falls back to the OPENAI_API_KEY
/// environment variable at client construction time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    /// Override for the API base URL (default: https://api.openai.com)
    pub api_base: Option<String>,
}

/// [twilio] section. Each missing credential falls back to its TWILIO_*
/// environment variable at client construction time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    /// Outbound caller number
    pub phone_number: Option<String>,
    /// Override for the API base URL (default: https://api.twilio.com)
    pub api_base: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            database_path: default_database_path(),
            recordings_dir: default_recordings_dir(),
            public_base_url: default_public_base_url(),
            openai: OpenAiConfig::default(),
            twilio: TwilioConfig::default(),
        }
    }
}

impl Config {
    /// Load and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
        let config = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }
}
