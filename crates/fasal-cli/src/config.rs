//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::content;

/// Path of the hosted chat function, relative to `SUPABASE_URL`
const HOSTED_FUNCTION_PATH: &str = "functions/v1/data-chat";

/// Configuration for fasal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Full URL of the chat endpoint
    pub endpoint: Option<String>,
    /// Bearer credential sent with every request
    pub api_key: Option<String>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// Whole-request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Replacement list of example questions
    pub examples: Option<Vec<String>>,
    /// Color theme ("dark" or "light")
    pub theme: Option<String>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub endpoint: Option<String>,
    pub no_tui: bool,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub endpoint: String,
    pub api_key: String,
    pub use_tui: bool,
    pub timeout: Option<Duration>,
    pub examples: Vec<String>,
    pub theme: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No chat endpoint configured")]
    MissingEndpoint,

    #[error("No API key configured")]
    MissingApiKey,
}

/// Non-empty value of an environment variable
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fasal")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("FASAL_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Where TUI mode writes its log
    pub fn log_path() -> PathBuf {
        Self::config_dir().join("fasal.log")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            tui: Some(true),
            theme: Some("dark".to_string()),
            ..Config::default()
        };

        default_config.save()?;
        Ok(path)
    }

    /// Merge command line, environment and file values.
    ///
    /// Precedence is command line, then environment, then this file, then
    /// built-in defaults. `SUPABASE_URL` and `SUPABASE_PUBLISHABLE_KEY` apply
    /// only as a pair: the hosted key is never sent to an endpoint that came
    /// from elsewhere.
    pub fn resolve(
        &self,
        cli: &CliOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, ConfigError> {
        let hosted_endpoint = non_empty(env("SUPABASE_URL"))
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), HOSTED_FUNCTION_PATH));

        let explicit_endpoint =
            non_empty(cli.endpoint.clone()).or_else(|| non_empty(env("FASAL_ENDPOINT")));
        let (endpoint, hosted) = match explicit_endpoint {
            Some(endpoint) => (endpoint, false),
            None => match hosted_endpoint {
                Some(endpoint) => (endpoint, true),
                None => (
                    non_empty(self.endpoint.clone()).ok_or(ConfigError::MissingEndpoint)?,
                    false,
                ),
            },
        };

        let hosted_key = if hosted {
            non_empty(env("SUPABASE_PUBLISHABLE_KEY"))
        } else {
            None
        };
        let api_key = non_empty(env("FASAL_API_KEY"))
            .or(hosted_key)
            .or_else(|| non_empty(self.api_key.clone()))
            .ok_or(ConfigError::MissingApiKey)?;

        let examples = match &self.examples {
            Some(examples) if !examples.is_empty() => examples.clone(),
            _ => content::default_examples(),
        };

        Ok(Settings {
            endpoint,
            api_key,
            use_tui: !cli.no_tui && self.tui.unwrap_or(true),
            timeout: self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
            examples,
            theme: self.theme.clone().unwrap_or_else(|| "dark".to_string()),
        })
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# fasal configuration file
# Location: ~/.config/fasal/config.toml

# Chat endpoint. FASAL_ENDPOINT overrides this; when neither is set,
# SUPABASE_URL is used with /functions/v1/data-chat appended.
# endpoint = "https://example.supabase.co/functions/v1/data-chat"

# Bearer credential. FASAL_API_KEY overrides this, as does
# SUPABASE_PUBLISHABLE_KEY when the endpoint comes from SUPABASE_URL.
# api_key = "your-key"

# Use TUI mode by default (true/false)
tui = true

# Give up on a request after this many seconds (default: no limit)
# timeout_secs = 120

# Color theme: dark or light
theme = "dark"

# Replace the example questions
# examples = [
#   "Which districts have highest wheat production in Punjab?",
#   "Compare average rainfall across top 5 states for the last 3 years",
# ]
"#
}
