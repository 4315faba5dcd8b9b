//! Configuration file support

use anyhow::{Context, bail};
use rill_ai::{
    EndpointKind,
    endpoint::DEFAULT_BASE_URL,
    models::{ModelSelector, find_model},
};
use rill_session::session::DEFAULT_ERROR_TEXT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for rill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub base_url: Option<String>,
    /// Request encoding: "chat" or "analyze"
    pub endpoint: Option<String>,
    /// Default model, by id or name
    pub model: Option<String>,
    /// Model name sent by the analyze endpoint
    pub analyze_model: Option<String>,
    /// Text shown when a request fails
    pub error_text: Option<String>,
    /// Whether to use TUI mode by default
    pub tui: Option<bool>,
    /// Color theme: "dark" or "light"
    pub theme: Option<String>,
}

/// Values given on the command line, which win over the config file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub no_tui: bool,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: String,
    pub kind: EndpointKind,
    pub model: ModelSelector,
    pub analyze_model: String,
    pub error_text: String,
    pub tui: bool,
    pub theme: String,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rill")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("RILL_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Where the TUI writes its log
    pub fn log_path() -> PathBuf {
        Self::config_dir().join("rill.log")
    }

    /// Load config from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> anyhow::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            base_url: Some(DEFAULT_BASE_URL.to_string()),
            endpoint: Some(EndpointKind::Chat.name().to_string()),
            model: Some(ModelSelector::default().display_name()),
            analyze_model: None,
            error_text: None,
            tui: Some(true),
            theme: Some("dark".to_string()),
        };

        default_config.save_to(&path)?;
        Ok(path)
    }

    /// Merge command-line overrides, config values and built-in defaults
    pub fn resolve(&self, overrides: Overrides) -> anyhow::Result<Settings> {
        let base_url = overrides
            .base_url
            .or_else(|| self.base_url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let kind = match overrides.endpoint.or_else(|| self.endpoint.clone()) {
            Some(name) => match EndpointKind::parse(&name) {
                Some(kind) => kind,
                None => bail!("Unknown endpoint '{}' (expected 'chat' or 'analyze')", name),
            },
            None => EndpointKind::default(),
        };

        let model = match overrides.model.or_else(|| self.model.clone()) {
            Some(query) => match find_model(&query) {
                Some(info) => info.selector(),
                None => bail!("No model found matching '{}' (see --list-models)", query),
            },
            None => ModelSelector::default(),
        };

        let theme = self.theme.clone().unwrap_or_else(|| "dark".to_string());
        if rill_tui::Theme::by_name(&theme).is_none() {
            bail!("Unknown theme '{}' (expected 'dark' or 'light')", theme);
        }

        Ok(Settings {
            base_url,
            kind,
            model,
            analyze_model: self.analyze_model.clone().unwrap_or_default(),
            error_text: self
                .error_text
                .clone()
                .unwrap_or_else(|| DEFAULT_ERROR_TEXT.to_string()),
            tui: !overrides.no_tui && self.tui.unwrap_or(true),
            theme,
        })
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# rill configuration file
# Place at ~/.config/rill/config.toml (Linux/Mac) or %APPDATA%\rill\config.toml (Windows)
# or point RILL_CONFIG_PATH at another file.

# Backend base URL
base_url = "http://localhost:5088"

# Request encoding: "chat" (multipart, supports attachments) or "analyze" (JSON)
endpoint = "chat"

# Default model, by id or name (1 = Ollama, 2 = Gemini)
model = "Ollama"

# Model name sent in analyze requests (empty by default)
# analyze_model = ""

# Text shown in place of the reply when a request fails
# error_text = "Sorry, there was an error processing your request."

# Whether to use TUI mode by default
# Set to false for simple stdin/stdout mode
tui = true

# Color theme: "dark" or "light"
theme = "dark"
"#
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(example_config()).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:5088"));
        assert_eq!(config.endpoint.as_deref(), Some("chat"));
        assert_eq!(config.tui, Some(true));
    }

    #[test]
    fn test_defaults_without_config_or_flags() {
        let settings = Config::default().resolve(Overrides::default()).unwrap();
        assert_eq!(settings.base_url, "http://localhost:5088");
        assert_eq!(settings.kind, EndpointKind::Chat);
        assert_eq!(settings.model, ModelSelector(1));
        assert_eq!(settings.analyze_model, "");
        assert_eq!(settings.error_text, DEFAULT_ERROR_TEXT);
        assert!(settings.tui);
    }

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            base_url: Some("http://backend:9000".into()),
            endpoint: Some("analyze".into()),
            model: Some("gemini".into()),
            ..Default::default()
        };

        let from_config = config.resolve(Overrides::default()).unwrap();
        assert_eq!(from_config.base_url, "http://backend:9000");
        assert_eq!(from_config.kind, EndpointKind::Analyze);
        assert_eq!(from_config.model, ModelSelector(2));

        let overridden = config
            .resolve(Overrides {
                base_url: Some("http://127.0.0.1:5088".into()),
                endpoint: Some("chat".into()),
                model: Some("1".into()),
                no_tui: true,
            })
            .unwrap();
        assert_eq!(overridden.base_url, "http://127.0.0.1:5088");
        assert_eq!(overridden.kind, EndpointKind::Chat);
        assert_eq!(overridden.model, ModelSelector(1));
        assert!(!overridden.tui);
    }

    #[test]
    fn test_invalid_values_are_errors() {
        let bad_endpoint = Overrides {
            endpoint: Some("stream".into()),
            ..Default::default()
        };
        assert!(Config::default().resolve(bad_endpoint).is_err());

        let bad_model = Overrides {
            model: Some("claude".into()),
            ..Default::default()
        };
        assert!(Config::default().resolve(bad_model).is_err());

        let bad_theme = Config {
            theme: Some("neon".into()),
            ..Default::default()
        };
        assert!(bad_theme.resolve(Overrides::default()).is_err());
    }

    #[test]
    fn test_save_and_load_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("rill-config-{}", std::process::id()));
        let path = dir.join("config.toml");
        let config = Config {
            endpoint: Some("analyze".into()),
            analyze_model: Some("llama3".into()),
            ..Default::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);

        fs::write(&path, "endpoint = [").unwrap();
        assert!(Config::load_from(&path).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
