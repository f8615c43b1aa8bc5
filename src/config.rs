//! Configuration management for Vegapunk
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//! The API credential is deliberately excluded from the config file and
//! only ever read from the environment.

use crate::error::{Result, VegapunkError};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Default config file location when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Main configuration structure for Vegapunk
///
/// This structure holds all configuration needed by the application,
/// including server settings, provider settings, page styling, and
/// session behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Provider configuration (Gemini)
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Page styling and decoration
    #[serde(default)]
    pub ui: UiConfig,

    /// Session lifetime settings
    #[serde(default)]
    pub session: SessionConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Maximum size of an uploaded image (bytes)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    8 * 1024 * 1024 // 8 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Provider configuration
///
/// Specifies which AI provider to use and its settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Type of provider to use
    #[serde(rename = "type", default = "default_provider_type")]
    pub provider_type: String,

    /// Gemini configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
}

fn default_provider_type() -> String {
    "gemini".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            gemini: GeminiConfig::default(),
        }
    }
}

/// Gemini provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Optional API base URL (useful for tests and local mocks)
    ///
    /// When set, this base is used to build the `generateContent` endpoint,
    /// which allows tests to point the provider at a mock server.
    #[serde(default)]
    pub api_base: Option<String>,

    /// Model to use for generation
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API credential, read from the environment only (never from file)
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            model: default_gemini_model(),
            api_key: None,
        }
    }
}

/// Page styling and decoration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Page title
    #[serde(default = "default_title")]
    pub title: String,

    /// Page subtitle
    #[serde(default = "default_subtitle")]
    pub subtitle: String,

    /// Background image URL used in the page stylesheet
    #[serde(default = "default_background_image_url")]
    pub background_image_url: String,

    /// Decorative banner image URL fetched and re-served by the app
    #[serde(default = "default_banner_image_url")]
    pub banner_image_url: String,

    /// Timeout for the banner fetch (seconds)
    #[serde(default = "default_fetch_timeout_seconds")]
    pub fetch_timeout_seconds: u64,

    /// Maximum size of the fetched banner image (bytes)
    #[serde(default = "default_max_banner_bytes")]
    pub max_banner_bytes: usize,
}

fn default_title() -> String {
    "Vegapunk AI".to_string()
}

fn default_subtitle() -> String {
    "Welcome to Egghead Island!".to_string()
}

fn default_background_image_url() -> String {
    "https://images7.alphacoders.com/132/1329456.jpeg".to_string()
}

fn default_banner_image_url() -> String {
    "https://images6.alphacoders.com/132/1329768.png".to_string()
}

fn default_fetch_timeout_seconds() -> u64 {
    10
}

fn default_max_banner_bytes() -> usize {
    5 * 1024 * 1024 // 5 MB
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            subtitle: default_subtitle(),
            background_image_url: default_background_image_url(),
            banner_image_url: default_banner_image_url(),
            fetch_timeout_seconds: default_fetch_timeout_seconds(),
            max_banner_bytes: default_max_banner_bytes(),
        }
    }
}

/// Session lifetime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds of inactivity after which a session is destroyed
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: u64,
}

fn default_session_ttl() -> u64 {
    1800
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_session_ttl(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| VegapunkError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| VegapunkError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(bind) = std::env::var("VEGAPUNK_BIND") {
            self.server.bind = bind;
        }

        if let Ok(model) = std::env::var("VEGAPUNK_MODEL") {
            self.provider.gemini.model = model;
        }

        if let Ok(api_base) = std::env::var("VEGAPUNK_API_BASE") {
            self.provider.gemini.api_base = Some(api_base);
        }

        if let Ok(ttl) = std::env::var("VEGAPUNK_SESSION_TTL_SECONDS") {
            if let Ok(value) = ttl.parse() {
                self.session.ttl_seconds = value;
            } else {
                tracing::warn!("Invalid VEGAPUNK_SESSION_TTL_SECONDS: {}", ttl);
            }
        }

        // The credential is environment-only. VEGAPUNK_API_KEY wins over the
        // generic API_KEY name used by the .env file.
        if let Ok(key) = std::env::var("VEGAPUNK_API_KEY") {
            self.provider.gemini.api_key = Some(key);
        } else if let Ok(key) = std::env::var("API_KEY") {
            self.provider.gemini.api_key = Some(key);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(bind) = &cli.bind {
            self.server.bind = bind.clone();
        }

        if let Some(model) = &cli.model {
            self.provider.gemini.model = model.clone();
        }
    }

    /// Validate the configuration
    ///
    /// A missing API credential is reported but is not a validation error;
    /// the application starts and surfaces the problem on the page.
    ///
    /// # Errors
    ///
    /// Returns error if the bind address is malformed, the model name is
    /// empty, or the session TTL is zero
    pub fn validate(&self) -> Result<()> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .map_err(|e| VegapunkError::Config(format!("Invalid bind address: {}", e)))?;

        if self.provider.gemini.model.trim().is_empty() {
            return Err(VegapunkError::Config("Model name must not be empty".to_string()).into());
        }

        if self.session.ttl_seconds == 0 {
            return Err(
                VegapunkError::Config("Session TTL must be greater than zero".to_string()).into(),
            );
        }

        if self.provider.gemini.api_key.is_none() {
            tracing::warn!(
                "API key not found. Set API_KEY in the environment or a .env file; \
                 chat requests will be answered with an apology until it is configured"
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
            ui: UiConfig::default(),
            session: SessionConfig::default(),
        }
    }
}
