use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub openrouter: OpenRouterSettings,
    #[serde(default)]
    pub annotation: AnnotationSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Connection settings for the OpenRouter chat-completion endpoint
///
/// The credential is never embedded in core logic; it arrives here and is
/// injected into the annotation client at construction.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenRouterSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Referring-application header required by OpenRouter for free models
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_app_title")]
    pub app_title: String,
}

impl Default for OpenRouterSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            referer: default_referer(),
            app_title: default_app_title(),
        }
    }
}

fn default_endpoint() -> String { "https://openrouter.ai/api/v1/chat/completions".to_string() }
fn default_model() -> String { "google/gemma-3n-e2b-it:free".to_string() }
fn default_referer() -> String { "http://localhost:3000".to_string() }
fn default_app_title() -> String { "Coffinding App".to_string() }

/// Retry, backoff and stagger tuning for the annotation pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotationSettings {
    /// Total attempt budget per annotation call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base wait after a 429; multiplied by the attempt number (2s, 4s, ...)
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,
    /// Flat wait after any other transport failure
    #[serde(default = "default_transport_backoff_ms")]
    pub transport_backoff_ms: u64,
    /// Pre-delay per display rank before a task's first network attempt
    #[serde(default = "default_stagger_interval_ms")]
    pub stagger_interval_ms: u64,
    /// Ceiling for a single request; a hung request surfaces as a transport
    /// failure once this elapses
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            rate_limit_backoff_ms: default_rate_limit_backoff_ms(),
            transport_backoff_ms: default_transport_backoff_ms(),
            stagger_interval_ms: default_stagger_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            temperature: default_temperature(),
        }
    }
}

fn default_max_attempts() -> u32 { 3 }
fn default_rate_limit_backoff_ms() -> u64 { 2000 }
fn default_transport_backoff_ms() -> u64 { 1000 }
fn default_stagger_interval_ms() -> u64 { 1500 }
fn default_request_timeout_secs() -> u64 { 30 }
fn default_temperature() -> f64 { 0.7 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with COFFIND_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with COFFIND_)
            // e.g., COFFIND_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("COFFIND")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("COFFIND")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Pick up the OpenRouter credential from its conventional variable
///
/// OPENROUTER_API_KEY is checked first, then COFFIND_OPENROUTER__API_KEY.
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let api_key = env::var("OPENROUTER_API_KEY")
        .or_else(|_| env::var("COFFIND_OPENROUTER__API_KEY"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(api_key) = api_key {
        builder = builder.set_override("openrouter.api_key", api_key)?;
    }

    builder.build()
}
