//! Configuration management
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/<env>.toml)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// NASA APOD provider configuration
    pub apod: ApodConfig,

    /// Image synthesis provider configuration
    pub synthesis: SynthesisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Log filter directive
    #[serde(default = "default_rust_log")]
    pub rust_log: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Idle timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApodConfig {
    /// APOD endpoint
    #[serde(default = "default_apod_url")]
    pub api_url: String,

    /// api.nasa.gov key; DEMO_KEY works with tight rate limits
    #[serde(default = "default_apod_key")]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_apod_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// Image generation endpoint
    #[serde(default = "default_synthesis_url")]
    pub api_url: String,

    /// API key for the image generation service
    pub api_key: String,

    /// Model to use
    #[serde(default = "default_synthesis_model")]
    pub model: String,

    /// Generated image size
    #[serde(default = "default_image_size")]
    pub image_size: String,

    /// Request timeout in seconds; generation is slow
    #[serde(default = "default_synthesis_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 90 }
fn default_rust_log() -> String { "info,sea_orm=warn".to_string() }
fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_connect_timeout() -> u64 { 10 }
fn default_idle_timeout() -> u64 { 300 }
fn default_apod_url() -> String { "https://api.nasa.gov/planetary/apod".to_string() }
fn default_apod_key() -> String { "DEMO_KEY".to_string() }
fn default_apod_timeout() -> u64 { 15 }
fn default_synthesis_url() -> String { "https://api.openai.com/v1/images/generations".to_string() }
fn default_synthesis_model() -> String { "dall-e-3".to_string() }
fn default_image_size() -> String { "1024x1024".to_string() }
fn default_synthesis_timeout() -> u64 { 60 }

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{env}")).required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__DATABASE__URL=postgres://...
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}
