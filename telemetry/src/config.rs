//! Configuration Management Module
//!
//! This module handles loading and managing configuration for the telemetry
//! service: API bind settings, view-store settings, and the read window.
//! Configuration is a TOML file, with a handful of environment variable
//! overrides recognized for deployment (`PORT`, `DYNAMODB_TABLE`,
//! `AWS_REGION`).

use serde::{Deserialize, Serialize};

/// One hour in milliseconds, the default dashboard read window.
pub const DEFAULT_WINDOW_MS: u64 = 3_600_000;

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration (host, port, CORS settings)
    pub api: ApiConfig,
    /// View-store configuration (table name, region)
    pub store: StoreConfig,
    /// Telemetry-specific settings (read window)
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// API server configuration for external communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host address to bind the API server to
    pub host: String,
    /// Port number to bind the API server to
    pub port: u16,
    /// Allowed CORS origins ("*" for any origin)
    pub cors_origins: Vec<String>,
}

/// View-store configuration.
///
/// The store itself is an external collaborator reached through the
/// [`crate::store::ViewStore`] trait; these settings identify the backing
/// table for deployments that wire up a persistent implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backing table name
    pub table: String,
    /// Store region, if the backing store is regional
    #[serde(default)]
    pub region: Option<String>,
}

/// Telemetry-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Read window for the pageviews endpoint in milliseconds
    pub window_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Configuration is valid
    /// - `Err(anyhow::Error)` - Empty table name or zero read window
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.table.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "Configuration error: store.table must not be empty"
            ));
        }
        if self.telemetry.window_ms == 0 {
            return Err(anyhow::anyhow!(
                "Configuration error: telemetry.window_ms must be greater than zero"
            ));
        }
        Ok(())
    }

    /// Loads configuration from the TOML file and applies environment
    /// overrides.
    ///
    /// The file path defaults to `config/telemetry.toml` and can be set via
    /// `TELEMETRY_CONFIG_PATH`. Recognized environment overrides:
    /// `PORT` (api.port), `DYNAMODB_TABLE` (store.table), `AWS_REGION`
    /// (store.region).
    ///
    /// # Returns
    ///
    /// - `Ok(Config)` - Successfully loaded and validated configuration
    /// - `Err(anyhow::Error)` - File missing, unparseable, or invalid
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("TELEMETRY_CONFIG_PATH")
            .unwrap_or_else(|_| "config/telemetry.toml".to_string());

        if !std::path::Path::new(&config_path).exists() {
            return Err(anyhow::anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/telemetry.template.toml config/telemetry.toml\n\
                Then edit config/telemetry.toml with your actual values.",
                config_path
            ));
        }

        let content = std::fs::read_to_string(&config_path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies the recognized environment variable overrides.
    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            self.api.port = port
                .parse()
                .map_err(|_| anyhow::anyhow!("Invalid PORT value: {}", port))?;
        }
        if let Ok(table) = std::env::var("DYNAMODB_TABLE") {
            self.store.table = table;
        }
        if let Ok(region) = std::env::var("AWS_REGION") {
            self.store.region = Some(region);
        }
        Ok(())
    }

    /// Creates a default configuration suitable for local development
    /// and testing.
    pub fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                cors_origins: vec!["*".to_string()],
            },
            store: StoreConfig {
                table: "txlink-page-views".to_string(),
                region: None,
            },
            telemetry: TelemetryConfig::default(),
        }
    }
}
