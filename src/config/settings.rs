//! Application settings and configuration structures.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::shared::i18n;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Application identity and debug switch
    pub app: AppSettings,

    /// Language negotiation and message catalogs
    pub i18n: I18nSettings,

    /// Error registry and monitoring
    pub errors: ErrorSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Logging output
    pub telemetry: TelemetrySettings,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// Application identity.
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    pub name: String,

    /// Current environment (development, staging, production)
    pub environment: String,

    /// Debug configuration: unhandled error responses include the raw
    /// error text and type. Never enabled in production.
    pub debug: bool,
}

/// Internationalization configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct I18nSettings {
    /// Language used when a request expresses no supported preference
    pub default_language: String,

    /// Directory holding `<language>.json` message catalogs
    pub catalog_dir: Option<PathBuf>,
}

/// Error registry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorSettings {
    /// Load the AI extension error kinds
    pub ai_extension: bool,

    /// Count monitored AI errors in Prometheus
    pub monitor_ai_errors: bool,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env)
    pub allowed_origins: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    /// Fallback filter when `RUST_LOG` is unset
    pub filter: String,

    pub format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".into(),
                port: 8000,
            },
            app: AppSettings {
                name: "lyo-api".into(),
                environment: "development".into(),
                debug: false,
            },
            i18n: I18nSettings {
                default_language: i18n::DEFAULT_LANGUAGE.into(),
                catalog_dir: None,
            },
            errors: ErrorSettings {
                ai_extension: true,
                monitor_ai_errors: true,
            },
            cors: CorsSettings {
                allowed_origins: vec!["*".into()],
            },
            telemetry: TelemetrySettings {
                filter: "info,lyo_api=debug,tower_http=debug".into(),
                format: LogFormat::Pretty,
            },
        }
    }
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the loaded values are inconsistent (see [`Settings::validate`]).
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        // Determine the running environment
        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            // Start with default values
            .set_default("app.environment", environment.clone())?
            .set_default("app.name", "lyo-api")?
            .set_default("app.debug", false)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("i18n.default_language", i18n::DEFAULT_LANGUAGE)?
            .set_default("errors.ai_extension", true)?
            .set_default("errors.monitor_ai_errors", true)?
            .set_default("cors.allowed_origins", vec!["*"])?
            .set_default("telemetry.filter", "info,lyo_api=debug,tower_http=debug")?
            .set_default("telemetry.format", "pretty")?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Load from environment variables
            // APP__SERVER__PORT=8000 -> server.port = 8000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            // Map simple environment variables
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("app.debug", std::env::var("APP_DEBUG").ok())?
            .set_override_option("i18n.catalog_dir", std::env::var("I18N_CATALOG_DIR").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    /// Reject combinations that must never reach a running server.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app.debug && self.app.environment == "production" {
            return Err(ConfigError::Message(
                "Debug mode must not be enabled in production".into(),
            ));
        }
        if i18n::resolve(&self.i18n.default_language) != Some(self.i18n.default_language.as_str()) {
            return Err(ConfigError::Message(format!(
                "Default language {} is not a supported language code",
                self.i18n.default_language
            )));
        }
        Ok(())
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
