//! Server configuration module.
//!
//! Layered with the `config` crate:
//! ```text
//! built-in defaults ──► fodi.toml (optional) ──► environment variables
//! ```
//!
//! ## Environment variables
//! - `HOST`, `PORT` - bind address (default: 0.0.0.0:8080)
//! - `DATABASE_PATH` - SQLite file (default: ./fodi.db)
//! - `DB_MAX_CONNECTIONS` - pool size (default: 5)
//! - `JWT_SECRET` - HS256 signing secret
//! - `ALLOWED_ORIGINS` - comma-separated CORS origins (empty: any origin)
//! - `WS_CLIENT_BUFFER` - queued frames per admin socket (default: 64)
//! - `PRICING__BASE_PRICE_CENTS`, `PRICING__MAX_MULTIPLIER`, ... - price coefficients

use config::{Config, Environment, File, Source};
use serde::Deserialize;

use fodi_core::PricingConfig;

/// Name of the optional configuration file (`fodi.toml`).
pub const CONFIG_FILE: &str = "fodi";

/// Secret used when none is configured. Fine for development only.
pub const DEV_JWT_SECRET: &str = "fodi-dev-secret-change-in-production";

/// API server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Maximum pooled connections
    pub db_max_connections: u32,

    /// JWT secret key for validating tokens
    pub jwt_secret: String,

    /// CORS origins; empty allows any origin
    pub allowed_origins: Vec<String>,

    /// Per-connection channel capacity of the notification hub
    pub ws_client_buffer: usize,

    #[serde(default)]
    pub pricing: PricingConfig,
}

impl ServerConfig {
    /// Loads defaults, then `fodi.toml` if present, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let env = Environment::default()
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("allowed_origins");

        Self::from_sources(vec![
            Box::new(File::with_name(CONFIG_FILE).required(false)),
            Box::new(env),
        ])
    }

    fn from_sources(sources: Vec<Box<dyn Source + Send + Sync>>) -> Result<Self, ConfigError> {
        let config: ServerConfig = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("database_path", "./fodi.db")?
            .set_default("db_max_connections", 5)?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("allowed_origins", Vec::<String>::new())?
            .set_default("ws_client_buffer", 64)?
            .add_source(sources)
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("PORT".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if self.ws_client_buffer == 0 {
            return Err(ConfigError::InvalidValue("WS_CLIENT_BUFFER".to_string()));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("JWT_SECRET".to_string()));
        }
        self.pricing
            .validate()
            .map_err(|e| ConfigError::InvalidPricing(e.to_string()))
    }

    /// `host:port` to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid pricing configuration: {0}")]
    InvalidPricing(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<ServerConfig, ConfigError> {
        ServerConfig::from_sources(vec![Box::new(File::from_str(toml, FileFormat::Toml))])
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database_path, "./fodi.db");
        assert_eq!(config.db_max_connections, 5);
        assert!(config.allowed_origins.is_empty());
        assert_eq!(config.pricing, PricingConfig::default());
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_file_overrides() {
        let config = from_toml(
            r#"
            port = 9090
            jwt_secret = "s3cret"
            allowed_origins = ["http://localhost:3000"]

            [pricing]
            base_price_cents = 2500
            max_multiplier = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9090);
        assert!(!config.uses_dev_secret());
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(config.pricing.base_price_cents, 2500);
        assert_eq!(config.pricing.max_multiplier, 5);
        // Unset coefficients keep their defaults
        assert_eq!(config.pricing.supply_step, 10);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            from_toml("port = 0"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            from_toml("db_max_connections = 0"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            from_toml("jwt_secret = \"  \""),
            Err(ConfigError::MissingRequired(_))
        ));
        assert!(matches!(
            from_toml("[pricing]\nsupply_step = 0"),
            Err(ConfigError::InvalidPricing(_))
        ));
    }
}
