//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server settings
//! - `database`: SQLite database settings
//! - `security`: Admin API keys, rate limiting
//!
//! Sources are layered: built-in defaults, then an optional `config.toml`,
//! then `CATALOG_*` environment variables (`CATALOG_SERVER__PORT=8080`).

mod database;
mod security;
mod server;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use database::DatabaseConfig;
pub use security::{ApiKeyEntry, RateLimitConfig, SecurityConfig};
pub use server::ServerConfig;

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "CATALOG";

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Application environment (development or production)
///
/// Development relaxes CORS (any origin is echoed) and security warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config", false)
    }

    /// Load configuration from an explicit file plus the environment
    pub fn load_from(path: &str, required: bool) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // Start with defaults
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            // Load from file if exists
            .add_source(config::File::with_name(path).required(required))
            // Override with environment variables (e.g., CATALOG_SERVER__PORT)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.allowed_origins")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Human-readable warnings about risky settings
    pub fn security_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let plaintext = self.security.count_plaintext_keys();
        if plaintext > 0 {
            warnings.push(format!(
                "{plaintext} API key(s) are not Argon2 hashes and will never match"
            ));
        }
        if !self.security.has_api_keys() {
            warnings.push("No admin API keys configured; all mutations will be rejected".to_string());
        }
        if !self.security.rate_limit.enabled && self.environment == Environment::Production {
            warnings.push("Rate limiting is disabled in production".to_string());
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn environment_default_is_development() {
        assert_eq!(Environment::default(), Environment::Development);
        assert!(Environment::default().is_development());
    }

    #[test]
    fn environment_parse() {
        assert_eq!(
            "production".parse::<Environment>().unwrap(),
            Environment::Production
        );
        assert_eq!("DEV".parse::<Environment>().unwrap(), Environment::Development);
        assert!("staging".parse::<Environment>().unwrap_err().contains("Invalid environment"));
    }

    #[test]
    fn environment_display() {
        assert_eq!(Environment::Production.to_string(), "production");
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.log_format, "text");
        assert_eq!(config.database.path, "catalog.db");
        assert!(config.database.run_migrations);
        let limits = &config.security.rate_limit;
        assert!(limits.enabled);
        assert_eq!(limits.window_secs, 60);
        assert_eq!(limits.products_max, 100);
        assert_eq!(limits.product_max, 200);
        assert_eq!(limits.categories_max, 100);
        assert_eq!(limits.admin_max, 100);
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
environment = "production"

[server]
port = 8080
allowed_origins = ["https://shop.example.com"]
log_format = "json"

[database]
path = ":memory:"

[[security.api_keys]]
hash = "$argon2id$v=19$m=19456,t=2,p=1$abc$def"
name = "ops"

[security.rate_limit]
product_max = 5
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let config = AppConfig::load_from(&path, true).unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.server.port, 8080);
        assert!(config.server.json_logs());
        assert_eq!(config.server.allowed_origins, vec!["https://shop.example.com"]);
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.security.api_keys.len(), 1);
        assert_eq!(config.security.api_keys[0].name, "ops");
        assert_eq!(config.security.rate_limit.product_max, 5);
        assert_eq!(config.security.rate_limit.products_max, 100);
    }

    #[test]
    fn missing_optional_file_uses_defaults() {
        let config = AppConfig::load_from("definitely-not-here", false).unwrap();
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn warnings_flag_plaintext_and_missing_keys() {
        let mut config = AppConfig::default();
        assert!(config.security_warnings().iter().any(|w| w.contains("No admin API keys")));

        config.security.api_keys.push(ApiKeyEntry {
            hash: "plaintext".to_string(),
            name: "oops".to_string(),
        });
        assert!(config.security_warnings().iter().any(|w| w.contains("not Argon2")));
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let server = ServerConfig::default();
        assert_eq!(server.bind_address(), "127.0.0.1:3000");
    }
}
