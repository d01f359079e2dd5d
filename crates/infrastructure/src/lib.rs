//! Infrastructure layer - Adapters for external systems
//!
//! Implements the ports defined in the application layer: SQLite persistence,
//! configuration loading, API key hashing and logging setup.

pub mod adapters;
pub mod config;
pub mod persistence;
pub mod telemetry;

pub use adapters::*;
pub use config::{
    ApiKeyEntry, AppConfig, DatabaseConfig, Environment, RateLimitConfig, SecurityConfig,
    ServerConfig,
};
pub use persistence::{
    AsyncDatabase, AsyncDatabaseConfig, AsyncDatabaseError, SqliteDatabaseHealth,
    SqliteProductRepository,
};
pub use telemetry::{LogFormat, LoggingConfig, init_logging};
