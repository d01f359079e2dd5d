//! Persistence module
//!
//! SQLite storage for the product catalog via sqlx.

pub mod async_connection;
pub mod database_health;
pub mod error;
pub mod product_store;

pub use async_connection::{AsyncDatabase, AsyncDatabaseConfig, AsyncDatabaseError};
pub use database_health::SqliteDatabaseHealth;
pub use error::map_sqlx_error;
pub use product_store::SqliteProductRepository;
