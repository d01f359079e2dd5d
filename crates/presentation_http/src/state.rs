//! Application state shared across handlers

use std::sync::Arc;

use application::ProductService;
use infrastructure::AppConfig;

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    /// Catalog queries and mutations
    pub product_service: Arc<ProductService>,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(product_service: ProductService, config: AppConfig) -> Self {
        Self {
            product_service: Arc::new(product_service),
            config: Arc::new(config),
        }
    }
}
