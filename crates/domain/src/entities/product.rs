//! Product entity - The single record type of the catalog

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{Price, ProductId, ProductStatus};

/// Current time at the precision the store keeps (microseconds)
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A catalog product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    /// Purchase cost; administrators only
    pub cost_price: Option<Price>,
    pub category: Option<String>,
    pub stock: u32,
    pub status: ProductStatus,
    /// Image URLs in display order
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Materialize a validated creation request with a fresh id and timestamps
    pub fn create(new: NewProduct) -> Self {
        let now = timestamp_now();
        Self {
            id: ProductId::new(),
            name: new.name,
            description: new.description,
            price: new.price,
            cost_price: new.cost_price,
            category: new.category,
            stock: new.stock,
            status: new.status,
            images: new.images,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validated fields for a product that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub cost_price: Option<Price>,
    pub category: Option<String>,
    pub stock: u32,
    pub status: ProductStatus,
    pub images: Vec<String>,
}

impl NewProduct {
    /// Minimal product with defaults for every optional field
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            cost_price: None,
            category: None,
            stock: 0,
            status: ProductStatus::default(),
            images: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn with_cost_price(mut self, cost_price: Price) -> Self {
        self.cost_price = Some(cost_price);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub const fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// A partial update.
///
/// The outer `Option` says whether a field is touched at all. For nullable
/// fields the inner `Option` distinguishes "set to a value" from "clear".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<Price>,
    pub cost_price: Option<Option<Price>>,
    pub category: Option<Option<String>>,
    pub stock: Option<u32>,
    pub status: Option<ProductStatus>,
    pub images: Option<Vec<String>>,
}

impl ProductChanges {
    /// True when no field is touched
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.cost_price.is_none()
            && self.category.is_none()
            && self.stock.is_none()
            && self.status.is_none()
            && self.images.is_none()
    }
}
