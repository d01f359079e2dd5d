//! Product storage port
//!
//! Defines the persistence operations the catalog needs. The SQLite adapter
//! in the infrastructure layer implements this port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{Product, ProductChanges, ProductId, ProductStatus};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Row filter shared by page and count queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Exact status match
    pub status: Option<ProductStatus>,
    /// Case-insensitive exact category match
    pub category: Option<String>,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
}

impl ProductFilter {
    #[must_use]
    pub const fn with_status(mut self, status: ProductStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

/// Sortable product column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
    Name,
    Price,
    #[default]
    CreatedAt,
    Stock,
}

impl SortField {
    /// Wire name as used in `sortBy`
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::CreatedAt => "createdAt",
            Self::Stock => "stock",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "price" => Ok(Self::Price),
            "createdAt" => Ok(Self::CreatedAt),
            "stock" => Ok(Self::Stock),
            other => Err(ApplicationError::InvalidOperation(format!(
                "Unknown sort field: {other}"
            ))),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ApplicationError::InvalidOperation(format!(
                "Unknown sort order: {other}"
            ))),
        }
    }
}

/// Ordering of a product page. Ties are broken by id in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProductSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl ProductSort {
    pub const fn new(field: SortField, order: SortOrder) -> Self {
        Self { field, order }
    }
}

/// Port for product persistence
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product
    async fn insert(&self, product: &Product) -> Result<(), ApplicationError>;

    /// Look up a product, optionally requiring a status
    async fn find_by_id(
        &self,
        id: &ProductId,
        status: Option<ProductStatus>,
    ) -> Result<Option<Product>, ApplicationError>;

    /// Fetch one page of matching products
    async fn find_page(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Product>, ApplicationError>;

    /// Count all matching products
    async fn count(&self, filter: &ProductFilter) -> Result<u64, ApplicationError>;

    /// Apply changes atomically and return the updated row, `None` if the id is unknown
    async fn update(
        &self,
        id: &ProductId,
        changes: &ProductChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Product>, ApplicationError>;

    /// Hard delete; returns whether a row was removed
    async fn delete(&self, id: &ProductId) -> Result<bool, ApplicationError>;

    /// Distinct non-null categories among products with `status`
    async fn distinct_categories(
        &self,
        status: ProductStatus,
    ) -> Result<Vec<String>, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_object_safe_and_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ProductRepository>();
    }

    #[test]
    fn sort_field_parses_wire_names() {
        for field in [
            SortField::Name,
            SortField::Price,
            SortField::CreatedAt,
            SortField::Stock,
        ] {
            assert_eq!(field.as_str().parse::<SortField>().unwrap(), field);
        }
        assert!("created_at".parse::<SortField>().is_err());
    }

    #[test]
    fn sort_order_parses() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("DESC".parse::<SortOrder>().is_err());
    }

    #[test]
    fn default_sort_is_newest_first() {
        let sort = ProductSort::default();
        assert_eq!(sort.field, SortField::CreatedAt);
        assert_eq!(sort.order, SortOrder::Desc);
    }

    #[test]
    fn filter_builder() {
        let filter = ProductFilter::default()
            .with_status(ProductStatus::Active)
            .with_category("Home")
            .with_search("vase");
        assert_eq!(filter.status, Some(ProductStatus::Active));
        assert_eq!(filter.category.as_deref(), Some("Home"));
        assert_eq!(filter.search.as_deref(), Some("vase"));
    }
}
