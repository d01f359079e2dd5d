//! Product service
//!
//! Query and mutation logic for the catalog: filtering, pagination, sorting
//! and the admin/public visibility split. Persistence is delegated to a
//! [`ProductRepository`].

use std::{fmt, sync::Arc};

use domain::{NewProduct, Product, ProductChanges, ProductId, ProductStatus, Viewer};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{DatabaseHealth, DatabaseHealthPort, ProductFilter, ProductRepository, ProductSort},
};

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Status selector of a listing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    Draft,
    Active,
    #[default]
    All,
}

impl StatusFilter {
    /// Status constraint that actually applies for `viewer`.
    ///
    /// Public viewers only ever see active products, whatever they asked for.
    pub const fn effective(self, viewer: Viewer) -> Option<ProductStatus> {
        match (viewer, self) {
            (Viewer::Public, _) | (Viewer::Admin, Self::Active) => Some(ProductStatus::Active),
            (Viewer::Admin, Self::Draft) => Some(ProductStatus::Draft),
            (Viewer::Admin, Self::All) => None,
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "active" => Ok(Self::Active),
            "all" => Ok(Self::All),
            other => Err(ApplicationError::InvalidOperation(format!(
                "Unknown status filter: {other}"
            ))),
        }
    }
}

/// A validated listing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub status: StatusFilter,
    pub category: Option<String>,
    pub search: Option<String>,
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
    pub sort: ProductSort,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            category: None,
            search: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort: ProductSort::default(),
        }
    }
}

impl ProductQuery {
    #[must_use]
    pub const fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
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

    #[must_use]
    pub const fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = page;
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn with_sort(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    /// Row filter for `viewer`
    pub fn filter_for(&self, viewer: Viewer) -> ProductFilter {
        ProductFilter {
            status: self.status.effective(viewer),
            category: self.category.clone(),
            search: self.search.clone(),
        }
    }

    /// Number of rows skipped before this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Pagination metadata of a product page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl Pagination {
    /// Derive metadata from the request, the match count and the rows returned
    pub fn new(page: u32, limit: u32, total: u64, returned: usize) -> Self {
        let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
        let returned = u64::try_from(returned).unwrap_or(u64::MAX);
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(u64::from(limit.max(1))),
            has_more: offset.saturating_add(returned) < total,
        }
    }
}

/// One page of products plus its metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Service for querying and mutating the catalog
#[derive(Clone)]
pub struct ProductService {
    repository: Arc<dyn ProductRepository>,
    database_health: Option<Arc<dyn DatabaseHealthPort>>,
}

impl fmt::Debug for ProductService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductService")
            .field("has_health_check", &self.database_health.is_some())
            .finish_non_exhaustive()
    }
}

impl ProductService {
    /// Create a new product service
    #[must_use]
    pub fn new(repository: Arc<dyn ProductRepository>) -> Self {
        Self {
            repository,
            database_health: None,
        }
    }

    /// Attach a database health check for readiness
    #[must_use]
    pub fn with_database_health(mut self, health: Arc<dyn DatabaseHealthPort>) -> Self {
        self.database_health = Some(health);
        self
    }

    /// List one page of products visible to `viewer`
    #[instrument(skip(self, query), fields(page = query.page, limit = query.limit))]
    pub async fn list_products(
        &self,
        query: &ProductQuery,
        viewer: Viewer,
    ) -> Result<ProductPage, ApplicationError> {
        if query.page == 0 {
            return Err(ApplicationError::InvalidOperation(
                "Page must be at least 1".to_string(),
            ));
        }
        if query.limit == 0 || query.limit > MAX_PAGE_SIZE {
            return Err(ApplicationError::InvalidOperation(format!(
                "Limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }

        let filter = query.filter_for(viewer);
        let offset = query.offset();

        let (products, total) = tokio::try_join!(
            self.repository
                .find_page(&filter, query.sort, offset, query.limit),
            self.repository.count(&filter),
        )?;

        let pagination = Pagination::new(query.page, query.limit, total, products.len());
        debug!(
            returned = products.len(),
            total,
            has_more = pagination.has_more,
            "Listed products"
        );

        Ok(ProductPage {
            products,
            pagination,
        })
    }

    /// Fetch a single product.
    ///
    /// Drafts are reported as missing to public viewers.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_by_id(
        &self,
        id: &ProductId,
        viewer: Viewer,
    ) -> Result<Product, ApplicationError> {
        let required_status = (!viewer.is_admin()).then_some(ProductStatus::Active);

        self.repository
            .find_by_id(id, required_status)
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("Product {id}")))
    }

    /// Create a product with a fresh id and timestamps
    #[instrument(skip(self, new_product), fields(name = %new_product.name))]
    pub async fn create(&self, new_product: NewProduct) -> Result<Product, ApplicationError> {
        let product = Product::create(new_product);
        self.repository.insert(&product).await?;

        info!(id = %product.id, status = %product.status, "Product created");
        Ok(product)
    }

    /// Apply a partial update; `updated_at` moves even when nothing else does
    #[instrument(skip(self, changes), fields(id = %id))]
    pub async fn update(
        &self,
        id: &ProductId,
        changes: ProductChanges,
    ) -> Result<Product, ApplicationError> {
        if changes.is_empty() {
            debug!("Empty change set, touching updated_at only");
        }

        let updated = self
            .repository
            .update(id, &changes, domain::timestamp_now())
            .await?
            .ok_or_else(|| ApplicationError::NotFound(format!("Product {id}")))?;

        info!(status = %updated.status, "Product updated");
        Ok(updated)
    }

    /// Hard delete a product
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), ApplicationError> {
        if self.repository.delete(id).await? {
            info!("Product deleted");
            Ok(())
        } else {
            Err(ApplicationError::NotFound(format!("Product {id}")))
        }
    }

    /// Distinct categories among active products, sorted
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<String>, ApplicationError> {
        let mut categories = self
            .repository
            .distinct_categories(ProductStatus::Active)
            .await?;
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// Health of the backing store; healthy when no check is attached
    pub async fn database_health(&self) -> DatabaseHealth {
        let Some(health) = &self.database_health else {
            return DatabaseHealth::healthy();
        };
        match health.check_health().await {
            Ok(health) => health,
            Err(e) => {
                warn!(error = %e, "Database health check failed");
                DatabaseHealth::unhealthy()
            },
        }
    }
}
