//! SQLite product repository using sqlx
//!
//! Prices are kept as integer cents so that ordering by price is numeric.
//! Images are a JSON array in a TEXT column. Timestamps are fixed-width
//! RFC 3339 strings with microseconds, which sort chronologically.

use application::{
    error::ApplicationError,
    ports::{ProductFilter, ProductRepository, ProductSort, SortField, SortOrder},
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use domain::{Price, Product, ProductChanges, ProductId, ProductStatus};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, instrument};

use super::error::map_sqlx_error;

const COLUMNS: &str = "id, name, description, price_cents, cost_price_cents, category, \
                       stock, status, images, created_at, updated_at";

/// Product repository backed by SQLite
#[derive(Debug, Clone)]
pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Row type for product queries
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
    price_cents: i64,
    cost_price_cents: Option<i64>,
    category: Option<String>,
    stock: i64,
    status: String,
    images: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = ApplicationError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::parse(&row.id)?,
            name: row.name,
            description: row.description,
            price: Price::from_minor_units(row.price_cents)?,
            cost_price: row.cost_price_cents.map(Price::from_minor_units).transpose()?,
            category: row.category,
            stock: u32::try_from(row.stock)
                .map_err(|e| ApplicationError::Internal(format!("Invalid stock value: {e}")))?,
            status: row.status.parse()?,
            images: serde_json::from_str(&row.images)
                .map_err(|e| ApplicationError::Internal(format!("Invalid images column: {e}")))?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ApplicationError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ApplicationError::Internal(format!("Invalid datetime: {e}")))
}

fn encode_images(images: &[String]) -> Result<String, ApplicationError> {
    serde_json::to_string(images)
        .map_err(|e| ApplicationError::Internal(format!("Cannot encode images: {e}")))
}

/// `%term%` with LIKE wildcards in the term escaped by a backslash
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

const fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Name => "name",
        SortField::Price => "price_cents",
        SortField::CreatedAt => "created_at",
        SortField::Stock => "stock",
    }
}

const fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

fn push_filter<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &'a ProductFilter) {
    let mut separator = " WHERE ";

    if let Some(status) = filter.status {
        qb.push(separator).push("status = ").push_bind(status.as_str());
        separator = " AND ";
    }

    if let Some(category) = &filter.category {
        qb.push(separator)
            .push("category = ")
            .push_bind(category.as_str())
            .push(" COLLATE NOCASE");
        separator = " AND ";
    }

    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(separator)
            .push("(name LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR description LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    #[instrument(skip(self, product), fields(id = %product.id))]
    async fn insert(&self, product: &Product) -> Result<(), ApplicationError> {
        let images = encode_images(&product.images)?;

        sqlx::query(
            "INSERT INTO products (id, name, description, price_cents, cost_price_cents, \
             category, stock, status, images, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.minor_units())
        .bind(product.cost_price.map(|p| p.minor_units()))
        .bind(&product.category)
        .bind(i64::from(product.stock))
        .bind(product.status.as_str())
        .bind(images)
        .bind(format_datetime(product.created_at))
        .bind(format_datetime(product.updated_at))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!("Product inserted");
        Ok(())
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_by_id(
        &self,
        id: &ProductId,
        status: Option<ProductStatus>,
    ) -> Result<Option<Product>, ApplicationError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM products WHERE id = "));
        qb.push_bind(id.as_str());
        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }

        let row: Option<ProductRow> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self, filter))]
    async fn find_page(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<Product>, ApplicationError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM products"));
        push_filter(&mut qb, filter);

        let direction = sort_direction(sort.order);
        qb.push(format_args!(
            " ORDER BY {} {direction}, id {direction}",
            sort_column(sort.field)
        ));
        qb.push(" LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let rows: Vec<ProductRow> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(count = rows.len(), "Fetched product page");
        rows.into_iter().map(Product::try_from).collect()
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: &ProductFilter) -> Result<u64, ApplicationError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products");
        push_filter(&mut qb, filter);

        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        u64::try_from(count).map_err(|e| ApplicationError::Internal(format!("Invalid count: {e}")))
    }

    #[instrument(skip(self, changes), fields(id = %id))]
    async fn update(
        &self,
        id: &ProductId,
        changes: &ProductChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Product>, ApplicationError> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE products SET updated_at = ");
        qb.push_bind(format_datetime(updated_at));

        if let Some(name) = &changes.name {
            qb.push(", name = ").push_bind(name.as_str());
        }
        if let Some(description) = &changes.description {
            qb.push(", description = ").push_bind(description.as_deref());
        }
        if let Some(price) = changes.price {
            qb.push(", price_cents = ").push_bind(price.minor_units());
        }
        if let Some(cost_price) = changes.cost_price {
            qb.push(", cost_price_cents = ")
                .push_bind(cost_price.map(|p| p.minor_units()));
        }
        if let Some(category) = &changes.category {
            qb.push(", category = ").push_bind(category.as_deref());
        }
        if let Some(stock) = changes.stock {
            qb.push(", stock = ").push_bind(i64::from(stock));
        }
        if let Some(status) = changes.status {
            qb.push(", status = ").push_bind(status.as_str());
        }
        if let Some(images) = &changes.images {
            qb.push(", images = ").push_bind(encode_images(images)?);
        }

        qb.push(" WHERE id = ").push_bind(id.as_str());
        qb.push(format_args!(" RETURNING {COLUMNS}"));

        let row: Option<ProductRow> = qb
            .build_query_as()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        debug!(found = row.is_some(), "Product update executed");
        row.map(Product::try_from).transpose()
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &ProductId) -> Result<bool, ApplicationError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn distinct_categories(
        &self,
        status: ProductStatus,
    ) -> Result<Vec<String>, ApplicationError> {
        sqlx::query_scalar(
            "SELECT DISTINCT category FROM products \
             WHERE status = $1 AND category IS NOT NULL \
             ORDER BY category",
        )
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }
}
