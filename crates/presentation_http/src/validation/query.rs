//! Query string of `GET /products`

use std::borrow::Cow;

use application::{MAX_PAGE_SIZE, ProductQuery, ProductSort, SortField, SortOrder, StatusFilter};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::{ValidationError, ValidationErrors};

use super::IntoValidated;

/// Raw listing parameters. Everything arrives as a string; empty values
/// count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListProductsQuery {
    /// `draft`, `active` or `all` (default). Public callers always get `active`.
    pub status: Option<String>,
    /// Case-insensitive exact category
    pub category: Option<String>,
    /// Case-insensitive substring of name or description
    pub search: Option<String>,
    /// 1-based page number, default 1
    pub page: Option<String>,
    /// Page size, 1 to 100, default 20
    pub limit: Option<String>,
    /// `name`, `price`, `createdAt` (default) or `stock`
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default)
    pub sort_order: Option<String>,
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|s| !s.is_empty())
}

fn add(
    errors: &mut ValidationErrors,
    field: &'static str,
    code: &'static str,
    message: impl Into<Cow<'static, str>>,
) {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    errors.add(field, error);
}

/// Coerce a query value to a positive integer, optionally capped
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn positive_int(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: &str,
    max: Option<u32>,
) -> Option<u32> {
    let n = raw.trim().parse::<f64>().unwrap_or(f64::NAN);
    if !n.is_finite() {
        add(errors, field, "invalid_type", "Expected number, received nan");
        return None;
    }

    let mut valid = true;
    if n.fract() != 0.0 {
        add(errors, field, "integer", "Expected integer, received float");
        valid = false;
    }
    if n <= 0.0 {
        add(errors, field, "range", "Number must be greater than 0");
        valid = false;
    }
    let cap = max.unwrap_or(u32::MAX);
    if n > f64::from(cap) {
        add(
            errors,
            field,
            "range",
            format!("Number must be less than or equal to {cap}"),
        );
        valid = false;
    }
    valid.then_some(n as u32)
}

fn enum_error(expected: &str, received: &str) -> String {
    format!("Invalid enum value. Expected {expected}, received '{received}'")
}

impl ListProductsQuery {
    /// Validated listing request with defaults for omitted parameters
    pub fn to_product_query(&self) -> Result<ProductQuery, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut query = ProductQuery::default();

        if let Some(status) = present(self.status.as_ref()) {
            match status.parse::<StatusFilter>() {
                Ok(parsed) => query.status = parsed,
                Err(_) => add(
                    &mut errors,
                    "status",
                    "enum",
                    enum_error("'draft' | 'active' | 'all'", status),
                ),
            }
        }

        query.category = present(self.category.as_ref()).map(str::to_string);
        query.search = present(self.search.as_ref()).map(str::to_string);

        if let Some(page) = present(self.page.as_ref())
            .and_then(|raw| positive_int(&mut errors, "page", raw, None))
        {
            query.page = page;
        }
        if let Some(limit) = present(self.limit.as_ref())
            .and_then(|raw| positive_int(&mut errors, "limit", raw, Some(MAX_PAGE_SIZE)))
        {
            query.limit = limit;
        }

        let mut sort = ProductSort::default();
        if let Some(sort_by) = present(self.sort_by.as_ref()) {
            match sort_by.parse::<SortField>() {
                Ok(field) => sort.field = field,
                Err(_) => add(
                    &mut errors,
                    "sortBy",
                    "enum",
                    enum_error("'name' | 'price' | 'createdAt' | 'stock'", sort_by),
                ),
            }
        }
        if let Some(sort_order) = present(self.sort_order.as_ref()) {
            match sort_order.parse::<SortOrder>() {
                Ok(order) => sort.order = order,
                Err(_) => add(
                    &mut errors,
                    "sortOrder",
                    "enum",
                    enum_error("'asc' | 'desc'", sort_order),
                ),
            }
        }
        query.sort = sort;

        if errors.is_empty() {
            Ok(query)
        } else {
            Err(errors)
        }
    }
}

impl IntoValidated for ListProductsQuery {
    type Output = ProductQuery;

    fn into_validated(self) -> Result<ProductQuery, ValidationErrors> {
        self.to_product_query()
    }
}
