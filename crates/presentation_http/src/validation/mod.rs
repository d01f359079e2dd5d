//! Request validation
//!
//! Turns untyped input into typed, bounds-checked values or a field-by-field
//! failure report.

pub mod extract;
pub mod product;
pub mod query;

pub use extract::{IntoValidated, ValidatedJson, ValidatedQuery};
pub use product::{CreateProductRequest, ProductPayload, UpdateProductRequest};
pub use query::ListProductsQuery;
