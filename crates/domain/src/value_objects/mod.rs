//! Value objects - Immutable domain primitives

mod price;
mod product_id;
mod product_status;
mod viewer;

pub use price::{MAX_PRICE, Price};
pub use product_id::ProductId;
pub use product_status::ProductStatus;
pub use viewer::Viewer;
