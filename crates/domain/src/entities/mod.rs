//! Domain entities

mod product;

pub use product::{NewProduct, Product, ProductChanges, timestamp_now};
