//! Application services - Use case implementations

mod product_service;

pub use product_service::{
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Pagination, ProductPage, ProductQuery, ProductService,
    StatusFilter,
};
