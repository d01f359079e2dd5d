//! Domain layer for the product catalog
//!
//! Contains the product entity, its value objects, and domain errors.
//! This layer has no I/O and defines the ubiquitous language of the catalog.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
