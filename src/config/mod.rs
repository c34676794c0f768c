//! Configuration for pixology
//!
//! Provides types, discovery and loading for `pixology.toml`.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
