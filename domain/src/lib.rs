//! Domain layer of the benchmarkinator service.
//!
//! Re-exports the entity types consumers need so that they do not have to depend
//! on `entity_api` directly.
pub use entity_api::{prelude, settings};

pub mod error;
pub mod hardware_loader;
