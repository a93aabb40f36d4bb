pub use entity::{prelude, settings};

pub mod advisory_lock;
pub mod error;
pub mod setting;
