//! Backing store abstraction.
//!
//! This module defines the per-entity store trait consumed by the
//! repository and an in-memory implementation of it.

mod memory;
mod traits;

pub use memory::MemorySource;
pub use traits::DataSource;
