//! Shared tier: cross-context, TTL-bounded, best-effort.

pub mod backend;
pub mod error;
pub mod memory;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use backend::{SharedRecord, SharedStore};
pub use error::{SharedStoreError, SharedStoreResult};
pub use memory::MemorySharedStore;
#[cfg(any(test, feature = "mock"))]
pub use mock::FlakySharedStore;
