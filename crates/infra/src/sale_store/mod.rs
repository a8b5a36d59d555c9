//! Sale persistence boundary.
//!
//! Sales are stored as append-only event streams. The store keeps the current
//! state of every sale and the line indexes the return checks read from.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemorySaleStore;
pub use r#trait::{SALE_AGGREGATE_TYPE, SaleAppend, SaleStore, StoreError};
