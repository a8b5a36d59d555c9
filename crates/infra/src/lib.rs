//! Infrastructure layer: sale persistence and command execution.
//!
//! - [`product_registry`]: product master data, changed through product
//!   commands and read by the policy resolver.
//! - [`sale_store`]: event-sourced sale store with the line indexes the return
//!   checks read from.
//! - [`sale_service`]: loads sales, runs commands and the confirmation-time
//!   origin check, commits atomically.

pub mod product_registry;
pub mod sale_service;
pub mod sale_store;

pub use product_registry::InMemoryProductRegistry;
pub use sale_service::{SaleService, ServiceError};
pub use sale_store::{InMemorySaleStore, SALE_AGGREGATE_TYPE, SaleAppend, SaleStore, StoreError};
