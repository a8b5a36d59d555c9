//! Return policies domain module.
//!
//! Reasons, policies and their ordered terms, plus the read-only catalog that
//! products, categories, sale lines and the sale configuration reference by id.

pub mod catalog;
pub mod policy;
pub mod reason;

pub use catalog::PolicyCatalog;
pub use policy::{ReturnPolicy, ReturnPolicyId, ReturnPolicyTerm, ReturnWindowDates, WindowAnchor};
pub use reason::{ReturnReason, ReturnReasonId};
