//! Sales domain module: sale orders with return handling.
//!
//! - [`sale`]: the event-sourced `Sale` aggregate (draft → confirmed → done, or cancelled).
//! - [`line`]: sale lines, the origin reference and the return classifier.
//! - [`resolver`]: effective return policy for products and lines.
//! - [`patch`]: recomputation of line fields when an input changes.
//! - [`registry`]: reverse lookup of the lines returning a given line.
//! - [`validator`]: the one-return-per-origin check run at confirmation.
//!
//! Everything here is deterministic domain logic; stores are reached through
//! the lookup traits.

pub mod config;
pub mod line;
pub mod patch;
pub mod registry;
pub mod resolver;
pub mod sale;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::SaleConfiguration;
pub use line::{LineKind, Origin, OriginKind, ReturnType, SaleLine, SaleLineId, is_return};
pub use patch::{LineInput, SaleLinePatch, recompute};
pub use registry::{LocatedLine, ReturnLinkRegistry, SaleLineSource};
pub use resolver::EffectivePolicyResolver;
pub use sale::{
    AddLine, CancelSale, ConfirmSale, CreateSale, LineAdded, LineRemoved, LineUpdated, MarkDone,
    RemoveLine, Sale, SaleCancelled, SaleCommand, SaleConfirmed, SaleCreated, SaleDone, SaleEvent,
    SaleId, SaleState, UpdateLine,
};
pub use validator::SaleReturnValidator;
