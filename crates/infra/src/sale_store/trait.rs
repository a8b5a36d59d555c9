use std::sync::Arc;

use thiserror::Error;

use salereturn_core::ExpectedVersion;
use salereturn_events::EventEnvelope;
use salereturn_sales::{Sale, SaleEvent, SaleId, SaleLineSource};

/// Stable aggregate type name used in journal envelopes.
pub const SALE_AGGREGATE_TYPE: &str = "sales.sale";

/// Events decided for one sale, with the version they were decided against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleAppend {
    pub sale_id: SaleId,
    pub expected_version: ExpectedVersion,
    pub events: Vec<SaleEvent>,
}

/// Sale store operation error.
///
/// These are infrastructure errors; domain rejections never reach the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Event-sourced sale store with line lookups.
///
/// ## Commit semantics
///
/// `commit()` takes appends for one or more sales and applies them atomically:
/// every `expected_version` is checked before anything is written, and either
/// all streams advance or none do. Sequence numbers continue each stream at
/// `current_version + 1`.
///
/// ## Line lookups
///
/// Through [`SaleLineSource`] the store answers "which sale holds line X" and
/// "which lines claim X as their origin" from indexes kept in step with every
/// commit.
pub trait SaleStore: SaleLineSource + Send + Sync {
    /// Current state of a sale, `None` when it was never created.
    fn load(&self, sale_id: SaleId) -> Result<Option<Sale>, StoreError>;

    /// Append events to one or more sale streams, all or nothing.
    fn commit(&self, appends: Vec<SaleAppend>) -> Result<(), StoreError>;

    /// The journaled stream of a sale, in sequence order.
    fn load_stream(&self, sale_id: SaleId) -> Result<Vec<EventEnvelope<SaleEvent>>, StoreError>;
}

impl<S> SaleStore for Arc<S>
where
    S: SaleStore + ?Sized,
{
    fn load(&self, sale_id: SaleId) -> Result<Option<Sale>, StoreError> {
        (**self).load(sale_id)
    }

    fn commit(&self, appends: Vec<SaleAppend>) -> Result<(), StoreError> {
        (**self).commit(appends)
    }

    fn load_stream(&self, sale_id: SaleId) -> Result<Vec<EventEnvelope<SaleEvent>>, StoreError> {
        (**self).load_stream(sale_id)
    }
}
