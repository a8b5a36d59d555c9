use chrono::{DateTime, Utc};

/// A fact recorded in a product or sale stream.
///
/// The journal stores each typed event next to its stable name, so renaming a
/// Rust variant never changes what was written. Bump [`Event::version`] when
/// the payload shape of an event type changes.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted `context.aggregate.fact` name, e.g. `"sales.sale.confirmed"`.
    fn event_type(&self) -> &'static str;

    fn version(&self) -> u32;

    /// Business time of the fact, not the time it was journaled.
    fn occurred_at(&self) -> DateTime<Utc>;
}
