//! Return links between sale lines.
//!
//! A line whose origin is `Origin::SaleLine(x)` claims to return line `x`.
//! [`SaleLineSource`] is the read access the host provides; a plain slice of
//! sales implements it by scanning, stores can back it with an origin index.

use std::sync::Arc;

use crate::line::{SaleLine, SaleLineId};
use crate::sale::{Sale, SaleId, SaleState};

/// A line together with the sale it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedLine {
    pub sale_id: SaleId,
    pub sale_reference: String,
    pub sale_state: SaleState,
    pub line: SaleLine,
}

impl LocatedLine {
    pub fn from_sale(sale: &Sale, line: &SaleLine) -> Self {
        Self {
            sale_id: sale.id_typed(),
            sale_reference: sale.reference().to_string(),
            sale_state: sale.state(),
            line: line.clone(),
        }
    }
}

pub trait SaleLineSource {
    /// The stored line with this id, if any.
    fn find_line(&self, id: SaleLineId) -> Option<LocatedLine>;

    /// Every stored line whose origin is `origin`, whatever its sale state.
    fn lines_with_origin(&self, origin: SaleLineId) -> Vec<LocatedLine>;
}

impl<T: SaleLineSource + ?Sized> SaleLineSource for &T {
    fn find_line(&self, id: SaleLineId) -> Option<LocatedLine> {
        (**self).find_line(id)
    }

    fn lines_with_origin(&self, origin: SaleLineId) -> Vec<LocatedLine> {
        (**self).lines_with_origin(origin)
    }
}

impl<T: SaleLineSource + ?Sized> SaleLineSource for Arc<T> {
    fn find_line(&self, id: SaleLineId) -> Option<LocatedLine> {
        (**self).find_line(id)
    }

    fn lines_with_origin(&self, origin: SaleLineId) -> Vec<LocatedLine> {
        (**self).lines_with_origin(origin)
    }
}

impl SaleLineSource for [Sale] {
    fn find_line(&self, id: SaleLineId) -> Option<LocatedLine> {
        self.iter()
            .find_map(|sale| sale.line(id).map(|line| LocatedLine::from_sale(sale, line)))
    }

    fn lines_with_origin(&self, origin: SaleLineId) -> Vec<LocatedLine> {
        self.iter()
            .flat_map(|sale| {
                sale.lines()
                    .iter()
                    .filter(move |line| line.origin_line() == Some(origin))
                    .map(move |line| LocatedLine::from_sale(sale, line))
            })
            .collect()
    }
}

/// Reverse lookup of return lines, restricted to active sales.
#[derive(Debug, Clone, Copy)]
pub struct ReturnLinkRegistry<'a, S: ?Sized> {
    source: &'a S,
}

impl<'a, S: SaleLineSource + ?Sized> ReturnLinkRegistry<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Lines of active sales that claim `origin`.
    pub fn active_claims(&self, origin: SaleLineId) -> Vec<LocatedLine> {
        self.source
            .lines_with_origin(origin)
            .into_iter()
            .filter(|claim| claim.sale_state.is_active())
            .collect()
    }

    /// Derived field `returns` of a line: ids of the lines returning it.
    pub fn returns_of(&self, line: SaleLineId) -> Vec<SaleLineId> {
        self.active_claims(line)
            .into_iter()
            .map(|claim| claim.line.id)
            .collect()
    }
}
