//! Confirmation-time return check.
//!
//! An origin line may be returned by at most one active sale. The check runs
//! after the base confirmation of a batch succeeded and before anything is
//! committed; the first violation aborts the whole batch.

use std::collections::{HashMap, HashSet};

use salereturn_core::{DomainError, DomainResult};
use salereturn_products::ProductLookup;
use tracing::debug;

use crate::line::{SaleLine, SaleLineId};
use crate::registry::{ReturnLinkRegistry, SaleLineSource};
use crate::sale::{Sale, SaleId};

pub struct SaleReturnValidator<'a, S: ?Sized, P: ?Sized> {
    lines: &'a S,
    products: &'a P,
}

impl<'a, S, P> SaleReturnValidator<'a, S, P>
where
    S: SaleLineSource + ?Sized,
    P: ProductLookup + ?Sized,
{
    pub fn new(lines: &'a S, products: &'a P) -> Self {
        Self { lines, products }
    }

    /// Validate a batch of sales being confirmed together.
    ///
    /// Claims are counted from lines of active sales in the store and from
    /// every line of the batch itself. Stored copies of the batch sales are
    /// ignored, since the batch carries their current state.
    pub fn on_confirm(&self, batch: &[Sale]) -> DomainResult<()> {
        let batch_ids: HashSet<SaleId> = batch.iter().map(Sale::id_typed).collect();
        let batch_claims = batch_claims(batch);
        let registry = ReturnLinkRegistry::new(self.lines);

        for sale in batch {
            if !sale.has_return(self.products) {
                continue;
            }

            for line in sale.return_lines(self.products) {
                let origin_id = self.resolve_origin(line)?;

                if let Some((_, reference)) = batch_claims
                    .get(&origin_id)
                    .into_iter()
                    .flatten()
                    .find(|(other, _)| *other != line.id)
                {
                    return Err(DomainError::duplicate_return_origin(line.id, *reference));
                }

                if let Some(claim) = registry
                    .active_claims(origin_id)
                    .into_iter()
                    .find(|c| c.line.id != line.id && !batch_ids.contains(&c.sale_id))
                {
                    return Err(DomainError::duplicate_return_origin(
                        line.id,
                        claim.sale_reference,
                    ));
                }

                debug!(line = %line.id, origin = %origin_id, sale = sale.reference(), "return claim is unique");
            }
        }

        Ok(())
    }

    /// Every return line must name a stored sale line as its origin.
    fn resolve_origin(&self, line: &SaleLine) -> DomainResult<SaleLineId> {
        let Some(origin) = line.origin else {
            return Err(DomainError::dangling_origin(format!(
                "return line {} has no origin",
                line.id
            )));
        };
        let Some(origin_id) = origin.sale_line() else {
            return Err(DomainError::dangling_origin(format!(
                "sale line {} has an unsaved origin",
                line.id
            )));
        };
        if self.lines.find_line(origin_id).is_none() {
            return Err(DomainError::dangling_origin(format!(
                "origin {origin_id} of sale line {} does not exist",
                line.id
            )));
        }
        Ok(origin_id)
    }
}

/// Origin line → (claiming line, sale reference) for every line of the batch.
fn batch_claims(batch: &[Sale]) -> HashMap<SaleLineId, Vec<(SaleLineId, &str)>> {
    let mut claims: HashMap<SaleLineId, Vec<(SaleLineId, &str)>> = HashMap::new();
    for sale in batch {
        for line in sale.lines() {
            if let Some(origin) = line.origin_line() {
                claims
                    .entry(origin)
                    .or_default()
                    .push((line.id, sale.reference()));
            }
        }
    }
    claims
}
