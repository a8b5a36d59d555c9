//! Line field recomputation.
//!
//! When the editing UI changes one input of a draft line (quantity, product or
//! origin), it calls [`recompute`] with the current line snapshot and gets back
//! the fields to update. Nothing here mutates the line; the caller applies the
//! patch with [`SaleLinePatch::apply_to`].

use serde::{Deserialize, Serialize};

use salereturn_core::DomainResult;
use salereturn_policies::ReturnPolicyId;
use salereturn_products::{CategoryLookup, ProductLookup};
use tracing::debug;

use crate::line::{SaleLine, is_return};
use crate::registry::SaleLineSource;
use crate::resolver::EffectivePolicyResolver;

/// Input of a line that just changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineInput {
    Quantity,
    Product,
    Origin,
}

/// Partial update of a line. `None` leaves a field as it is; `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLinePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_policy_at_sale: Option<Option<ReturnPolicyId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_policy: Option<Option<ReturnPolicyId>>,
    /// Derived value for display; never stored on the line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_return: Option<bool>,
}

impl SaleLinePatch {
    pub fn is_empty(&self) -> bool {
        self.return_policy_at_sale.is_none()
            && self.return_policy.is_none()
            && self.is_return.is_none()
    }

    pub fn apply_to(&self, line: &mut SaleLine) {
        if let Some(policy) = self.return_policy_at_sale {
            line.return_policy_at_sale = policy;
        }
        if let Some(policy) = self.return_policy {
            line.return_policy = policy;
        }
    }
}

/// Fields to update after `changed` was edited on `line`.
///
/// Only a product being cleared while no default return policy is configured
/// fails; every other gap resolves to "no policy".
pub fn recompute<P, C, S>(
    line: &SaleLine,
    changed: LineInput,
    resolver: &EffectivePolicyResolver<P, C>,
    lines: &S,
) -> DomainResult<SaleLinePatch>
where
    P: ProductLookup,
    C: CategoryLookup,
    S: SaleLineSource + ?Sized,
{
    let patch = match changed {
        LineInput::Quantity => on_quantity_change(line, resolver),
        LineInput::Product => on_product_change(line, resolver)?,
        LineInput::Origin => on_origin_change(line, resolver, lines),
    };
    debug!(line = %line.id, ?changed, ?patch, "recomputed sale line");
    Ok(patch)
}

fn on_quantity_change<P: ProductLookup, C: CategoryLookup>(
    line: &SaleLine,
    resolver: &EffectivePolicyResolver<P, C>,
) -> SaleLinePatch {
    if line.product.is_none() {
        return SaleLinePatch::default();
    }
    SaleLinePatch {
        is_return: Some(is_return(line, resolver.products())),
        ..SaleLinePatch::default()
    }
}

fn on_product_change<P: ProductLookup, C: CategoryLookup>(
    line: &SaleLine,
    resolver: &EffectivePolicyResolver<P, C>,
) -> DomainResult<SaleLinePatch> {
    let Some(product) = line.product else {
        return Ok(SaleLinePatch {
            return_policy_at_sale: Some(Some(resolver.default_return_policy_at_sale()?)),
            is_return: Some(false),
            ..SaleLinePatch::default()
        });
    };

    Ok(SaleLinePatch {
        return_policy_at_sale: Some(resolver.effective_for_product_id(product)),
        is_return: Some(is_return(line, resolver.products())),
        ..SaleLinePatch::default()
    })
}

fn on_origin_change<P, C, S>(
    line: &SaleLine,
    resolver: &EffectivePolicyResolver<P, C>,
    lines: &S,
) -> SaleLinePatch
where
    P: ProductLookup,
    C: CategoryLookup,
    S: SaleLineSource + ?Sized,
{
    // Unsaved or unknown origins have no policy to hand down.
    let policy = line
        .origin_line()
        .and_then(|id| lines.find_line(id))
        .and_then(|origin| resolver.effective_for_sale_line(&origin.line));

    SaleLinePatch {
        return_policy: Some(policy),
        ..SaleLinePatch::default()
    }
}
