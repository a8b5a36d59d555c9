//! Product-level return policy resolution.
//!
//! The effective policy of a product is the first present value along an
//! explicit chain of sources: the product's own policy, then each of its
//! categories in stored order. An empty chain result is a valid answer.

use salereturn_policies::ReturnPolicyId;

use crate::category::CategoryId;
use crate::lookup::CategoryLookup;
use crate::product::Product;

/// One step of the product override chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySource {
    /// The policy set directly on the product.
    ProductOwn,
    /// The policy set on one of the product's categories.
    Category(CategoryId),
}

impl PolicySource {
    /// Ordered chain for `product`: own policy first, then categories.
    pub fn chain(product: &Product) -> impl Iterator<Item = PolicySource> + '_ {
        core::iter::once(PolicySource::ProductOwn)
            .chain(product.categories().iter().copied().map(PolicySource::Category))
    }

    /// Value this step contributes, if any.
    ///
    /// A category id that no longer resolves contributes nothing.
    pub fn lookup<C: CategoryLookup + ?Sized>(
        self,
        product: &Product,
        categories: &C,
    ) -> Option<ReturnPolicyId> {
        match self {
            PolicySource::ProductOwn => product.return_policy(),
            PolicySource::Category(id) => categories.category(id)?.return_policy(),
        }
    }
}

/// Effective return policy of a product (own > category > none).
pub fn effective_return_policy<C: CategoryLookup + ?Sized>(
    product: &Product,
    categories: &C,
) -> Option<ReturnPolicyId> {
    PolicySource::chain(product).find_map(|source| source.lookup(product, categories))
}

impl Product {
    /// Derived field: see [`effective_return_policy`].
    pub fn effective_return_policy<C: CategoryLookup + ?Sized>(
        &self,
        categories: &C,
    ) -> Option<ReturnPolicyId> {
        effective_return_policy(self, categories)
    }
}
