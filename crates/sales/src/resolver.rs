//! Effective return policy resolution.
//!
//! Precedence is strictly: policy pinned on the line at sale time, then the
//! product chain (own policy, then categories in order). Nothing is cached, so
//! edits to products or categories show up on the next call for every line
//! that has not pinned its own policy.

use salereturn_core::DomainResult;
use salereturn_policies::ReturnPolicyId;
use salereturn_products::{CategoryLookup, Product, ProductId, ProductLookup};

use crate::config::SaleConfiguration;
use crate::line::SaleLine;

#[derive(Debug, Clone)]
pub struct EffectivePolicyResolver<P, C> {
    config: SaleConfiguration,
    products: P,
    categories: C,
}

impl<P, C> EffectivePolicyResolver<P, C>
where
    P: ProductLookup,
    C: CategoryLookup,
{
    pub fn new(config: SaleConfiguration, products: P, categories: C) -> Self {
        Self {
            config,
            products,
            categories,
        }
    }

    pub fn config(&self) -> &SaleConfiguration {
        &self.config
    }

    pub fn products(&self) -> &P {
        &self.products
    }

    pub fn categories(&self) -> &C {
        &self.categories
    }

    pub fn effective_for_product(&self, product: &Product) -> Option<ReturnPolicyId> {
        product.effective_return_policy(&self.categories)
    }

    /// Like [`Self::effective_for_product`]; an unknown product resolves to none.
    pub fn effective_for_product_id(&self, id: ProductId) -> Option<ReturnPolicyId> {
        let product = self.products.product(id)?;
        self.effective_for_product(&product)
    }

    /// Derived field `effective_return_policy_at_sale` of a line.
    pub fn effective_for_sale_line(&self, line: &SaleLine) -> Option<ReturnPolicyId> {
        line.return_policy_at_sale
            .or_else(|| self.effective_for_product_id(line.product?))
    }

    /// Default `return_policy_at_sale` for a line without product.
    pub fn default_return_policy_at_sale(&self) -> DomainResult<ReturnPolicyId> {
        self.config.default_return_policy()
    }
}
