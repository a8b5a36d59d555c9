//! Product master data that sale lines resolve their return policy from.
//!
//! Products change only through their commands. Each command carries the
//! version the caller last read; a product that moved on since is a conflict.

use std::collections::HashMap;
use std::sync::RwLock;

use tracing::{info, warn};

use salereturn_core::{Aggregate, AggregateRoot, ExpectedVersion};
use salereturn_products::{Product, ProductCommand, ProductId, ProductLookup};

use crate::sale_service::ServiceError;
use crate::sale_store::StoreError;

#[derive(Debug, Default)]
pub struct InMemoryProductRegistry {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one command against the stored product and keep the result.
    pub fn execute(
        &self,
        command: ProductCommand,
        expected: ExpectedVersion,
    ) -> Result<Product, ServiceError> {
        let product_id = command.product_id();
        let mut products = self
            .products
            .write()
            .map_err(|_| StoreError::Unavailable("product registry lock poisoned".to_string()))?;

        let mut product = products
            .get(&product_id)
            .cloned()
            .unwrap_or_else(|| Product::empty(product_id));
        expected.check(product.version())?;

        let events = product.handle(&command)?;
        if events.is_empty() {
            return Ok(product);
        }
        for event in &events {
            product.apply(event);
        }

        info!(
            product = %product_id,
            version = product.version(),
            status = ?product.status(),
            "product updated"
        );
        products.insert(product_id, product.clone());
        Ok(product)
    }
}

impl ProductLookup for InMemoryProductRegistry {
    fn product(&self, id: ProductId) -> Option<Product> {
        match self.products.read() {
            Ok(products) => products.get(&id).cloned(),
            Err(_) => {
                warn!(product = %id, "product registry lock poisoned; lookup failed");
                None
            }
        }
    }
}
