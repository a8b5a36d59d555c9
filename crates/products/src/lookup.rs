//! Read access to products and categories.
//!
//! The host owns persistence; resolution code only needs lookups by id.

use std::collections::HashMap;
use std::sync::Arc;

use crate::category::{CategoryId, ProductCategory};
use crate::product::{Product, ProductId};

pub trait CategoryLookup {
    fn category(&self, id: CategoryId) -> Option<ProductCategory>;
}

pub trait ProductLookup {
    fn product(&self, id: ProductId) -> Option<Product>;
}

impl<T: CategoryLookup + ?Sized> CategoryLookup for &T {
    fn category(&self, id: CategoryId) -> Option<ProductCategory> {
        (**self).category(id)
    }
}

impl<T: ProductLookup + ?Sized> ProductLookup for &T {
    fn product(&self, id: ProductId) -> Option<Product> {
        (**self).product(id)
    }
}

impl<T: CategoryLookup + ?Sized> CategoryLookup for Arc<T> {
    fn category(&self, id: CategoryId) -> Option<ProductCategory> {
        (**self).category(id)
    }
}

impl<T: ProductLookup + ?Sized> ProductLookup for Arc<T> {
    fn product(&self, id: ProductId) -> Option<Product> {
        (**self).product(id)
    }
}

impl CategoryLookup for HashMap<CategoryId, ProductCategory> {
    fn category(&self, id: CategoryId) -> Option<ProductCategory> {
        self.get(&id).cloned()
    }
}

impl ProductLookup for HashMap<ProductId, Product> {
    fn product(&self, id: ProductId) -> Option<Product> {
        self.get(&id).cloned()
    }
}
