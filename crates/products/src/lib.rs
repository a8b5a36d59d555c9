//! Products domain module (event-sourced).
//!
//! Products and categories carry an optional "own" return policy; the
//! effective policy of a product is resolved through [`return_policy`].

pub mod category;
pub mod lookup;
pub mod product;
pub mod return_policy;

pub use category::{CategoryId, ProductCategory};
pub use lookup::{CategoryLookup, ProductLookup};
pub use product::{
    ActivateProduct, ArchiveProduct, CategoriesChanged, CreateProduct, Product, ProductActivated,
    ProductArchived, ProductCommand, ProductCreated, ProductEvent, ProductId, ProductStatus,
    ProductType, ReturnPolicyChanged, SetCategories, SetReturnPolicy,
};
pub use return_policy::{PolicySource, effective_return_policy};
