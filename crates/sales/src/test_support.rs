//! Shared fixtures for unit tests.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};

use salereturn_core::Aggregate;
use salereturn_policies::ReturnPolicyId;
use salereturn_products::{
    CategoryId, Product, ProductCategory, ProductCreated, ProductEvent, ProductId, ProductType,
};

use crate::config::SaleConfiguration;
use crate::line::SaleLine;
use crate::resolver::EffectivePolicyResolver;
use crate::sale::{AddLine, CancelSale, ConfirmSale, CreateSale, Sale, SaleCommand, SaleId};

pub(crate) struct Fixture {
    pub products: HashMap<ProductId, Product>,
    pub categories: HashMap<CategoryId, ProductCategory>,
    pub config: SaleConfiguration,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            products: HashMap::new(),
            categories: HashMap::new(),
            config: SaleConfiguration::new(ReturnPolicyId::generate()),
        }
    }

    pub fn without_default() -> Self {
        Self {
            config: SaleConfiguration::default(),
            ..Self::new()
        }
    }

    pub fn default_policy(&self) -> ReturnPolicyId {
        self.config
            .default_return_policy
            .expect("fixture has a default policy")
    }

    pub fn product(
        &mut self,
        product_type: ProductType,
        own: Option<ReturnPolicyId>,
        categories: Vec<CategoryId>,
    ) -> ProductId {
        let product_id = ProductId::generate();
        let product = Product::rehydrate(
            product_id,
            &[ProductEvent::ProductCreated(ProductCreated {
                product_id,
                sku: format!("SKU-{}", self.products.len() + 1),
                name: "Bat Mobile".to_string(),
                product_type,
                categories,
                return_policy: own,
                occurred_at: Utc::now(),
            })],
        );
        self.products.insert(product_id, product);
        product_id
    }

    pub fn category(&mut self, policy: Option<ReturnPolicyId>) -> CategoryId {
        let id = CategoryId::generate();
        let mut category = ProductCategory::new(id, "Automobile").expect("valid category");
        category.set_return_policy(policy);
        self.categories.insert(id, category);
        id
    }

    pub fn resolver(
        &self,
    ) -> EffectivePolicyResolver<&HashMap<ProductId, Product>, &HashMap<CategoryId, ProductCategory>>
    {
        EffectivePolicyResolver::new(self.config.clone(), &self.products, &self.categories)
    }
}

fn run(sale: &mut Sale, command: SaleCommand) {
    let events = sale.handle(&command).expect("fixture command succeeds");
    for event in &events {
        sale.apply(event);
    }
}

/// Draft sale holding `lines`.
pub(crate) fn draft_sale(reference: &str, lines: Vec<SaleLine>) -> Sale {
    let sale_id = SaleId::generate();
    let mut sale = Sale::empty(sale_id);
    run(
        &mut sale,
        SaleCommand::CreateSale(CreateSale {
            sale_id,
            reference: reference.to_string(),
            sale_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            occurred_at: Utc::now(),
        }),
    );
    for line in lines {
        run(
            &mut sale,
            SaleCommand::AddLine(AddLine {
                sale_id,
                line,
                occurred_at: Utc::now(),
            }),
        );
    }
    sale
}

pub(crate) fn confirmed_sale(reference: &str, lines: Vec<SaleLine>) -> Sale {
    let mut sale = draft_sale(reference, lines);
    let sale_id = sale.id_typed();
    run(
        &mut sale,
        SaleCommand::ConfirmSale(ConfirmSale {
            sale_id,
            occurred_at: Utc::now(),
        }),
    );
    sale
}

pub(crate) fn cancel(sale: &mut Sale) {
    let sale_id = sale.id_typed();
    run(
        sale,
        SaleCommand::CancelSale(CancelSale {
            sale_id,
            occurred_at: Utc::now(),
        }),
    );
}
