//! Black-box tests for the return flow: policy resolution on lines, return
//! classification and the one-return-per-origin rule at confirmation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use salereturn_core::{DomainError, ExpectedVersion};
use salereturn_infra::{
    InMemoryProductRegistry, InMemorySaleStore, SaleService, SaleStore, ServiceError,
};
use salereturn_policies::{
    PolicyCatalog, ReturnPolicy, ReturnPolicyId, ReturnPolicyTerm, ReturnReason, ReturnReasonId,
    ReturnWindowDates, WindowAnchor,
};
use salereturn_products::{
    ActivateProduct, CategoryId, CreateProduct, Product, ProductCategory, ProductCommand,
    ProductCreated, ProductEvent, ProductId, ProductType, SetReturnPolicy,
};
use salereturn_sales::{
    AddLine, CreateSale, EffectivePolicyResolver, LineInput, SaleCommand, SaleConfiguration,
    SaleId, SaleLine, SaleLineId, SaleLineSource, SaleState,
};

type Service = SaleService<
    InMemorySaleStore,
    HashMap<ProductId, Product>,
    HashMap<CategoryId, ProductCategory>,
>;

struct Shop {
    svc: Service,
    catalog: PolicyCatalog,
    damaged: ReturnReasonId,
    thirty_days: ReturnPolicyId,
    goods: ProductId,
}

fn shop() -> Shop {
    salereturn_observability::init();

    let damaged = ReturnReasonId::generate();
    let thirty_days = ReturnPolicyId::generate();
    let store_credit = ReturnPolicyId::generate();

    let mut catalog = PolicyCatalog::new();
    catalog
        .add_reason(ReturnReason::new(damaged, "Damaged", None).unwrap())
        .unwrap();
    catalog
        .add_policy(
            ReturnPolicy::new(thirty_days, "30 days", Some("Damaged goods".to_string()))
                .unwrap()
                .with_term(ReturnPolicyTerm::new(damaged, 30, WindowAnchor::Sale)),
        )
        .unwrap();
    catalog
        .add_policy(ReturnPolicy::new(store_credit, "Store credit", None).unwrap())
        .unwrap();

    let config = SaleConfiguration::new(store_credit);
    config.validate(&catalog).unwrap();

    let category_id = CategoryId::generate();
    let category = ProductCategory::new(category_id, "Automobile")
        .unwrap()
        .with_return_policy(thirty_days);

    let goods = ProductId::generate();
    let product = Product::rehydrate(
        goods,
        &[ProductEvent::ProductCreated(ProductCreated {
            product_id: goods,
            sku: "BAT-1".to_string(),
            name: "Bat Mobile".to_string(),
            product_type: ProductType::Goods,
            categories: vec![category_id],
            return_policy: None,
            occurred_at: Utc::now(),
        })],
    );

    let resolver = EffectivePolicyResolver::new(
        config,
        HashMap::from([(goods, product)]),
        HashMap::from([(category_id, category)]),
    );

    Shop {
        svc: SaleService::new(InMemorySaleStore::new(), resolver),
        catalog,
        damaged,
        thirty_days,
        goods,
    }
}

impl Shop {
    fn draft(&self, reference: &str, lines: Vec<SaleLine>) -> SaleId {
        let sale_id = SaleId::generate();
        self.svc
            .execute(SaleCommand::CreateSale(CreateSale {
                sale_id,
                reference: reference.to_string(),
                sale_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        for line in lines {
            self.svc
                .execute(SaleCommand::AddLine(AddLine {
                    sale_id,
                    line,
                    occurred_at: Utc::now(),
                }))
                .unwrap();
        }
        sale_id
    }

    /// Confirmed sale "SO-0" with one goods line; returns the line id.
    fn sold_line(&self) -> SaleLineId {
        let line = SaleLine::product_line(SaleLineId::generate(), self.goods, 2);
        let line_id = line.id;
        let sale_id = self.draft("SO-0", vec![line]);
        self.svc
            .recompute_line(sale_id, line_id, LineInput::Product, Utc::now())
            .unwrap();
        self.svc.confirm(&[sale_id], Utc::now()).unwrap();
        line_id
    }

    /// Draft sale with one return line of `origin`; returns (sale, line).
    fn return_sale(&self, reference: &str, origin: SaleLineId) -> (SaleId, SaleLineId) {
        let line = SaleLine::product_line(SaleLineId::generate(), self.goods, -1).returning(origin);
        let line_id = line.id;
        let sale_id = self.draft(reference, vec![line]);
        self.svc
            .recompute_line(sale_id, line_id, LineInput::Origin, Utc::now())
            .unwrap();
        (sale_id, line_id)
    }

    fn state(&self, sale_id: SaleId) -> SaleState {
        self.svc.store().load(sale_id).unwrap().unwrap().state()
    }
}

fn domain(err: ServiceError) -> DomainError {
    match err {
        ServiceError::Domain(e) => e,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

#[test]
fn return_line_inherits_the_policy_pinned_on_its_origin() {
    let shop = shop();
    let sold = shop.sold_line();
    assert_eq!(
        shop.svc.effective_return_policy_at_sale(sold).unwrap(),
        Some(shop.thirty_days)
    );

    let (s1, r1) = shop.return_sale("SO-1", sold);
    assert!(shop.svc.has_return(s1).unwrap());

    let located = shop.svc.store().find_line(r1).unwrap();
    assert_eq!(located.line.return_policy, Some(shop.thirty_days));

    let policy = shop.catalog.require_policy(shop.thirty_days).unwrap();
    let day = |m, d| NaiveDate::from_ymd_opt(2024, m, d).unwrap();
    let dates = ReturnWindowDates {
        sold_on: day(3, 1),
        shipped_on: None,
    };
    assert!(policy.accepts_return(shop.damaged, &dates, day(3, 31)));
    assert!(!policy.accepts_return(shop.damaged, &dates, day(4, 1)));
}

#[test]
fn an_origin_is_returned_at_most_once_until_the_claim_is_cancelled() {
    let shop = shop();
    let sold = shop.sold_line();

    let (s1, r1) = shop.return_sale("SO-1", sold);
    let (s2, r2) = shop.return_sale("SO-2", sold);

    shop.svc.confirm(&[s1], Utc::now()).unwrap();

    let err = domain(shop.svc.confirm(&[s2], Utc::now()).unwrap_err());
    assert_eq!(
        err,
        DomainError::DuplicateReturnOrigin {
            line: r2.to_string(),
            sale_reference: "SO-1".to_string(),
        }
    );
    assert_eq!(
        err.to_string(),
        format!("The line set as origin on Sale Line {r2} has already been returned on Sale #SO-1.")
    );
    assert_eq!(shop.state(s2), SaleState::Draft);
    assert_eq!(shop.svc.returns_of(sold), vec![r1]);

    shop.svc.cancel(s1, Utc::now()).unwrap();
    assert!(shop.svc.returns_of(sold).is_empty());

    shop.svc.confirm(&[s2], Utc::now()).unwrap();
    assert_eq!(shop.state(s2), SaleState::Confirmed);
    assert_eq!(shop.svc.returns_of(sold), vec![r2]);
}

#[test]
fn distinct_unclaimed_origins_confirm_together() {
    let shop = shop();
    let a = shop.sold_line();
    let b = shop.sold_line();

    let ra = SaleLine::product_line(SaleLineId::generate(), shop.goods, -1).returning(a);
    let rb = SaleLine::product_line(SaleLineId::generate(), shop.goods, -1).returning(b);
    let (ra_id, rb_id) = (ra.id, rb.id);
    let s1 = shop.draft("SO-1", vec![ra, rb]);

    shop.svc.confirm(&[s1], Utc::now()).unwrap();
    assert_eq!(shop.svc.returns_of(a), vec![ra_id]);
    assert_eq!(shop.svc.returns_of(b), vec![rb_id]);
}

#[test]
fn one_batch_cannot_return_the_same_origin_twice() {
    let shop = shop();
    let sold = shop.sold_line();
    let (s1, _) = shop.return_sale("SO-1", sold);
    let (s2, _) = shop.return_sale("SO-2", sold);

    let err = domain(shop.svc.confirm(&[s1, s2], Utc::now()).unwrap_err());
    assert!(matches!(err, DomainError::DuplicateReturnOrigin { .. }));
    assert_eq!(shop.state(s1), SaleState::Draft);
    assert_eq!(shop.state(s2), SaleState::Draft);
    assert!(shop.svc.returns_of(sold).is_empty());
}

#[test]
fn a_confirmed_return_line_cannot_be_reused_by_another_sale() {
    let shop = shop();
    let sold = shop.sold_line();
    let (s1, r1) = shop.return_sale("SO-1", sold);
    shop.svc.confirm(&[s1], Utc::now()).unwrap();

    let reused = shop.svc.store().find_line(r1).unwrap().line;
    let s2 = shop.draft("SO-2", vec![]);
    let err = domain(
        shop.svc
            .execute(SaleCommand::AddLine(AddLine {
                sale_id: s2,
                line: reused,
                occurred_at: Utc::now(),
            }))
            .unwrap_err(),
    );
    assert!(matches!(err, DomainError::Conflict(_)));
    assert_eq!(shop.svc.returns_of(sold), vec![r1]);

    shop.svc
        .execute(SaleCommand::AddLine(AddLine {
            sale_id: s2,
            line: SaleLine::product_line(SaleLineId::generate(), shop.goods, -1).returning(sold),
            occurred_at: Utc::now(),
        }))
        .unwrap();
    let err = domain(shop.svc.confirm(&[s2], Utc::now()).unwrap_err());
    assert!(matches!(err, DomainError::DuplicateReturnOrigin { .. }));
    assert_eq!(shop.state(s2), SaleState::Draft);
    assert_eq!(shop.svc.returns_of(sold), vec![r1]);
}

#[test]
fn a_return_line_without_origin_cannot_be_confirmed() {
    let shop = shop();
    let s1 = shop.draft(
        "SO-1",
        vec![SaleLine::product_line(SaleLineId::generate(), shop.goods, -1)],
    );

    let err = domain(shop.svc.confirm(&[s1], Utc::now()).unwrap_err());
    assert!(matches!(err, DomainError::DanglingOrigin(_)));
    assert_eq!(shop.state(s1), SaleState::Draft);
}

#[test]
fn return_of_an_unknown_line_is_dangling() {
    let shop = shop();
    let (s1, _) = shop.return_sale("SO-1", SaleLineId::generate());

    let err = domain(shop.svc.confirm(&[s1], Utc::now()).unwrap_err());
    assert!(matches!(err, DomainError::DanglingOrigin(_)));
}

#[test]
fn journal_records_the_sale_lifecycle() {
    let shop = shop();
    let sold = shop.sold_line();
    let (s1, _) = shop.return_sale("SO-1", sold);
    shop.svc.confirm(&[s1], Utc::now()).unwrap();
    shop.svc.cancel(s1, Utc::now()).unwrap();

    let stream = shop.svc.store().load_stream(s1).unwrap();
    let types: Vec<&str> = stream.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        types,
        vec![
            "sales.sale.created",
            "sales.sale.line_added",
            "sales.sale.line_updated",
            "sales.sale.confirmed",
            "sales.sale.cancelled",
        ]
    );

    let json = serde_json::to_value(&stream[3]).unwrap();
    assert_eq!(json["event_type"], "sales.sale.confirmed");
    assert_eq!(json["sequence_number"], 4);
}

#[test]
fn product_policy_changes_reach_new_lines_but_not_pinned_ones() {
    salereturn_observability::init();
    let thirty_days = ReturnPolicyId::generate();
    let store_credit = ReturnPolicyId::generate();

    let products = Arc::new(InMemoryProductRegistry::new());
    let goods = ProductId::generate();
    products
        .execute(
            ProductCommand::CreateProduct(CreateProduct {
                product_id: goods,
                sku: "BAT-1".to_string(),
                name: "Bat Mobile".to_string(),
                product_type: ProductType::Goods,
                categories: vec![],
                return_policy: Some(thirty_days),
                occurred_at: Utc::now(),
            }),
            ExpectedVersion::Exact(0),
        )
        .unwrap();
    products
        .execute(
            ProductCommand::ActivateProduct(ActivateProduct {
                product_id: goods,
                occurred_at: Utc::now(),
            }),
            ExpectedVersion::Exact(1),
        )
        .unwrap();

    let resolver = EffectivePolicyResolver::new(
        SaleConfiguration::new(store_credit),
        Arc::clone(&products),
        HashMap::<CategoryId, ProductCategory>::new(),
    );
    let svc = SaleService::new(InMemorySaleStore::new(), resolver);

    let sell = |reference: &str| {
        let line = SaleLine::product_line(SaleLineId::generate(), goods, 1);
        let line_id = line.id;
        let sale_id = SaleId::generate();
        svc.execute(SaleCommand::CreateSale(CreateSale {
            sale_id,
            reference: reference.to_string(),
            sale_date: None,
            occurred_at: Utc::now(),
        }))
        .unwrap();
        svc.execute(SaleCommand::AddLine(AddLine {
            sale_id,
            line,
            occurred_at: Utc::now(),
        }))
        .unwrap();
        svc.recompute_line(sale_id, line_id, LineInput::Product, Utc::now())
            .unwrap();
        line_id
    };

    let before = sell("SO-1");
    products
        .execute(
            ProductCommand::SetReturnPolicy(SetReturnPolicy {
                product_id: goods,
                return_policy: None,
                occurred_at: Utc::now(),
            }),
            ExpectedVersion::Exact(2),
        )
        .unwrap();
    let after = sell("SO-2");

    assert_eq!(
        svc.effective_return_policy_at_sale(before).unwrap(),
        Some(thirty_days)
    );
    assert_eq!(svc.effective_return_policy_at_sale(after).unwrap(), None);
}
