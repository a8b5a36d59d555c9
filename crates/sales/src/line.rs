use serde::{Deserialize, Serialize};

use salereturn_core::domain_id;
use salereturn_policies::{ReturnPolicyId, ReturnReasonId};
use salereturn_products::{Product, ProductId, ProductLookup};

domain_id!(
    /// Sale line identifier.
    SaleLineId
);

/// Line kind. Only `line` rows carry products and take part in returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Line,
    Comment,
    Title,
    Subtotal,
}

/// How a return is settled with the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    #[default]
    Credit,
    Refund,
    Exchange,
}

/// Record kinds a line origin may point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginKind {
    SaleLine,
}

impl OriginKind {
    /// Selection offered when editing a line origin.
    pub const ALL: &'static [OriginKind] = &[OriginKind::SaleLine];
}

/// What a line was created from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A stored sale line; this line returns it.
    SaleLine(SaleLineId),
    /// A record of the given kind that has not been saved yet.
    Unsaved(OriginKind),
}

impl Origin {
    pub fn kind(&self) -> OriginKind {
        match self {
            Origin::SaleLine(_) => OriginKind::SaleLine,
            Origin::Unsaved(kind) => *kind,
        }
    }

    /// The referenced sale line, when the origin has a real identity.
    pub fn sale_line(&self) -> Option<SaleLineId> {
        match self {
            Origin::SaleLine(id) => Some(*id),
            Origin::Unsaved(_) => None,
        }
    }
}

/// A row of a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub id: SaleLineId,
    pub kind: LineKind,
    pub product: Option<ProductId>,
    /// Negative quantities describe goods coming back.
    pub quantity: i64,
    /// Policy in force when the line was sold; overridable by the seller.
    pub return_policy_at_sale: Option<ReturnPolicyId>,
    pub origin: Option<Origin>,
    pub return_policy: Option<ReturnPolicyId>,
    #[serde(default)]
    pub return_type: ReturnType,
    pub return_reason: Option<ReturnReasonId>,
}

impl SaleLine {
    /// Blank line of the given kind.
    pub fn new(id: SaleLineId, kind: LineKind) -> Self {
        Self {
            id,
            kind,
            product: None,
            quantity: 0,
            return_policy_at_sale: None,
            origin: None,
            return_policy: None,
            return_type: ReturnType::default(),
            return_reason: None,
        }
    }

    pub fn product_line(id: SaleLineId, product: ProductId, quantity: i64) -> Self {
        Self {
            product: Some(product),
            quantity,
            ..Self::new(id, LineKind::Line)
        }
    }

    /// Mark this line as returning `origin`.
    pub fn returning(mut self, origin: SaleLineId) -> Self {
        self.origin = Some(Origin::SaleLine(origin));
        self
    }

    pub fn with_reason(mut self, reason: ReturnReasonId, return_type: ReturnType) -> Self {
        self.return_reason = Some(reason);
        self.return_type = return_type;
        self
    }

    pub fn origin_line(&self) -> Option<SaleLineId> {
        self.origin.as_ref().and_then(Origin::sale_line)
    }

    /// Classifier against an already loaded product.
    ///
    /// `product` must be the record `self.product` points at; `None` when the
    /// line has no product or it could not be loaded.
    pub fn is_return_of_product(&self, product: Option<&Product>) -> bool {
        self.kind == LineKind::Line
            && self.product.is_some()
            && product.is_some_and(Product::is_goods)
            && self.quantity < 0
    }
}

/// Whether `line` is a return: a `line` row on a goods product with a
/// negative quantity. The origin plays no part in the decision.
pub fn is_return<P: ProductLookup + ?Sized>(line: &SaleLine, products: &P) -> bool {
    let product = line.product.and_then(|id| products.product(id));
    line.is_return_of_product(product.as_ref())
}
