use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use salereturn_core::{Aggregate, AggregateRoot, DomainError, domain_id};
use salereturn_events::Event;
use salereturn_policies::ReturnPolicyId;

use crate::category::CategoryId;

domain_id!(
    /// Product identifier.
    ProductId
);

/// Product status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Draft,
    Active,
    Archived,
}

/// What kind of thing is sold. Only goods can be physically returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Goods,
    Service,
    Assets,
}

/// Aggregate root: Product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    sku: String,
    name: String,
    product_type: ProductType,
    categories: Vec<CategoryId>,
    return_policy: Option<ReturnPolicyId>,
    status: ProductStatus,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            sku: String::new(),
            name: String::new(),
            product_type: ProductType::Goods,
            categories: Vec::new(),
            return_policy: None,
            status: ProductStatus::Draft,
            version: 0,
            created: false,
        }
    }

    /// Rebuild state from a stored event stream.
    pub fn rehydrate<'a>(id: ProductId, events: impl IntoIterator<Item = &'a ProductEvent>) -> Self {
        let mut product = Self::empty(id);
        for event in events {
            product.apply(event);
        }
        product
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    pub fn is_goods(&self) -> bool {
        self.product_type == ProductType::Goods
    }

    /// Categories in their stored order (first match wins during resolution).
    pub fn categories(&self) -> &[CategoryId] {
        &self.categories
    }

    /// The product's own return policy, ignoring its categories.
    pub fn return_policy(&self) -> Option<ReturnPolicyId> {
        self.return_policy
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    /// Return-related fields are frozen once a product is archived.
    pub fn is_editable(&self) -> bool {
        self.status != ProductStatus::Archived
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub product_type: ProductType,
    #[serde(default)]
    pub categories: Vec<CategoryId>,
    #[serde(default)]
    pub return_policy: Option<ReturnPolicyId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ActivateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateProduct {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ArchiveProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveProduct {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetReturnPolicy (assign or clear the product's own policy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetReturnPolicy {
    pub product_id: ProductId,
    pub return_policy: Option<ReturnPolicyId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetCategories (replace the ordered category list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCategories {
    pub product_id: ProductId,
    pub categories: Vec<CategoryId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    ActivateProduct(ActivateProduct),
    ArchiveProduct(ArchiveProduct),
    SetReturnPolicy(SetReturnPolicy),
    SetCategories(SetCategories),
}

impl ProductCommand {
    pub fn product_id(&self) -> ProductId {
        match self {
            ProductCommand::CreateProduct(c) => c.product_id,
            ProductCommand::ActivateProduct(c) => c.product_id,
            ProductCommand::ArchiveProduct(c) => c.product_id,
            ProductCommand::SetReturnPolicy(c) => c.product_id,
            ProductCommand::SetCategories(c) => c.product_id,
        }
    }
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub product_type: ProductType,
    pub categories: Vec<CategoryId>,
    pub return_policy: Option<ReturnPolicyId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductActivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductActivated {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductArchived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductArchived {
    pub product_id: ProductId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReturnPolicyChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnPolicyChanged {
    pub product_id: ProductId,
    pub return_policy: Option<ReturnPolicyId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CategoriesChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoriesChanged {
    pub product_id: ProductId,
    pub categories: Vec<CategoryId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    ProductActivated(ProductActivated),
    ProductArchived(ProductArchived),
    ReturnPolicyChanged(ReturnPolicyChanged),
    CategoriesChanged(CategoriesChanged),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "products.product.created",
            ProductEvent::ProductActivated(_) => "products.product.activated",
            ProductEvent::ProductArchived(_) => "products.product.archived",
            ProductEvent::ReturnPolicyChanged(_) => "products.product.return_policy_changed",
            ProductEvent::CategoriesChanged(_) => "products.product.categories_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::ProductActivated(e) => e.occurred_at,
            ProductEvent::ProductArchived(e) => e.occurred_at,
            ProductEvent::ReturnPolicyChanged(e) => e.occurred_at,
            ProductEvent::CategoriesChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.sku = e.sku.clone();
                self.name = e.name.clone();
                self.product_type = e.product_type;
                self.categories = e.categories.clone();
                self.return_policy = e.return_policy;
                self.status = ProductStatus::Draft;
                self.created = true;
            }
            ProductEvent::ProductActivated(_) => {
                self.status = ProductStatus::Active;
            }
            ProductEvent::ProductArchived(_) => {
                self.status = ProductStatus::Archived;
            }
            ProductEvent::ReturnPolicyChanged(e) => {
                self.return_policy = e.return_policy;
            }
            ProductEvent::CategoriesChanged(e) => {
                self.categories = e.categories.clone();
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::ActivateProduct(cmd) => self.handle_activate(cmd),
            ProductCommand::ArchiveProduct(cmd) => self.handle_archive(cmd),
            ProductCommand::SetReturnPolicy(cmd) => self.handle_set_return_policy(cmd),
            ProductCommand::SetCategories(cmd) => self.handle_set_categories(cmd),
        }
    }
}

fn ensure_distinct(categories: &[CategoryId]) -> Result<(), DomainError> {
    for (idx, id) in categories.iter().enumerate() {
        if categories[..idx].contains(id) {
            return Err(DomainError::validation(format!(
                "category {id} listed more than once"
            )));
        }
    }
    Ok(())
}

impl Product {
    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn ensure_existing(&self, product_id: ProductId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_product_id(product_id)
    }

    fn ensure_editable(&self) -> Result<(), DomainError> {
        if !self.is_editable() {
            return Err(DomainError::invariant(
                "archived products cannot change their return settings",
            ));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        if cmd.sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }

        ensure_distinct(&cmd.categories)?;

        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            product_id: cmd.product_id,
            sku: cmd.sku.clone(),
            name: cmd.name.clone(),
            product_type: cmd.product_type,
            categories: cmd.categories.clone(),
            return_policy: cmd.return_policy,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_activate(&self, cmd: &ActivateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_existing(cmd.product_id)?;

        if self.status == ProductStatus::Active {
            return Err(DomainError::conflict("product is already active"));
        }

        if self.status == ProductStatus::Archived {
            return Err(DomainError::invariant("archived products cannot be activated"));
        }

        Ok(vec![ProductEvent::ProductActivated(ProductActivated {
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_archive(&self, cmd: &ArchiveProduct) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_existing(cmd.product_id)?;

        if self.status == ProductStatus::Archived {
            return Err(DomainError::conflict("product is already archived"));
        }

        Ok(vec![ProductEvent::ProductArchived(ProductArchived {
            product_id: cmd.product_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_return_policy(
        &self,
        cmd: &SetReturnPolicy,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_existing(cmd.product_id)?;
        self.ensure_editable()?;

        // Re-assigning the same policy is a no-op.
        if self.return_policy == cmd.return_policy {
            return Ok(vec![]);
        }

        Ok(vec![ProductEvent::ReturnPolicyChanged(ReturnPolicyChanged {
            product_id: cmd.product_id,
            return_policy: cmd.return_policy,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_categories(
        &self,
        cmd: &SetCategories,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_existing(cmd.product_id)?;
        self.ensure_editable()?;
        ensure_distinct(&cmd.categories)?;

        if self.categories == cmd.categories {
            return Ok(vec![]);
        }

        Ok(vec![ProductEvent::CategoriesChanged(CategoriesChanged {
            product_id: cmd.product_id,
            categories: cmd.categories.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
