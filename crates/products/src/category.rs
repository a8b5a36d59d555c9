use serde::{Deserialize, Serialize};

use salereturn_core::{DomainError, DomainResult, Entity, domain_id};
use salereturn_policies::ReturnPolicyId;

domain_id!(
    /// Product category identifier.
    CategoryId
);

/// Product category. Its return policy applies to every product in the
/// category that does not carry its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    id: CategoryId,
    name: String,
    return_policy: Option<ReturnPolicyId>,
}

impl ProductCategory {
    pub fn new(id: CategoryId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            return_policy: None,
        })
    }

    pub fn with_return_policy(mut self, policy: ReturnPolicyId) -> Self {
        self.return_policy = Some(policy);
        self
    }

    pub fn set_return_policy(&mut self, policy: Option<ReturnPolicyId>) {
        self.return_policy = policy;
    }

    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_policy(&self) -> Option<ReturnPolicyId> {
        self.return_policy
    }
}

impl Entity for ProductCategory {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
