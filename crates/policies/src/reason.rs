use serde::{Deserialize, Serialize};

use salereturn_core::{DomainError, DomainResult, Entity, domain_id};

domain_id!(
    /// Return reason identifier.
    ReturnReasonId
);

/// Why a customer sends goods back ("damaged in transit", "wrong size", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnReason {
    id: ReturnReasonId,
    name: String,
    description: Option<String>,
}

impl ReturnReason {
    pub fn new(
        id: ReturnReasonId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("return reason name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            description,
        })
    }

    pub fn id_typed(&self) -> ReturnReasonId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Entity for ReturnReason {
    type Id = ReturnReasonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
