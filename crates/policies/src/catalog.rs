//! Read-only catalog of return reasons and policies.
//!
//! Administrators build the catalog up front; everything downstream only
//! references policies by id and reads them back from here.

use std::collections::BTreeMap;

use salereturn_core::{DomainError, DomainResult};

use crate::policy::{ReturnPolicy, ReturnPolicyId};
use crate::reason::{ReturnReason, ReturnReasonId};

#[derive(Debug, Clone, Default)]
pub struct PolicyCatalog {
    reasons: BTreeMap<ReturnReasonId, ReturnReason>,
    policies: BTreeMap<ReturnPolicyId, ReturnPolicy>,
}

impl PolicyCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_reason(&mut self, reason: ReturnReason) -> DomainResult<()> {
        let id = reason.id_typed();
        if self.reasons.contains_key(&id) {
            return Err(DomainError::conflict(format!("return reason {id} already exists")));
        }
        self.reasons.insert(id, reason);
        Ok(())
    }

    /// Register a policy. Every term must point at a reason already in the catalog.
    pub fn add_policy(&mut self, policy: ReturnPolicy) -> DomainResult<()> {
        let id = policy.id_typed();
        if self.policies.contains_key(&id) {
            return Err(DomainError::conflict(format!("return policy {id} already exists")));
        }
        if let Some(term) = policy
            .terms()
            .iter()
            .find(|t| !self.reasons.contains_key(&t.reason))
        {
            return Err(DomainError::validation(format!(
                "policy '{}' references unknown return reason {}",
                policy.name(),
                term.reason
            )));
        }
        self.policies.insert(id, policy);
        Ok(())
    }

    pub fn policy(&self, id: ReturnPolicyId) -> Option<&ReturnPolicy> {
        self.policies.get(&id)
    }

    /// Like [`PolicyCatalog::policy`] but a missing policy is an error.
    pub fn require_policy(&self, id: ReturnPolicyId) -> DomainResult<&ReturnPolicy> {
        self.policy(id).ok_or_else(DomainError::not_found)
    }

    pub fn reason(&self, id: ReturnReasonId) -> Option<&ReturnReason> {
        self.reasons.get(&id)
    }

    pub fn policies(&self) -> impl Iterator<Item = &ReturnPolicy> {
        self.policies.values()
    }

    pub fn reasons(&self) -> impl Iterator<Item = &ReturnReason> {
        self.reasons.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ReturnPolicyTerm, WindowAnchor};

    fn reason(name: &str) -> ReturnReason {
        ReturnReason::new(ReturnReasonId::generate(), name, None).unwrap()
    }

    #[test]
    fn policy_with_unknown_reason_is_rejected() {
        let mut catalog = PolicyCatalog::new();
        let policy = ReturnPolicy::new(ReturnPolicyId::generate(), "Standard", None)
            .unwrap()
            .with_term(ReturnPolicyTerm::new(ReturnReasonId::generate(), 7, WindowAnchor::Sale));

        let err = catalog.add_policy(policy).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(catalog.policies().count(), 0);
    }

    #[test]
    fn registered_policy_is_readable_by_id() {
        let mut catalog = PolicyCatalog::new();
        let damaged = reason("Damaged");
        let damaged_id = damaged.id_typed();
        catalog.add_reason(damaged).unwrap();

        let policy_id = ReturnPolicyId::generate();
        let policy = ReturnPolicy::new(policy_id, "Standard", Some("30 days".into()))
            .unwrap()
            .with_term(ReturnPolicyTerm::new(damaged_id, 30, WindowAnchor::Shipping));
        catalog.add_policy(policy).unwrap();

        let stored = catalog.require_policy(policy_id).unwrap();
        assert_eq!(stored.name(), "Standard");
        assert_eq!(stored.terms().len(), 1);
        assert_eq!(catalog.reason(damaged_id).map(|r| r.name()), Some("Damaged"));
    }

    #[test]
    fn duplicate_ids_conflict() {
        let mut catalog = PolicyCatalog::new();
        let r = reason("Damaged");
        catalog.add_reason(r.clone()).unwrap();
        assert!(matches!(catalog.add_reason(r), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn require_missing_policy_is_not_found() {
        let catalog = PolicyCatalog::new();
        assert_eq!(
            catalog.require_policy(ReturnPolicyId::generate()).unwrap_err(),
            DomainError::NotFound
        );
    }
}
