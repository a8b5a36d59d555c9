//! Sale configuration relevant to returns.

use serde::{Deserialize, Serialize};

use salereturn_core::{DomainError, DomainResult};
use salereturn_policies::{PolicyCatalog, ReturnPolicyId};

/// Process-wide sale settings, handed to the resolver by value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfiguration {
    /// Fallback policy for lines with no product. Required once lines are edited.
    pub default_return_policy: Option<ReturnPolicyId>,
}

impl SaleConfiguration {
    pub fn new(default_return_policy: ReturnPolicyId) -> Self {
        Self {
            default_return_policy: Some(default_return_policy),
        }
    }

    pub fn default_return_policy(&self) -> DomainResult<ReturnPolicyId> {
        self.default_return_policy.ok_or_else(|| {
            DomainError::configuration_missing("sale configuration has no default return policy")
        })
    }

    /// Check the configuration against the catalog it will be used with.
    pub fn validate(&self, catalog: &PolicyCatalog) -> DomainResult<()> {
        let id = self.default_return_policy()?;
        if catalog.policy(id).is_none() {
            return Err(DomainError::validation(format!(
                "default return policy {id} is not in the catalog"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salereturn_policies::ReturnPolicy;

    #[test]
    fn unset_default_is_a_configuration_error() {
        let err = SaleConfiguration::default().default_return_policy().unwrap_err();
        assert!(matches!(err, DomainError::ConfigurationMissing(_)));
    }

    #[test]
    fn validate_requires_a_catalog_policy() {
        let mut catalog = PolicyCatalog::new();
        let known = ReturnPolicy::new(ReturnPolicyId::generate(), "Standard", None).unwrap();
        let known_id = known.id_typed();
        catalog.add_policy(known).unwrap();

        assert!(SaleConfiguration::new(known_id).validate(&catalog).is_ok());
        let err = SaleConfiguration::new(ReturnPolicyId::generate())
            .validate(&catalog)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn deserializes_without_default() {
        let config: SaleConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SaleConfiguration::default());
    }
}
