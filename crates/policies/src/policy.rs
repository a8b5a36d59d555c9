use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use salereturn_core::{DomainError, DomainResult, Entity, ValueObject, domain_id};

use crate::reason::ReturnReasonId;

domain_id!(
    /// Return policy identifier.
    ReturnPolicyId
);

/// Date a term's day window is counted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowAnchor {
    Sale,
    Shipping,
}

/// Dates of the original sale a return window can be anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnWindowDates {
    pub sold_on: NaiveDate,
    /// Unknown until the goods have shipped.
    pub shipped_on: Option<NaiveDate>,
}

impl ReturnWindowDates {
    pub fn anchor(&self, anchor: WindowAnchor) -> Option<NaiveDate> {
        match anchor {
            WindowAnchor::Sale => Some(self.sold_on),
            WindowAnchor::Shipping => self.shipped_on,
        }
    }
}

/// One rule of a policy: for `reason`, returns are accepted for `days` days
/// counted from `since`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnPolicyTerm {
    pub reason: ReturnReasonId,
    pub days: u32,
    pub since: WindowAnchor,
    #[serde(default)]
    pub shipping_paid_by_customer: bool,
}

impl ValueObject for ReturnPolicyTerm {}

impl ReturnPolicyTerm {
    pub fn new(reason: ReturnReasonId, days: u32, since: WindowAnchor) -> Self {
        Self {
            reason,
            days,
            since,
            shipping_paid_by_customer: false,
        }
    }

    pub fn customer_pays_shipping(mut self) -> Self {
        self.shipping_paid_by_customer = true;
        self
    }

    /// Last day (inclusive) a return under this term is accepted.
    ///
    /// `None` while the anchor date is unknown (not shipped yet) or when the
    /// window runs past the calendar range.
    pub fn deadline(&self, dates: &ReturnWindowDates) -> Option<NaiveDate> {
        dates
            .anchor(self.since)?
            .checked_add_days(Days::new(u64::from(self.days)))
    }

    pub fn is_open_on(&self, dates: &ReturnWindowDates, on: NaiveDate) -> bool {
        self.deadline(dates).is_some_and(|deadline| on <= deadline)
    }
}

/// Named bundle of terms governing if and how a sold item may be returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnPolicy {
    id: ReturnPolicyId,
    name: String,
    description: Option<String>,
    terms: Vec<ReturnPolicyTerm>,
}

impl ReturnPolicy {
    pub fn new(
        id: ReturnPolicyId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("return policy name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            description,
            terms: Vec::new(),
        })
    }

    /// Append a term; terms keep insertion order.
    pub fn with_term(mut self, term: ReturnPolicyTerm) -> Self {
        self.terms.push(term);
        self
    }

    pub fn id_typed(&self) -> ReturnPolicyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn terms(&self) -> &[ReturnPolicyTerm] {
        &self.terms
    }

    pub fn terms_for(&self, reason: ReturnReasonId) -> impl Iterator<Item = &ReturnPolicyTerm> {
        self.terms.iter().filter(move |t| t.reason == reason)
    }

    /// Whether a return for `reason` is still inside one of the policy windows.
    pub fn accepts_return(
        &self,
        reason: ReturnReasonId,
        dates: &ReturnWindowDates,
        on: NaiveDate,
    ) -> bool {
        self.terms_for(reason).any(|t| t.is_open_on(dates, on))
    }
}

impl Entity for ReturnPolicy {
    type Id = ReturnPolicyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates(shipped: Option<NaiveDate>) -> ReturnWindowDates {
        ReturnWindowDates {
            sold_on: date(2024, 3, 1),
            shipped_on: shipped,
        }
    }

    #[test]
    fn blank_policy_name_is_rejected() {
        let err = ReturnPolicy::new(ReturnPolicyId::generate(), "", None).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("name")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn terms_keep_insertion_order() {
        let damaged = ReturnReasonId::generate();
        let wrong_size = ReturnReasonId::generate();
        let policy = ReturnPolicy::new(ReturnPolicyId::generate(), "Standard", None)
            .unwrap()
            .with_term(ReturnPolicyTerm::new(damaged, 7, WindowAnchor::Sale))
            .with_term(ReturnPolicyTerm::new(wrong_size, 30, WindowAnchor::Shipping));

        let reasons: Vec<_> = policy.terms().iter().map(|t| t.reason).collect();
        assert_eq!(reasons, vec![damaged, wrong_size]);
    }

    #[test]
    fn sale_anchored_deadline_counts_from_sale_date() {
        let term = ReturnPolicyTerm::new(ReturnReasonId::generate(), 7, WindowAnchor::Sale);
        assert_eq!(term.deadline(&dates(None)), Some(date(2024, 3, 8)));
        assert!(term.is_open_on(&dates(None), date(2024, 3, 8)));
        assert!(!term.is_open_on(&dates(None), date(2024, 3, 9)));
    }

    #[test]
    fn shipping_anchored_window_waits_for_shipment() {
        let term = ReturnPolicyTerm::new(ReturnReasonId::generate(), 30, WindowAnchor::Shipping);
        assert_eq!(term.deadline(&dates(None)), None);
        assert_eq!(
            term.deadline(&dates(Some(date(2024, 3, 5)))),
            Some(date(2024, 4, 4))
        );
    }

    #[test]
    fn zero_day_term_only_covers_the_anchor_day() {
        let term = ReturnPolicyTerm::new(ReturnReasonId::generate(), 0, WindowAnchor::Sale);
        assert!(term.is_open_on(&dates(None), date(2024, 3, 1)));
        assert!(!term.is_open_on(&dates(None), date(2024, 3, 2)));
    }

    #[test]
    fn accepts_return_only_for_listed_reasons() {
        let damaged = ReturnReasonId::generate();
        let policy = ReturnPolicy::new(ReturnPolicyId::generate(), "Standard", None)
            .unwrap()
            .with_term(ReturnPolicyTerm::new(damaged, 7, WindowAnchor::Sale));

        assert!(policy.accepts_return(damaged, &dates(None), date(2024, 3, 2)));
        assert!(!policy.accepts_return(ReturnReasonId::generate(), &dates(None), date(2024, 3, 2)));
    }

    #[test]
    fn term_wire_shape_uses_lowercase_anchor() {
        let term = ReturnPolicyTerm::new(ReturnReasonId::generate(), 30, WindowAnchor::Shipping)
            .customer_pays_shipping();
        let json = serde_json::to_value(&term).unwrap();
        assert_eq!(json["since"], "shipping");
        assert_eq!(json["shipping_paid_by_customer"], true);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: a window is open exactly up to anchor + days.
            #[test]
            fn window_closes_the_day_after_deadline(days in 0u32..3650, offset in 0i64..4000) {
                let term = ReturnPolicyTerm::new(ReturnReasonId::generate(), days, WindowAnchor::Sale);
                let sold = date(2024, 1, 1);
                let on = sold + chrono::Duration::days(offset);
                let dates = ReturnWindowDates { sold_on: sold, shipped_on: None };
                prop_assert_eq!(term.is_open_on(&dates, on), offset <= i64::from(days));
            }
        }
    }
}
