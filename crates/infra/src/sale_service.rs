//! Command execution for sales, including the return-aware confirmation.
//!
//! ```text
//! Command
//!   ↓
//! 1. Load current sale state from the store
//!   ↓
//! 2. Handle command (pure decision logic, produces events)
//!   ↓
//! 3. [confirm only] apply to a working copy, run SaleReturnValidator over the batch
//!   ↓
//! 4. Commit events with an exact expected version per sale
//! ```
//!
//! Writes are serialized behind one lock so the origin check and the commit
//! that relies on it cannot interleave with another write. The per-sale
//! version check still catches writers that bypass the service.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use salereturn_core::{Aggregate, AggregateRoot, DomainError, ExpectedVersion};
use salereturn_policies::ReturnPolicyId;
use salereturn_products::{CategoryLookup, ProductLookup};
use salereturn_sales::{
    CancelSale, ConfirmSale, EffectivePolicyResolver, LineInput, ReturnLinkRegistry, Sale,
    SaleCommand, SaleEvent, SaleId, SaleLineId, SaleLinePatch, SaleReturnValidator, UpdateLine,
    recompute,
};

use crate::sale_store::{SaleAppend, SaleStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// The domain error behind this failure, if it is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            ServiceError::Store(_) => None,
        }
    }
}

pub struct SaleService<S, P, C> {
    store: S,
    resolver: EffectivePolicyResolver<P, C>,
    write_lock: Mutex<()>,
}

impl<S, P, C> SaleService<S, P, C> {
    pub fn new(store: S, resolver: EffectivePolicyResolver<P, C>) -> Self {
        Self {
            store,
            resolver,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn resolver(&self) -> &EffectivePolicyResolver<P, C> {
        &self.resolver
    }
}

impl<S, P, C> SaleService<S, P, C>
where
    S: SaleStore,
    P: ProductLookup,
    C: CategoryLookup,
{
    /// Execute one command against one sale.
    ///
    /// `ConfirmSale` is routed through [`Self::confirm`] so a single-sale
    /// confirmation gets the same origin check as a batch.
    pub fn execute(&self, command: SaleCommand) -> Result<Sale, ServiceError> {
        if let SaleCommand::ConfirmSale(cmd) = &command {
            let mut confirmed = self.confirm(&[cmd.sale_id], cmd.occurred_at)?;
            return confirmed
                .pop()
                .ok_or_else(|| ServiceError::Domain(DomainError::not_found()));
        }

        let _guard = self.lock()?;
        self.execute_locked(&command)
    }

    /// Load, decide and commit one command. Callers hold the write lock.
    fn execute_locked(&self, command: &SaleCommand) -> Result<Sale, ServiceError> {
        let sale_id = command.sale_id();
        if let SaleCommand::AddLine(cmd) = command {
            self.ensure_line_unowned(sale_id, cmd.line.id)?;
        }

        let current = self
            .store
            .load(sale_id)?
            .unwrap_or_else(|| Sale::empty(sale_id));

        let (sale, append) = decide(current, command)?;
        self.store.commit(vec![append])?;
        debug!(sale = %sale_id, version = sale.version(), "sale command committed");
        Ok(sale)
    }

    /// A line id names one line of one sale.
    fn ensure_line_unowned(
        &self,
        sale_id: SaleId,
        line_id: SaleLineId,
    ) -> Result<(), ServiceError> {
        match self.store.find_line(line_id) {
            Some(owner) if owner.sale_id != sale_id => Err(DomainError::conflict(format!(
                "line {line_id} already belongs to sale {}",
                owner.sale_reference
            ))
            .into()),
            _ => Ok(()),
        }
    }

    /// Confirm a batch of draft sales together.
    ///
    /// Every sale goes through its own base confirmation first; the batch is
    /// then checked for duplicate return claims. Any failure leaves the store
    /// untouched.
    pub fn confirm(
        &self,
        sale_ids: &[SaleId],
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<Sale>, ServiceError> {
        let mut seen = HashSet::new();
        if let Some(dup) = sale_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(DomainError::validation(format!(
                "sale {dup} is listed twice in one confirmation"
            ))
            .into());
        }

        let _guard = self.lock()?;
        let mut batch = Vec::with_capacity(sale_ids.len());
        let mut appends = Vec::with_capacity(sale_ids.len());
        for &sale_id in sale_ids {
            let current = self
                .store
                .load(sale_id)?
                .ok_or_else(DomainError::not_found)?;
            let (sale, append) = decide(
                current,
                &SaleCommand::ConfirmSale(ConfirmSale {
                    sale_id,
                    occurred_at,
                }),
            )?;
            batch.push(sale);
            appends.push(append);
        }

        let validator = SaleReturnValidator::new(&self.store, self.resolver.products());
        if let Err(err) = validator.on_confirm(&batch) {
            warn!(error = %err, sales = batch.len(), "sale confirmation rejected");
            return Err(err.into());
        }

        self.store.commit(appends)?;
        for sale in &batch {
            info!(sale = %sale.id_typed(), reference = sale.reference(), "sale confirmed");
        }
        Ok(batch)
    }

    /// Cancel a sale; its lines stop holding return claims.
    pub fn cancel(&self, sale_id: SaleId, occurred_at: DateTime<Utc>) -> Result<Sale, ServiceError> {
        let sale = self.execute(SaleCommand::CancelSale(CancelSale {
            sale_id,
            occurred_at,
        }))?;
        info!(sale = %sale_id, reference = sale.reference(), "sale cancelled");
        Ok(sale)
    }

    /// Lines of active sales returning `line`.
    pub fn returns_of(&self, line: SaleLineId) -> Vec<SaleLineId> {
        ReturnLinkRegistry::new(&self.store).returns_of(line)
    }

    /// Derived `has_return` of a stored sale.
    pub fn has_return(&self, sale_id: SaleId) -> Result<bool, ServiceError> {
        let sale = self
            .store
            .load(sale_id)?
            .ok_or_else(DomainError::not_found)?;
        Ok(sale.has_return(self.resolver.products()))
    }

    /// Derived `effective_return_policy_at_sale` of a stored line.
    pub fn effective_return_policy_at_sale(
        &self,
        line: SaleLineId,
    ) -> Result<Option<ReturnPolicyId>, ServiceError> {
        let located = self.store.find_line(line).ok_or_else(DomainError::not_found)?;
        Ok(self.resolver.effective_for_sale_line(&located.line))
    }

    /// Recompute a draft line after `changed` was edited and store the result.
    ///
    /// The patch is decided and committed against the version that was read,
    /// under the write lock. Returns the patch that was applied; an empty
    /// patch writes nothing.
    pub fn recompute_line(
        &self,
        sale_id: SaleId,
        line_id: SaleLineId,
        changed: LineInput,
        occurred_at: DateTime<Utc>,
    ) -> Result<SaleLinePatch, ServiceError> {
        let _guard = self.lock()?;
        let sale = self
            .store
            .load(sale_id)?
            .ok_or_else(DomainError::not_found)?;
        let line = sale.line(line_id).ok_or_else(DomainError::not_found)?;

        let patch = recompute(line, changed, &self.resolver, &self.store)?;
        let mut updated = line.clone();
        patch.apply_to(&mut updated);
        if updated != *line {
            let (sale, append) = decide(
                sale,
                &SaleCommand::UpdateLine(UpdateLine {
                    sale_id,
                    line: updated,
                    occurred_at,
                }),
            )?;
            self.store.commit(vec![append])?;
            debug!(sale = %sale_id, line = %line_id, version = sale.version(), "line recomputed");
        }
        Ok(patch)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, StoreError> {
        self.write_lock
            .lock()
            .map_err(|_| StoreError::Unavailable("write lock poisoned".to_string()))
    }
}

/// Handle `command` against `sale`, returning the evolved state and the append
/// that records it.
fn decide(mut sale: Sale, command: &SaleCommand) -> Result<(Sale, SaleAppend), DomainError> {
    let expected_version = ExpectedVersion::Exact(sale.version());
    let events: Vec<SaleEvent> = sale.handle(command)?;
    for event in &events {
        sale.apply(event);
    }
    let append = SaleAppend {
        sale_id: command.sale_id(),
        expected_version,
        events,
    };
    Ok((sale, append))
}
