use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

use tracing::warn;

use salereturn_core::{Aggregate, AggregateRoot};
use salereturn_events::EventEnvelope;
use salereturn_sales::{LocatedLine, Sale, SaleEvent, SaleId, SaleLineId, SaleLineSource};

use super::r#trait::{SALE_AGGREGATE_TYPE, SaleAppend, SaleStore, StoreError};

#[derive(Debug, Default)]
struct State {
    streams: HashMap<SaleId, Vec<EventEnvelope<SaleEvent>>>,
    sales: HashMap<SaleId, Sale>,
    /// Line id → owning sale. A line id belongs to exactly one sale.
    line_index: HashMap<SaleLineId, SaleId>,
    /// Origin line id → (sale, line) pairs naming it as their origin, whatever the sale state.
    origin_index: HashMap<SaleLineId, BTreeSet<(SaleId, SaleLineId)>>,
}

impl State {
    fn unindex(&mut self, sale: &Sale) {
        let sale_id = sale.id_typed();
        for line in sale.lines() {
            if self.line_index.get(&line.id) == Some(&sale_id) {
                self.line_index.remove(&line.id);
            }
            if let Some(origin) = line.origin_line() {
                if let Some(claims) = self.origin_index.get_mut(&origin) {
                    claims.remove(&(sale_id, line.id));
                    if claims.is_empty() {
                        self.origin_index.remove(&origin);
                    }
                }
            }
        }
    }

    fn index(&mut self, sale: &Sale) {
        let sale_id = sale.id_typed();
        for line in sale.lines() {
            self.line_index.insert(line.id, sale_id);
            if let Some(origin) = line.origin_line() {
                self.origin_index
                    .entry(origin)
                    .or_default()
                    .insert((sale_id, line.id));
            }
        }
    }

    fn locate_in(&self, sale_id: SaleId, line_id: SaleLineId) -> Option<LocatedLine> {
        let sale = self.sales.get(&sale_id)?;
        let line = sale.line(line_id)?;
        Some(LocatedLine::from_sale(sale, line))
    }

    fn locate(&self, line_id: SaleLineId) -> Option<LocatedLine> {
        self.locate_in(*self.line_index.get(&line_id)?, line_id)
    }

    /// Reject lines whose id is already held by a different sale.
    fn check_line_ownership(
        &self,
        sale: &Sale,
        staged: &mut HashMap<SaleLineId, SaleId>,
    ) -> Result<(), StoreError> {
        let sale_id = sale.id_typed();
        for line in sale.lines() {
            let owner = staged
                .insert(line.id, sale_id)
                .or_else(|| self.line_index.get(&line.id).copied());
            if let Some(owner) = owner.filter(|owner| *owner != sale_id) {
                return Err(StoreError::InvalidAppend(format!(
                    "line {} of sale {sale_id} already belongs to sale {owner}",
                    line.id
                )));
            }
        }
        Ok(())
    }
}

/// In-memory event-sourced sale store.
///
/// Intended for tests/dev. One lock guards the journal and both indexes, so
/// a multi-sale commit is observed all at once or not at all.
#[derive(Debug, Default)]
pub struct InMemorySaleStore {
    state: RwLock<State>,
}

impl InMemorySaleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_version(stream: Option<&Vec<EventEnvelope<SaleEvent>>>) -> u64 {
        stream
            .and_then(|s| s.last())
            .map(EventEnvelope::sequence_number)
            .unwrap_or(0)
    }
}

impl SaleStore for InMemorySaleStore {
    fn load(&self, sale_id: SaleId) -> Result<Option<Sale>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(state.sales.get(&sale_id).cloned())
    }

    fn commit(&self, appends: Vec<SaleAppend>) -> Result<(), StoreError> {
        let mut seen = HashSet::new();
        for append in &appends {
            if !seen.insert(append.sale_id) {
                return Err(StoreError::InvalidAppend(format!(
                    "sale {} appears twice in one commit",
                    append.sale_id
                )));
            }
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        // Check every stream before touching any of them.
        for append in &appends {
            let current = Self::current_version(state.streams.get(&append.sale_id));
            if !append.expected_version.matches(current) {
                return Err(StoreError::Concurrency(format!(
                    "sale {}: expected {:?}, found {current}",
                    append.sale_id, append.expected_version
                )));
            }
        }

        let mut staged = Vec::with_capacity(appends.len());
        let mut staged_lines = HashMap::new();
        for append in appends {
            if append.events.is_empty() {
                continue;
            }

            let mut sale = state
                .sales
                .get(&append.sale_id)
                .cloned()
                .unwrap_or_else(|| Sale::empty(append.sale_id));

            let mut next = Self::current_version(state.streams.get(&append.sale_id)) + 1;
            let mut envelopes = Vec::with_capacity(append.events.len());
            for event in append.events {
                sale.apply(&event);
                envelopes.push(EventEnvelope::wrap(
                    append.sale_id.0,
                    SALE_AGGREGATE_TYPE,
                    next,
                    event,
                ));
                next += 1;
            }
            debug_assert_eq!(sale.version(), next - 1);

            state.check_line_ownership(&sale, &mut staged_lines)?;
            staged.push((append.sale_id, sale, envelopes));
        }

        for (sale_id, sale, envelopes) in staged {
            if let Some(previous) = state.sales.remove(&sale_id) {
                state.unindex(&previous);
            }
            state.index(&sale);
            state.streams.entry(sale_id).or_default().extend(envelopes);
            state.sales.insert(sale_id, sale);
        }

        Ok(())
    }

    fn load_stream(&self, sale_id: SaleId) -> Result<Vec<EventEnvelope<SaleEvent>>, StoreError> {
        let state = self
            .state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(state.streams.get(&sale_id).cloned().unwrap_or_default())
    }
}

impl SaleLineSource for InMemorySaleStore {
    fn find_line(&self, id: SaleLineId) -> Option<LocatedLine> {
        match self.state.read() {
            Ok(state) => state.locate(id),
            Err(_) => {
                warn!(line = %id, "sale store lock poisoned; line lookup failed");
                None
            }
        }
    }

    fn lines_with_origin(&self, origin: SaleLineId) -> Vec<LocatedLine> {
        let state = match self.state.read() {
            Ok(s) => s,
            Err(_) => {
                warn!(origin = %origin, "sale store lock poisoned; origin lookup failed");
                return vec![];
            }
        };

        state
            .origin_index
            .get(&origin)
            .into_iter()
            .flatten()
            .filter_map(|(sale_id, line_id)| state.locate_in(*sale_id, *line_id))
            .collect()
    }
}
