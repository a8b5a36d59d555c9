use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use salereturn_core::{Aggregate, AggregateRoot, DomainError, domain_id};
use salereturn_events::Event;
use salereturn_products::ProductLookup;

use crate::line::{LineKind, SaleLine, SaleLineId, is_return};

domain_id!(
    /// Sale identifier.
    SaleId
);

/// Sale state lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleState {
    Draft,
    Confirmed,
    Done,
    Cancelled,
}

impl SaleState {
    /// Confirmed or done: lines of such sales hold their return claims.
    pub fn is_active(self) -> bool {
        matches!(self, SaleState::Confirmed | SaleState::Done)
    }
}

/// Aggregate root: Sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    id: SaleId,
    reference: String,
    sale_date: Option<NaiveDate>,
    state: SaleState,
    lines: Vec<SaleLine>,
    version: u64,
    created: bool,
}

impl Sale {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: SaleId) -> Self {
        Self {
            id,
            reference: String::new(),
            sale_date: None,
            state: SaleState::Draft,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    /// Rebuild state from a stored event stream.
    pub fn rehydrate<'a>(id: SaleId, events: impl IntoIterator<Item = &'a SaleEvent>) -> Self {
        let mut sale = Self::empty(id);
        for event in events {
            sale.apply(event);
        }
        sale
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn sale_date(&self) -> Option<NaiveDate> {
        self.sale_date
    }

    pub fn state(&self) -> SaleState {
        self.state
    }

    pub fn lines(&self) -> &[SaleLine] {
        &self.lines
    }

    pub fn line(&self, id: SaleLineId) -> Option<&SaleLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.state, SaleState::Draft)
    }

    /// Lines classified as returns, in sale order.
    pub fn return_lines<'a, P: ProductLookup + ?Sized>(
        &'a self,
        products: &'a P,
    ) -> impl Iterator<Item = &'a SaleLine> + 'a {
        self.lines.iter().filter(move |l| is_return(l, products))
    }

    /// Derived field: any line is a return.
    pub fn has_return<P: ProductLookup + ?Sized>(&self, products: &P) -> bool {
        self.return_lines(products).next().is_some()
    }
}

impl AggregateRoot for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateSale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSale {
    pub sale_id: SaleId,
    pub reference: String,
    pub sale_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub sale_id: SaleId,
    pub line: SaleLine,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateLine (replace the line with the same id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLine {
    pub sale_id: SaleId,
    pub line: SaleLine,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveLine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLine {
    pub sale_id: SaleId,
    pub line_id: SaleLineId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmSale.
///
/// This is the base confirmation only; the return-origin check needs other
/// sales and runs in [`crate::validator::SaleReturnValidator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmSale {
    pub sale_id: SaleId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelSale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelSale {
    pub sale_id: SaleId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkDone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkDone {
    pub sale_id: SaleId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleCommand {
    CreateSale(CreateSale),
    AddLine(AddLine),
    UpdateLine(UpdateLine),
    RemoveLine(RemoveLine),
    ConfirmSale(ConfirmSale),
    CancelSale(CancelSale),
    MarkDone(MarkDone),
}

impl SaleCommand {
    pub fn sale_id(&self) -> SaleId {
        match self {
            SaleCommand::CreateSale(c) => c.sale_id,
            SaleCommand::AddLine(c) => c.sale_id,
            SaleCommand::UpdateLine(c) => c.sale_id,
            SaleCommand::RemoveLine(c) => c.sale_id,
            SaleCommand::ConfirmSale(c) => c.sale_id,
            SaleCommand::CancelSale(c) => c.sale_id,
            SaleCommand::MarkDone(c) => c.sale_id,
        }
    }
}

/// Event: SaleCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCreated {
    pub sale_id: SaleId,
    pub reference: String,
    pub sale_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAdded {
    pub sale_id: SaleId,
    pub line: SaleLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineUpdated {
    pub sale_id: SaleId,
    pub line: SaleLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LineRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRemoved {
    pub sale_id: SaleId,
    pub line_id: SaleLineId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfirmed {
    pub sale_id: SaleId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCancelled {
    pub sale_id: SaleId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleDone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDone {
    pub sale_id: SaleId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleEvent {
    SaleCreated(SaleCreated),
    LineAdded(LineAdded),
    LineUpdated(LineUpdated),
    LineRemoved(LineRemoved),
    SaleConfirmed(SaleConfirmed),
    SaleCancelled(SaleCancelled),
    SaleDone(SaleDone),
}

impl Event for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::SaleCreated(_) => "sales.sale.created",
            SaleEvent::LineAdded(_) => "sales.sale.line_added",
            SaleEvent::LineUpdated(_) => "sales.sale.line_updated",
            SaleEvent::LineRemoved(_) => "sales.sale.line_removed",
            SaleEvent::SaleConfirmed(_) => "sales.sale.confirmed",
            SaleEvent::SaleCancelled(_) => "sales.sale.cancelled",
            SaleEvent::SaleDone(_) => "sales.sale.done",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::SaleCreated(e) => e.occurred_at,
            SaleEvent::LineAdded(e) => e.occurred_at,
            SaleEvent::LineUpdated(e) => e.occurred_at,
            SaleEvent::LineRemoved(e) => e.occurred_at,
            SaleEvent::SaleConfirmed(e) => e.occurred_at,
            SaleEvent::SaleCancelled(e) => e.occurred_at,
            SaleEvent::SaleDone(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Sale {
    type Command = SaleCommand;
    type Event = SaleEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SaleEvent::SaleCreated(e) => {
                self.id = e.sale_id;
                self.reference = e.reference.clone();
                self.sale_date = e.sale_date;
                self.state = SaleState::Draft;
                self.lines.clear();
                self.created = true;
            }
            SaleEvent::LineAdded(e) => {
                self.lines.push(e.line.clone());
            }
            SaleEvent::LineUpdated(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.id == e.line.id) {
                    *line = e.line.clone();
                }
            }
            SaleEvent::LineRemoved(e) => {
                self.lines.retain(|l| l.id != e.line_id);
            }
            SaleEvent::SaleConfirmed(_) => {
                self.state = SaleState::Confirmed;
            }
            SaleEvent::SaleCancelled(_) => {
                self.state = SaleState::Cancelled;
            }
            SaleEvent::SaleDone(_) => {
                self.state = SaleState::Done;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SaleCommand::CreateSale(cmd) => self.handle_create(cmd),
            SaleCommand::AddLine(cmd) => self.handle_add_line(cmd),
            SaleCommand::UpdateLine(cmd) => self.handle_update_line(cmd),
            SaleCommand::RemoveLine(cmd) => self.handle_remove_line(cmd),
            SaleCommand::ConfirmSale(cmd) => self.handle_confirm(cmd),
            SaleCommand::CancelSale(cmd) => self.handle_cancel(cmd),
            SaleCommand::MarkDone(cmd) => self.handle_mark_done(cmd),
        }
    }
}

fn validate_line(line: &SaleLine) -> Result<(), DomainError> {
    if line.kind != LineKind::Line && line.product.is_some() {
        return Err(DomainError::validation(
            "only 'line' rows can reference a product",
        ));
    }
    if line.origin_line() == Some(line.id) {
        return Err(DomainError::validation("a line cannot be its own origin"));
    }
    Ok(())
}

impl Sale {
    fn ensure_existing(&self, sale_id: SaleId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != sale_id {
            return Err(DomainError::invariant("sale_id mismatch"));
        }
        Ok(())
    }

    fn ensure_modifiable(&self) -> Result<(), DomainError> {
        if !self.is_modifiable() {
            return Err(DomainError::invariant(
                "cannot modify sale once it is confirmed, done or cancelled",
            ));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateSale) -> Result<Vec<SaleEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("sale already exists"));
        }

        if cmd.reference.trim().is_empty() {
            return Err(DomainError::validation("reference cannot be empty"));
        }

        Ok(vec![SaleEvent::SaleCreated(SaleCreated {
            sale_id: cmd.sale_id,
            reference: cmd.reference.clone(),
            sale_date: cmd.sale_date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_existing(cmd.sale_id)?;
        self.ensure_modifiable()?;
        validate_line(&cmd.line)?;

        if self.line(cmd.line.id).is_some() {
            return Err(DomainError::conflict(format!(
                "line {} already exists on this sale",
                cmd.line.id
            )));
        }

        Ok(vec![SaleEvent::LineAdded(LineAdded {
            sale_id: cmd.sale_id,
            line: cmd.line.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_line(&self, cmd: &UpdateLine) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_existing(cmd.sale_id)?;
        self.ensure_modifiable()?;
        validate_line(&cmd.line)?;

        if self.line(cmd.line.id).is_none() {
            return Err(DomainError::not_found());
        }

        Ok(vec![SaleEvent::LineUpdated(LineUpdated {
            sale_id: cmd.sale_id,
            line: cmd.line.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_line(&self, cmd: &RemoveLine) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_existing(cmd.sale_id)?;
        self.ensure_modifiable()?;

        if self.line(cmd.line_id).is_none() {
            return Err(DomainError::not_found());
        }

        Ok(vec![SaleEvent::LineRemoved(LineRemoved {
            sale_id: cmd.sale_id,
            line_id: cmd.line_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirm(&self, cmd: &ConfirmSale) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_existing(cmd.sale_id)?;

        if self.state != SaleState::Draft {
            return Err(DomainError::invariant("only draft sales can be confirmed"));
        }

        if self.lines.is_empty() {
            return Err(DomainError::validation("cannot confirm sale without lines"));
        }

        Ok(vec![SaleEvent::SaleConfirmed(SaleConfirmed {
            sale_id: cmd.sale_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelSale) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_existing(cmd.sale_id)?;

        match self.state {
            SaleState::Cancelled => Err(DomainError::conflict("sale is already cancelled")),
            SaleState::Done => Err(DomainError::invariant("done sales cannot be cancelled")),
            SaleState::Draft | SaleState::Confirmed => {
                Ok(vec![SaleEvent::SaleCancelled(SaleCancelled {
                    sale_id: cmd.sale_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }

    fn handle_mark_done(&self, cmd: &MarkDone) -> Result<Vec<SaleEvent>, DomainError> {
        self.ensure_existing(cmd.sale_id)?;

        if self.state != SaleState::Confirmed {
            return Err(DomainError::invariant(
                "only confirmed sales can be marked as done",
            ));
        }

        Ok(vec![SaleEvent::SaleDone(SaleDone {
            sale_id: cmd.sale_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
