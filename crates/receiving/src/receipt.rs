use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use freshtrack_catalog::{ExpiryPolicy, ProductId};
use freshtrack_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Entity, TenantId, ValueObject};
use freshtrack_events::Event;
use freshtrack_purchasing::{OrderLine, PurchaseOrderId};

use crate::warning::{expiry_warning, has_expiry_warning};

/// Receipt identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(pub AggregateId);

impl ReceiptId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Receipt status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Draft,
    Done,
    Cancelled,
}

/// Reference back to the purchase order line a receipt line was generated
/// from. Standalone receipt lines carry none.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PurchaseLineRef {
    pub order_id: PurchaseOrderId,
    pub line_no: u32,
}

impl ValueObject for PurchaseLineRef {}

/// A line on a receiving document.
///
/// `planned_expiry_date` is the value propagated from the originating
/// purchase line at creation (or resynced later); `expiration_date` is what
/// the operator scanned on the received lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
    pub purchase_ref: Option<PurchaseLineRef>,
    pub planned_expiry_date: Option<NaiveDate>,
    pub expiration_date: Option<DateTime<Utc>>,
}

impl Entity for ReceiptLine {
    type Id = u32;

    fn id(&self) -> &Self::Id {
        &self.line_no
    }
}

impl ReceiptLine {
    /// Per-line warning under the product's expiry policy.
    pub fn expiry_warning(&self, policy: ExpiryPolicy) -> Option<String> {
        expiry_warning(self.expiration_date, self.planned_expiry_date, policy)
    }
}

/// Seed for a receipt line, before line numbers are assigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLineSeed {
    pub product_id: ProductId,
    pub quantity: i64,
    pub purchase_ref: Option<PurchaseLineRef>,
    pub planned_expiry_date: Option<NaiveDate>,
}

impl ReceiptLineSeed {
    /// Seed a receipt line from a purchase order line, copying the planned
    /// expiry date verbatim.
    pub fn from_order_line(order_id: PurchaseOrderId, line: &OrderLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
            purchase_ref: Some(PurchaseLineRef {
                order_id,
                line_no: line.line_no,
            }),
            planned_expiry_date: line.planned_expiry_date,
        }
    }
}

/// Aggregate root: Receipt (receiving document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    id: ReceiptId,
    tenant_id: Option<TenantId>,
    status: ReceiptStatus,
    lines: Vec<ReceiptLine>,
    version: u64,
    created: bool,
}

impl Receipt {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ReceiptId) -> Self {
        Self {
            id,
            tenant_id: None,
            status: ReceiptStatus::Draft,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ReceiptId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn status(&self) -> ReceiptStatus {
        self.status
    }

    pub fn lines(&self) -> &[ReceiptLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&ReceiptLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    /// True iff any line warns under its product's policy. Lines whose
    /// product has no known policy stay silent.
    pub fn has_expiry_warning(&self, policies: &HashMap<ProductId, ExpiryPolicy>) -> bool {
        has_expiry_warning(
            self.lines
                .iter()
                .map(|line| policies.get(&line.product_id).and_then(|p| line.expiry_warning(*p))),
        )
    }
}

impl AggregateRoot for Receipt {
    type Id = ReceiptId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReceipt {
    pub tenant_id: TenantId,
    pub receipt_id: ReceiptId,
    pub lines: Vec<ReceiptLineSeed>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordLotExpiry — the operator scanned (or cleared) a lot's
/// expiration date on one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordLotExpiry {
    pub tenant_id: TenantId,
    pub receipt_id: ReceiptId,
    pub line_no: u32,
    pub expiration_date: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SyncPlannedExpiry — the originating purchase line's planned date
/// changed after this receipt was generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlannedExpiry {
    pub tenant_id: TenantId,
    pub receipt_id: ReceiptId,
    pub line_no: u32,
    pub planned_expiry_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteReceipt {
    pub tenant_id: TenantId,
    pub receipt_id: ReceiptId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelReceipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelReceipt {
    pub tenant_id: TenantId,
    pub receipt_id: ReceiptId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptCommand {
    CreateReceipt(CreateReceipt),
    RecordLotExpiry(RecordLotExpiry),
    SyncPlannedExpiry(SyncPlannedExpiry),
    CompleteReceipt(CompleteReceipt),
    CancelReceipt(CancelReceipt),
}

/// Event: ReceiptCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptCreated {
    pub tenant_id: TenantId,
    pub receipt_id: ReceiptId,
    pub lines: Vec<ReceiptLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: LotExpiryRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotExpiryRecorded {
    pub tenant_id: TenantId,
    pub receipt_id: ReceiptId,
    pub line_no: u32,
    pub expiration_date: Option<DateTime<Utc>>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PlannedExpirySynced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedExpirySynced {
    pub tenant_id: TenantId,
    pub receipt_id: ReceiptId,
    pub line_no: u32,
    pub planned_expiry_date: Option<NaiveDate>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReceiptCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptCompleted {
    pub tenant_id: TenantId,
    pub receipt_id: ReceiptId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReceiptCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptCancelled {
    pub tenant_id: TenantId,
    pub receipt_id: ReceiptId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptEvent {
    ReceiptCreated(ReceiptCreated),
    LotExpiryRecorded(LotExpiryRecorded),
    PlannedExpirySynced(PlannedExpirySynced),
    ReceiptCompleted(ReceiptCompleted),
    ReceiptCancelled(ReceiptCancelled),
}

impl Event for ReceiptEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ReceiptEvent::ReceiptCreated(_) => "receiving.receipt.created",
            ReceiptEvent::LotExpiryRecorded(_) => "receiving.receipt.lot_expiry_recorded",
            ReceiptEvent::PlannedExpirySynced(_) => "receiving.receipt.planned_expiry_synced",
            ReceiptEvent::ReceiptCompleted(_) => "receiving.receipt.completed",
            ReceiptEvent::ReceiptCancelled(_) => "receiving.receipt.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ReceiptEvent::ReceiptCreated(e) => e.occurred_at,
            ReceiptEvent::LotExpiryRecorded(e) => e.occurred_at,
            ReceiptEvent::PlannedExpirySynced(e) => e.occurred_at,
            ReceiptEvent::ReceiptCompleted(e) => e.occurred_at,
            ReceiptEvent::ReceiptCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Receipt {
    type Command = ReceiptCommand;
    type Event = ReceiptEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ReceiptEvent::ReceiptCreated(e) => {
                self.id = e.receipt_id;
                self.tenant_id = Some(e.tenant_id);
                self.status = ReceiptStatus::Draft;
                self.lines = e.lines.clone();
                self.created = true;
            }
            ReceiptEvent::LotExpiryRecorded(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                    line.expiration_date = e.expiration_date;
                }
            }
            ReceiptEvent::PlannedExpirySynced(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                    line.planned_expiry_date = e.planned_expiry_date;
                }
            }
            ReceiptEvent::ReceiptCompleted(_) => {
                self.status = ReceiptStatus::Done;
            }
            ReceiptEvent::ReceiptCancelled(_) => {
                self.status = ReceiptStatus::Cancelled;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ReceiptCommand::CreateReceipt(cmd) => self.handle_create(cmd),
            ReceiptCommand::RecordLotExpiry(cmd) => self.handle_record_expiry(cmd),
            ReceiptCommand::SyncPlannedExpiry(cmd) => self.handle_sync_planned(cmd),
            ReceiptCommand::CompleteReceipt(cmd) => self.handle_complete(cmd),
            ReceiptCommand::CancelReceipt(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Receipt {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_receipt_id(&self, receipt_id: ReceiptId) -> Result<(), DomainError> {
        if self.id != receipt_id {
            return Err(DomainError::invariant("receipt_id mismatch"));
        }
        Ok(())
    }

    fn ensure_open(&self, tenant_id: TenantId, receipt_id: ReceiptId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(tenant_id)?;
        self.ensure_receipt_id(receipt_id)?;

        if self.status != ReceiptStatus::Draft {
            return Err(DomainError::invariant(
                "receipt is no longer open for changes",
            ));
        }
        Ok(())
    }

    fn existing_line(&self, line_no: u32) -> Result<&ReceiptLine, DomainError> {
        self.line(line_no)
            .ok_or_else(|| DomainError::validation(format!("no line {line_no} on this receipt")))
    }

    fn handle_create(&self, cmd: &CreateReceipt) -> Result<Vec<ReceiptEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("receipt already exists"));
        }

        if cmd.lines.iter().any(|seed| seed.quantity <= 0) {
            return Err(DomainError::validation("line quantity must be positive"));
        }

        let lines = cmd
            .lines
            .iter()
            .enumerate()
            .map(|(i, seed)| ReceiptLine {
                line_no: (i as u32) + 1,
                product_id: seed.product_id,
                quantity: seed.quantity,
                purchase_ref: seed.purchase_ref,
                planned_expiry_date: seed.planned_expiry_date,
                expiration_date: None,
            })
            .collect();

        Ok(vec![ReceiptEvent::ReceiptCreated(ReceiptCreated {
            tenant_id: cmd.tenant_id,
            receipt_id: cmd.receipt_id,
            lines,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_expiry(&self, cmd: &RecordLotExpiry) -> Result<Vec<ReceiptEvent>, DomainError> {
        self.ensure_open(cmd.tenant_id, cmd.receipt_id)?;
        self.existing_line(cmd.line_no)?;

        Ok(vec![ReceiptEvent::LotExpiryRecorded(LotExpiryRecorded {
            tenant_id: cmd.tenant_id,
            receipt_id: cmd.receipt_id,
            line_no: cmd.line_no,
            expiration_date: cmd.expiration_date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_sync_planned(&self, cmd: &SyncPlannedExpiry) -> Result<Vec<ReceiptEvent>, DomainError> {
        self.ensure_open(cmd.tenant_id, cmd.receipt_id)?;
        let line = self.existing_line(cmd.line_no)?;

        // Only generated lines track a purchase line to sync from.
        if line.purchase_ref.is_none() {
            return Err(DomainError::invariant(
                "line has no originating purchase line",
            ));
        }

        Ok(vec![ReceiptEvent::PlannedExpirySynced(PlannedExpirySynced {
            tenant_id: cmd.tenant_id,
            receipt_id: cmd.receipt_id,
            line_no: cmd.line_no,
            planned_expiry_date: cmd.planned_expiry_date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(&self, cmd: &CompleteReceipt) -> Result<Vec<ReceiptEvent>, DomainError> {
        self.ensure_open(cmd.tenant_id, cmd.receipt_id)?;

        Ok(vec![ReceiptEvent::ReceiptCompleted(ReceiptCompleted {
            tenant_id: cmd.tenant_id,
            receipt_id: cmd.receipt_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelReceipt) -> Result<Vec<ReceiptEvent>, DomainError> {
        self.ensure_open(cmd.tenant_id, cmd.receipt_id)?;

        Ok(vec![ReceiptEvent::ReceiptCancelled(ReceiptCancelled {
            tenant_id: cmd.tenant_id,
            receipt_id: cmd.receipt_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
