//! Receiving overview read model.
//!
//! Joins catalog configuration, purchase-line planned dates, and receipt
//! state into the per-line warning and per-document flag. Derived values are
//! recomputed on read from whatever facts have arrived, so a category-mode
//! change made long after a receipt was generated still shows up in that
//! receipt's warnings.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};

use freshtrack_catalog::{
    CategoryEvent, CategoryId, ExpiryMode, ExpiryModeOverride, ExpiryPolicy, ProductEvent,
    ProductId, Tracking,
};
use freshtrack_core::{AggregateId, TenantId};
use freshtrack_events::{Event, EventEnvelope, Projection};
use freshtrack_purchasing::{PurchaseOrderEvent, PurchaseOrderId};

use crate::receipt::{PurchaseLineRef, ReceiptEvent, ReceiptId};
use crate::warning::{expiry_warning, has_expiry_warning};

/// Union of every event stream the overview depends on.
#[derive(Debug, Clone, PartialEq)]
pub enum WarehouseEvent {
    Category(CategoryEvent),
    Product(ProductEvent),
    Purchase(PurchaseOrderEvent),
    Receipt(ReceiptEvent),
}

impl From<CategoryEvent> for WarehouseEvent {
    fn from(event: CategoryEvent) -> Self {
        Self::Category(event)
    }
}

impl From<ProductEvent> for WarehouseEvent {
    fn from(event: ProductEvent) -> Self {
        Self::Product(event)
    }
}

impl From<PurchaseOrderEvent> for WarehouseEvent {
    fn from(event: PurchaseOrderEvent) -> Self {
        Self::Purchase(event)
    }
}

impl From<ReceiptEvent> for WarehouseEvent {
    fn from(event: ReceiptEvent) -> Self {
        Self::Receipt(event)
    }
}

impl Event for WarehouseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            WarehouseEvent::Category(e) => e.event_type(),
            WarehouseEvent::Product(e) => e.event_type(),
            WarehouseEvent::Purchase(e) => e.event_type(),
            WarehouseEvent::Receipt(e) => e.event_type(),
        }
    }

    fn version(&self) -> u32 {
        match self {
            WarehouseEvent::Category(e) => e.version(),
            WarehouseEvent::Product(e) => e.version(),
            WarehouseEvent::Purchase(e) => e.version(),
            WarehouseEvent::Receipt(e) => e.version(),
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            WarehouseEvent::Category(e) => e.occurred_at(),
            WarehouseEvent::Product(e) => e.occurred_at(),
            WarehouseEvent::Purchase(e) => e.occurred_at(),
            WarehouseEvent::Receipt(e) => e.occurred_at(),
        }
    }
}

/// Tenant+aggregate cursor to support at-least-once delivery.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    tenant_id: TenantId,
    aggregate_id: AggregateId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ProductState {
    category_id: CategoryId,
    mode_override: ExpiryModeOverride,
    tracking: Tracking,
    use_expiration_date: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LineState {
    product_id: ProductId,
    purchase_ref: Option<PurchaseLineRef>,
    planned_expiry_date: Option<NaiveDate>,
    expiration_date: Option<DateTime<Utc>>,
}

/// Receiving overview projection.
///
/// Idempotent under at-least-once delivery: replays at or below the
/// per-stream cursor are skipped. Disposable and rebuildable from the event
/// streams.
#[derive(Debug, Default)]
pub struct ReceivingOverview {
    cursors: HashMap<CursorKey, u64>,
    category_modes: HashMap<(TenantId, CategoryId), ExpiryMode>,
    products: HashMap<(TenantId, ProductId), ProductState>,
    purchase_lines: HashMap<(TenantId, PurchaseOrderId, u32), Option<NaiveDate>>,
    receipts: HashMap<(TenantId, ReceiptId), BTreeMap<u32, LineState>>,
}

impl ReceivingOverview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective comparison mode for a product, resolving the category
    /// fallback. `None` for products this overview has never seen.
    pub fn effective_expiry_mode(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Option<ExpiryMode> {
        let product = self.products.get(&(tenant_id, product_id))?;
        let category_default = self
            .category_modes
            .get(&(tenant_id, product.category_id))
            .copied()
            .unwrap_or_default();
        Some(product.mode_override.resolve(category_default))
    }

    /// The evaluator-facing snapshot for a product.
    pub fn expiry_policy(&self, tenant_id: TenantId, product_id: ProductId) -> Option<ExpiryPolicy> {
        let product = self.products.get(&(tenant_id, product_id))?;
        Some(ExpiryPolicy {
            mode: self.effective_expiry_mode(tenant_id, product_id)?,
            tracking: product.tracking,
            use_expiration_date: product.use_expiration_date,
        })
    }

    /// Planned expiry date for one receipt line.
    ///
    /// Lines generated from a purchase order follow that purchase line's
    /// current planned date; standalone lines keep their own.
    pub fn planned_expiry(
        &self,
        tenant_id: TenantId,
        receipt_id: ReceiptId,
        line_no: u32,
    ) -> Option<NaiveDate> {
        let line = self.line(tenant_id, receipt_id, line_no)?;
        match line.purchase_ref {
            Some(purchase_ref) => self
                .purchase_lines
                .get(&(tenant_id, purchase_ref.order_id, purchase_ref.line_no))
                .copied()
                .unwrap_or(line.planned_expiry_date),
            None => line.planned_expiry_date,
        }
    }

    /// Warning for one receipt line, recomputed from current state.
    pub fn line_warning(
        &self,
        tenant_id: TenantId,
        receipt_id: ReceiptId,
        line_no: u32,
    ) -> Option<String> {
        let line = self.line(tenant_id, receipt_id, line_no)?;
        let policy = self.expiry_policy(tenant_id, line.product_id)?;
        expiry_warning(
            line.expiration_date,
            self.planned_expiry(tenant_id, receipt_id, line_no),
            policy,
        )
    }

    /// True iff any line of the receipt currently warns.
    pub fn has_expiry_warning(&self, tenant_id: TenantId, receipt_id: ReceiptId) -> bool {
        let Some(lines) = self.receipts.get(&(tenant_id, receipt_id)) else {
            return false;
        };
        has_expiry_warning(
            lines
                .keys()
                .map(|&line_no| self.line_warning(tenant_id, receipt_id, line_no)),
        )
    }

    fn line(&self, tenant_id: TenantId, receipt_id: ReceiptId, line_no: u32) -> Option<&LineState> {
        self.receipts
            .get(&(tenant_id, receipt_id))
            .and_then(|lines| lines.get(&line_no))
    }

    fn apply_category(&mut self, tenant_id: TenantId, event: &CategoryEvent) {
        match event {
            CategoryEvent::CategoryCreated(e) => {
                self.category_modes
                    .insert((tenant_id, e.category_id), e.expiry_mode);
            }
            CategoryEvent::CategoryExpiryModeChanged(e) => {
                self.category_modes.insert((tenant_id, e.category_id), e.mode);
            }
        }
    }

    fn apply_product(&mut self, tenant_id: TenantId, event: &ProductEvent) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.products.insert(
                    (tenant_id, e.product_id),
                    ProductState {
                        category_id: e.category_id,
                        mode_override: e.expiry_mode_override,
                        tracking: e.tracking,
                        use_expiration_date: e.use_expiration_date,
                    },
                );
            }
            ProductEvent::ProductExpiryModeOverrideSet(e) => {
                if let Some(product) = self.products.get_mut(&(tenant_id, e.product_id)) {
                    product.mode_override = e.mode;
                }
            }
            ProductEvent::ProductCategoryReassigned(e) => {
                if let Some(product) = self.products.get_mut(&(tenant_id, e.product_id)) {
                    product.category_id = e.category_id;
                }
            }
            // Shelf life only feeds purchase-line defaulting, not warnings.
            ProductEvent::ProductShelfLifeSet(_) => {}
        }
    }

    fn apply_purchase(&mut self, tenant_id: TenantId, event: &PurchaseOrderEvent) {
        match event {
            PurchaseOrderEvent::PurchaseOrderLineAdded(e) => {
                self.purchase_lines
                    .insert((tenant_id, e.order_id, e.line_no), e.planned_expiry_date);
            }
            PurchaseOrderEvent::PurchaseOrderLineRescheduled(e) => {
                self.purchase_lines
                    .insert((tenant_id, e.order_id, e.line_no), e.planned_expiry_date);
            }
            PurchaseOrderEvent::PurchaseOrderLinePlannedExpirySet(e) => {
                self.purchase_lines
                    .insert((tenant_id, e.order_id, e.line_no), e.planned_expiry_date);
            }
            PurchaseOrderEvent::PurchaseOrderCreated(_)
            | PurchaseOrderEvent::PurchaseOrderApproved(_)
            | PurchaseOrderEvent::GoodsReceived(_) => {}
        }
    }

    fn apply_receipt(&mut self, tenant_id: TenantId, event: &ReceiptEvent) {
        match event {
            ReceiptEvent::ReceiptCreated(e) => {
                let lines = e
                    .lines
                    .iter()
                    .map(|line| {
                        (
                            line.line_no,
                            LineState {
                                product_id: line.product_id,
                                purchase_ref: line.purchase_ref,
                                planned_expiry_date: line.planned_expiry_date,
                                expiration_date: line.expiration_date,
                            },
                        )
                    })
                    .collect();
                self.receipts.insert((tenant_id, e.receipt_id), lines);
            }
            ReceiptEvent::LotExpiryRecorded(e) => {
                if let Some(line) = self
                    .receipts
                    .get_mut(&(tenant_id, e.receipt_id))
                    .and_then(|lines| lines.get_mut(&e.line_no))
                {
                    line.expiration_date = e.expiration_date;
                }
            }
            ReceiptEvent::PlannedExpirySynced(e) => {
                if let Some(line) = self
                    .receipts
                    .get_mut(&(tenant_id, e.receipt_id))
                    .and_then(|lines| lines.get_mut(&e.line_no))
                {
                    line.planned_expiry_date = e.planned_expiry_date;
                }
            }
            ReceiptEvent::ReceiptCompleted(_) | ReceiptEvent::ReceiptCancelled(_) => {}
        }
    }
}

impl Projection for ReceivingOverview {
    type Ev = WarehouseEvent;

    fn apply(&mut self, envelope: &EventEnvelope<WarehouseEvent>) {
        let key = CursorKey {
            tenant_id: envelope.tenant_id(),
            aggregate_id: envelope.aggregate_id(),
        };
        let last = self.cursors.get(&key).copied().unwrap_or(0);
        let seq = envelope.sequence_number();

        if seq <= last {
            // Duplicate or replay; safe to ignore.
            tracing::debug!(
                event_type = envelope.payload().event_type(),
                sequence = seq,
                cursor = last,
                "skipping already-applied event"
            );
            return;
        }
        self.cursors.insert(key, seq);

        let tenant_id = envelope.tenant_id();
        match envelope.payload() {
            WarehouseEvent::Category(e) => self.apply_category(tenant_id, e),
            WarehouseEvent::Product(e) => self.apply_product(tenant_id, e),
            WarehouseEvent::Purchase(e) => self.apply_purchase(tenant_id, e),
            WarehouseEvent::Receipt(e) => self.apply_receipt(tenant_id, e),
        }
    }
}
