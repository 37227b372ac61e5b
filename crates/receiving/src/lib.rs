//! Receiving domain module (receipts, expiry warnings, event-sourced).
//!
//! Receipt lines carry the planned expiry date propagated from purchasing and
//! the expiration date physically scanned on the received lot. Comparing the
//! two under the product's effective mode yields per-line warnings and a
//! per-document flag. Pure domain logic — no IO, no HTTP, no storage.

pub mod overview;
pub mod receipt;
pub mod warning;

pub use overview::{ReceivingOverview, WarehouseEvent};
pub use receipt::{
    CancelReceipt, CompleteReceipt, CreateReceipt, LotExpiryRecorded, PlannedExpirySynced,
    PurchaseLineRef, Receipt, ReceiptCancelled, ReceiptCommand, ReceiptCompleted, ReceiptCreated,
    ReceiptEvent, ReceiptId, ReceiptLine, ReceiptLineSeed, ReceiptStatus, RecordLotExpiry,
    SyncPlannedExpiry,
};
pub use warning::{expiry_warning, has_expiry_warning};
