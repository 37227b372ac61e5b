//! Purchasing domain module (Purchase Orders, event-sourced).
//!
//! Purchase order lines carry the planned expiry date the warehouse compares
//! scanned lot dates against at receipt. Pure domain logic — no IO, no HTTP,
//! no storage.

pub mod order;

pub use order::{
    default_planned_expiry, AddLine, Approve, CreatePurchaseOrder, GoodsReceived, OrderLine,
    PurchaseOrder, PurchaseOrderApproved, PurchaseOrderCommand, PurchaseOrderCreated,
    PurchaseOrderEvent, PurchaseOrderId, PurchaseOrderLineAdded,
    PurchaseOrderLinePlannedExpirySet, PurchaseOrderLineRescheduled, PurchaseOrderStatus,
    ReceiveGoods, RescheduleLine, SetLinePlannedExpiry, SupplierId,
};
