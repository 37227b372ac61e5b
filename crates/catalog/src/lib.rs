//! Catalog domain module (product configuration, event-sourced).
//!
//! Carries the per-category and per-product expiry comparison configuration
//! and resolves the effective mode for a product. Pure domain logic — no IO,
//! no HTTP, no storage.

pub mod category;
pub mod expiry_mode;
pub mod product;

pub use category::{
    CategoryCommand, CategoryCreated, CategoryEvent, CategoryExpiryModeChanged, CategoryId,
    CreateCategory, ProductCategory, SetExpiryMode,
};
pub use expiry_mode::{ExpiryMode, ExpiryModeOverride, ExpiryPolicy, Tracking};
pub use product::{
    CreateProduct, Product, ProductCategoryReassigned, ProductCommand, ProductCreated,
    ProductEvent, ProductExpiryModeOverrideSet, ProductId, ProductShelfLifeSet,
    ReassignCategory, SetExpiryModeOverride, SetShelfLife,
};
