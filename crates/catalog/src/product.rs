use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freshtrack_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use freshtrack_events::Event;

use crate::category::CategoryId;
use crate::expiry_mode::{ExpiryMode, ExpiryModeOverride, ExpiryPolicy, Tracking};

/// Product identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub AggregateId);

impl ProductId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: Product.
///
/// Holds the receipt-time expiry configuration: lot/serial tracking, whether
/// lots carry expiration dates at all, the shelf life used to default planned
/// expiry dates on purchase lines, and the per-product mode override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    id: ProductId,
    tenant_id: Option<TenantId>,
    category_id: Option<CategoryId>,
    sku: String,
    name: String,
    tracking: Tracking,
    use_expiration_date: bool,
    shelf_life_days: u32,
    expiry_mode_override: ExpiryModeOverride,
    version: u64,
    created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            tenant_id: None,
            category_id: None,
            sku: String::new(),
            name: String::new(),
            tracking: Tracking::default(),
            use_expiration_date: false,
            shelf_life_days: 0,
            expiry_mode_override: ExpiryModeOverride::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn category_id(&self) -> Option<CategoryId> {
        self.category_id
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tracking(&self) -> Tracking {
        self.tracking
    }

    pub fn use_expiration_date(&self) -> bool {
        self.use_expiration_date
    }

    pub fn shelf_life_days(&self) -> u32 {
        self.shelf_life_days
    }

    pub fn expiry_mode_override(&self) -> ExpiryModeOverride {
        self.expiry_mode_override
    }

    /// Effective comparison mode once the owning category's default is known.
    pub fn effective_expiry_mode(&self, category_default: ExpiryMode) -> ExpiryMode {
        self.expiry_mode_override.resolve(category_default)
    }

    /// Snapshot of everything the receiving side needs to evaluate this
    /// product's scanned expiration dates.
    pub fn expiry_policy(&self, category_default: ExpiryMode) -> ExpiryPolicy {
        ExpiryPolicy {
            mode: self.effective_expiry_mode(category_default),
            tracking: self.tracking,
            use_expiration_date: self.use_expiration_date,
        }
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub sku: String,
    pub name: String,
    pub tracking: Tracking,
    pub use_expiration_date: bool,
    pub shelf_life_days: u32,
    /// Defaults to [`ExpiryModeOverride::InheritedFromCategory`] when not given.
    pub expiry_mode_override: Option<ExpiryModeOverride>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetExpiryModeOverride.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetExpiryModeOverride {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub mode: ExpiryModeOverride,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReassignCategory (re-parenting; resolution must follow).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReassignCategory {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetShelfLife.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetShelfLife {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub shelf_life_days: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductCommand {
    CreateProduct(CreateProduct),
    SetExpiryModeOverride(SetExpiryModeOverride),
    ReassignCategory(ReassignCategory),
    SetShelfLife(SetShelfLife),
}

/// Event: ProductCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub sku: String,
    pub name: String,
    pub tracking: Tracking,
    pub use_expiration_date: bool,
    pub shelf_life_days: u32,
    pub expiry_mode_override: ExpiryModeOverride,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductExpiryModeOverrideSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductExpiryModeOverrideSet {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub mode: ExpiryModeOverride,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductCategoryReassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategoryReassigned {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ProductShelfLifeSet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductShelfLifeSet {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub shelf_life_days: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductEvent {
    ProductCreated(ProductCreated),
    ProductExpiryModeOverrideSet(ProductExpiryModeOverrideSet),
    ProductCategoryReassigned(ProductCategoryReassigned),
    ProductShelfLifeSet(ProductShelfLifeSet),
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::ProductCreated(_) => "catalog.product.created",
            ProductEvent::ProductExpiryModeOverrideSet(_) => {
                "catalog.product.expiry_mode_override_set"
            }
            ProductEvent::ProductCategoryReassigned(_) => "catalog.product.category_reassigned",
            ProductEvent::ProductShelfLifeSet(_) => "catalog.product.shelf_life_set",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::ProductCreated(e) => e.occurred_at,
            ProductEvent::ProductExpiryModeOverrideSet(e) => e.occurred_at,
            ProductEvent::ProductCategoryReassigned(e) => e.occurred_at,
            ProductEvent::ProductShelfLifeSet(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::ProductCreated(e) => {
                self.id = e.product_id;
                self.tenant_id = Some(e.tenant_id);
                self.category_id = Some(e.category_id);
                self.sku = e.sku.clone();
                self.name = e.name.clone();
                self.tracking = e.tracking;
                self.use_expiration_date = e.use_expiration_date;
                self.shelf_life_days = e.shelf_life_days;
                self.expiry_mode_override = e.expiry_mode_override;
                self.created = true;
            }
            ProductEvent::ProductExpiryModeOverrideSet(e) => {
                self.expiry_mode_override = e.mode;
            }
            ProductEvent::ProductCategoryReassigned(e) => {
                self.category_id = Some(e.category_id);
            }
            ProductEvent::ProductShelfLifeSet(e) => {
                self.shelf_life_days = e.shelf_life_days;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::CreateProduct(cmd) => self.handle_create(cmd),
            ProductCommand::SetExpiryModeOverride(cmd) => self.handle_set_override(cmd),
            ProductCommand::ReassignCategory(cmd) => self.handle_reassign(cmd),
            ProductCommand::SetShelfLife(cmd) => self.handle_set_shelf_life(cmd),
        }
    }
}

impl Product {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.id != product_id {
            return Err(DomainError::invariant("product_id mismatch"));
        }
        Ok(())
    }

    fn ensure_created(&self, tenant_id: TenantId, product_id: ProductId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(tenant_id)?;
        self.ensure_product_id(product_id)
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        if cmd.sku.trim().is_empty() {
            return Err(DomainError::validation("SKU cannot be empty"));
        }

        Ok(vec![ProductEvent::ProductCreated(ProductCreated {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            category_id: cmd.category_id,
            sku: cmd.sku.clone(),
            name: cmd.name.clone(),
            tracking: cmd.tracking,
            use_expiration_date: cmd.use_expiration_date,
            shelf_life_days: cmd.shelf_life_days,
            expiry_mode_override: cmd.expiry_mode_override.unwrap_or_default(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_override(
        &self,
        cmd: &SetExpiryModeOverride,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.product_id)?;

        if self.expiry_mode_override == cmd.mode {
            return Err(DomainError::conflict("expiry mode override unchanged"));
        }

        Ok(vec![ProductEvent::ProductExpiryModeOverrideSet(
            ProductExpiryModeOverrideSet {
                tenant_id: cmd.tenant_id,
                product_id: cmd.product_id,
                mode: cmd.mode,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_reassign(&self, cmd: &ReassignCategory) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.product_id)?;

        if self.category_id == Some(cmd.category_id) {
            return Err(DomainError::conflict("product already in this category"));
        }

        Ok(vec![ProductEvent::ProductCategoryReassigned(
            ProductCategoryReassigned {
                tenant_id: cmd.tenant_id,
                product_id: cmd.product_id,
                category_id: cmd.category_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_set_shelf_life(&self, cmd: &SetShelfLife) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_created(cmd.tenant_id, cmd.product_id)?;

        Ok(vec![ProductEvent::ProductShelfLifeSet(ProductShelfLifeSet {
            tenant_id: cmd.tenant_id,
            product_id: cmd.product_id,
            shelf_life_days: cmd.shelf_life_days,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_product_id() -> ProductId {
        ProductId::new(AggregateId::new())
    }

    fn test_category_id() -> CategoryId {
        CategoryId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn create_cmd(tenant_id: TenantId, product_id: ProductId, category_id: CategoryId) -> CreateProduct {
        CreateProduct {
            tenant_id,
            product_id,
            category_id,
            sku: "PROD1".to_string(),
            name: "Test Product 1".to_string(),
            tracking: Tracking::Lot,
            use_expiration_date: true,
            shelf_life_days: 1,
            expiry_mode_override: None,
            occurred_at: test_time(),
        }
    }

    fn created_product(tenant_id: TenantId, product_id: ProductId, category_id: CategoryId) -> Product {
        let mut product = Product::empty(product_id);
        let events = product
            .handle(&ProductCommand::CreateProduct(create_cmd(
                tenant_id,
                product_id,
                category_id,
            )))
            .unwrap();
        product.apply(&events[0]);
        product
    }

    #[test]
    fn create_product_defaults_to_inherited_mode() {
        let product = created_product(test_tenant_id(), test_product_id(), test_category_id());
        assert_eq!(
            product.expiry_mode_override(),
            ExpiryModeOverride::InheritedFromCategory
        );
        assert_eq!(product.tracking(), Tracking::Lot);
        assert!(product.use_expiration_date());
        assert_eq!(product.shelf_life_days(), 1);
    }

    #[test]
    fn create_product_rejects_empty_sku() {
        let product = Product::empty(test_product_id());
        let mut cmd = create_cmd(test_tenant_id(), test_product_id(), test_category_id());
        cmd.sku = "  ".to_string();

        let err = product
            .handle(&ProductCommand::CreateProduct(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn effective_mode_follows_category_when_inherited() {
        let product = created_product(test_tenant_id(), test_product_id(), test_category_id());

        assert_eq!(
            product.effective_expiry_mode(ExpiryMode::Exact),
            ExpiryMode::Exact
        );
        assert_eq!(
            product.effective_expiry_mode(ExpiryMode::Minimal),
            ExpiryMode::Minimal
        );
    }

    #[test]
    fn effective_mode_ignores_category_when_overridden() {
        let tenant_id = test_tenant_id();
        let product_id = test_product_id();
        let mut product = created_product(tenant_id, product_id, test_category_id());

        let cmd = SetExpiryModeOverride {
            tenant_id,
            product_id,
            mode: ExpiryModeOverride::Exact,
            occurred_at: test_time(),
        };
        let events = product
            .handle(&ProductCommand::SetExpiryModeOverride(cmd))
            .unwrap();
        product.apply(&events[0]);

        assert_eq!(
            product.effective_expiry_mode(ExpiryMode::Minimal),
            ExpiryMode::Exact
        );

        let cmd = SetExpiryModeOverride {
            tenant_id,
            product_id,
            mode: ExpiryModeOverride::Minimal,
            occurred_at: test_time(),
        };
        let events = product
            .handle(&ProductCommand::SetExpiryModeOverride(cmd))
            .unwrap();
        product.apply(&events[0]);

        assert_eq!(
            product.effective_expiry_mode(ExpiryMode::Exact),
            ExpiryMode::Minimal
        );
    }

    #[test]
    fn expiry_policy_carries_tracking_and_usage_flags() {
        let product = created_product(test_tenant_id(), test_product_id(), test_category_id());
        let policy = product.expiry_policy(ExpiryMode::Minimal);

        assert_eq!(policy.mode, ExpiryMode::Minimal);
        assert_eq!(policy.tracking, Tracking::Lot);
        assert!(policy.use_expiration_date);
    }

    #[test]
    fn reassign_category_moves_product() {
        let tenant_id = test_tenant_id();
        let product_id = test_product_id();
        let first = test_category_id();
        let second = test_category_id();
        let mut product = created_product(tenant_id, product_id, first);

        let cmd = ReassignCategory {
            tenant_id,
            product_id,
            category_id: second,
            occurred_at: test_time(),
        };
        let events = product
            .handle(&ProductCommand::ReassignCategory(cmd))
            .unwrap();
        product.apply(&events[0]);

        assert_eq!(product.category_id(), Some(second));
    }

    #[test]
    fn reassign_category_rejects_same_category() {
        let tenant_id = test_tenant_id();
        let product_id = test_product_id();
        let category_id = test_category_id();
        let product = created_product(tenant_id, product_id, category_id);

        let cmd = ReassignCategory {
            tenant_id,
            product_id,
            category_id,
            occurred_at: test_time(),
        };
        let err = product
            .handle(&ProductCommand::ReassignCategory(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn set_shelf_life_updates_days() {
        let tenant_id = test_tenant_id();
        let product_id = test_product_id();
        let mut product = created_product(tenant_id, product_id, test_category_id());

        let cmd = SetShelfLife {
            tenant_id,
            product_id,
            shelf_life_days: 3,
            occurred_at: test_time(),
        };
        let events = product
            .handle(&ProductCommand::SetShelfLife(cmd))
            .unwrap();
        product.apply(&events[0]);

        assert_eq!(product.shelf_life_days(), 3);
    }

    #[test]
    fn commands_against_unknown_product_are_not_found() {
        let product = Product::empty(test_product_id());
        let cmd = SetShelfLife {
            tenant_id: test_tenant_id(),
            product_id: test_product_id(),
            shelf_life_days: 3,
            occurred_at: test_time(),
        };

        let err = product
            .handle(&ProductCommand::SetShelfLife(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_mode() -> impl Strategy<Value = ExpiryMode> {
            prop_oneof![Just(ExpiryMode::Exact), Just(ExpiryMode::Minimal)]
        }

        fn any_override() -> impl Strategy<Value = ExpiryModeOverride> {
            prop_oneof![
                Just(ExpiryModeOverride::InheritedFromCategory),
                Just(ExpiryModeOverride::Exact),
                Just(ExpiryModeOverride::Minimal),
            ]
        }

        proptest! {
            /// Property: resolution is total and the override always wins
            /// unless it is the inherit marker.
            #[test]
            fn resolution_table_holds(mode_override in any_override(), category in any_mode()) {
                let resolved = mode_override.resolve(category);
                match mode_override {
                    ExpiryModeOverride::InheritedFromCategory => prop_assert_eq!(resolved, category),
                    ExpiryModeOverride::Exact => prop_assert_eq!(resolved, ExpiryMode::Exact),
                    ExpiryModeOverride::Minimal => prop_assert_eq!(resolved, ExpiryMode::Minimal),
                }
            }

            /// Property: handle does not mutate state (decisions are pure).
            #[test]
            fn handle_is_pure(mode_override in any_override()) {
                let tenant_id = test_tenant_id();
                let product_id = test_product_id();
                let product = created_product(tenant_id, product_id, test_category_id());
                let before = product.clone();

                let cmd = SetExpiryModeOverride {
                    tenant_id,
                    product_id,
                    mode: mode_override,
                    occurred_at: Utc::now(),
                };
                let _ = product.handle(&ProductCommand::SetExpiryModeOverride(cmd));

                prop_assert_eq!(before, product);
            }
        }
    }
}
