use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use freshtrack_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use freshtrack_events::Event;

use crate::expiry_mode::ExpiryMode;

/// Product category identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub AggregateId);

impl CategoryId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: ProductCategory.
///
/// A category always carries a concrete expiry mode — it is the root of the
/// category → product fallback chain, so there is no "inherit" option here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCategory {
    id: CategoryId,
    tenant_id: Option<TenantId>,
    name: String,
    expiry_mode: ExpiryMode,
    version: u64,
    created: bool,
}

impl ProductCategory {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: CategoryId) -> Self {
        Self {
            id,
            tenant_id: None,
            name: String::new(),
            expiry_mode: ExpiryMode::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expiry_mode(&self) -> ExpiryMode {
        self.expiry_mode
    }
}

impl AggregateRoot for ProductCategory {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateCategory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCategory {
    pub tenant_id: TenantId,
    pub category_id: CategoryId,
    pub name: String,
    /// Defaults to [`ExpiryMode::Exact`] when not given.
    pub expiry_mode: Option<ExpiryMode>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetExpiryMode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetExpiryMode {
    pub tenant_id: TenantId,
    pub category_id: CategoryId,
    pub mode: ExpiryMode,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryCommand {
    CreateCategory(CreateCategory),
    SetExpiryMode(SetExpiryMode),
}

/// Event: CategoryCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCreated {
    pub tenant_id: TenantId,
    pub category_id: CategoryId,
    pub name: String,
    pub expiry_mode: ExpiryMode,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CategoryExpiryModeChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryExpiryModeChanged {
    pub tenant_id: TenantId,
    pub category_id: CategoryId,
    pub mode: ExpiryMode,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryEvent {
    CategoryCreated(CategoryCreated),
    CategoryExpiryModeChanged(CategoryExpiryModeChanged),
}

impl Event for CategoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CategoryEvent::CategoryCreated(_) => "catalog.category.created",
            CategoryEvent::CategoryExpiryModeChanged(_) => "catalog.category.expiry_mode_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CategoryEvent::CategoryCreated(e) => e.occurred_at,
            CategoryEvent::CategoryExpiryModeChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ProductCategory {
    type Command = CategoryCommand;
    type Event = CategoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CategoryEvent::CategoryCreated(e) => {
                self.id = e.category_id;
                self.tenant_id = Some(e.tenant_id);
                self.name = e.name.clone();
                self.expiry_mode = e.expiry_mode;
                self.created = true;
            }
            CategoryEvent::CategoryExpiryModeChanged(e) => {
                self.expiry_mode = e.mode;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CategoryCommand::CreateCategory(cmd) => self.handle_create(cmd),
            CategoryCommand::SetExpiryMode(cmd) => self.handle_set_mode(cmd),
        }
    }
}

impl ProductCategory {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_category_id(&self, category_id: CategoryId) -> Result<(), DomainError> {
        if self.id != category_id {
            return Err(DomainError::invariant("category_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateCategory) -> Result<Vec<CategoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("category already exists"));
        }

        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![CategoryEvent::CategoryCreated(CategoryCreated {
            tenant_id: cmd.tenant_id,
            category_id: cmd.category_id,
            name: cmd.name.clone(),
            expiry_mode: cmd.expiry_mode.unwrap_or_default(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_mode(&self, cmd: &SetExpiryMode) -> Result<Vec<CategoryEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_category_id(cmd.category_id)?;

        if self.expiry_mode == cmd.mode {
            return Err(DomainError::conflict(format!(
                "expiry mode is already {}",
                cmd.mode
            )));
        }

        Ok(vec![CategoryEvent::CategoryExpiryModeChanged(
            CategoryExpiryModeChanged {
                tenant_id: cmd.tenant_id,
                category_id: cmd.category_id,
                mode: cmd.mode,
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_category_id() -> CategoryId {
        CategoryId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn created_category(tenant_id: TenantId, category_id: CategoryId) -> ProductCategory {
        let mut category = ProductCategory::empty(category_id);
        let cmd = CreateCategory {
            tenant_id,
            category_id,
            name: "Dairy".to_string(),
            expiry_mode: None,
            occurred_at: test_time(),
        };
        let events = category
            .handle(&CategoryCommand::CreateCategory(cmd))
            .unwrap();
        category.apply(&events[0]);
        category
    }

    #[test]
    fn create_category_defaults_to_exact_mode() {
        let category = created_category(test_tenant_id(), test_category_id());
        assert_eq!(category.expiry_mode(), ExpiryMode::Exact);
        assert_eq!(category.name(), "Dairy");
        assert_eq!(category.version(), 1);
    }

    #[test]
    fn create_category_honors_explicit_mode() {
        let category = ProductCategory::empty(test_category_id());
        let cmd = CreateCategory {
            tenant_id: test_tenant_id(),
            category_id: test_category_id(),
            name: "Frozen".to_string(),
            expiry_mode: Some(ExpiryMode::Minimal),
            occurred_at: test_time(),
        };

        let events = category
            .handle(&CategoryCommand::CreateCategory(cmd))
            .unwrap();
        match &events[0] {
            CategoryEvent::CategoryCreated(e) => {
                assert_eq!(e.expiry_mode, ExpiryMode::Minimal);
            }
            _ => panic!("Expected CategoryCreated event"),
        }
    }

    #[test]
    fn create_category_rejects_empty_name() {
        let category = ProductCategory::empty(test_category_id());
        let cmd = CreateCategory {
            tenant_id: test_tenant_id(),
            category_id: test_category_id(),
            name: "  ".to_string(),
            expiry_mode: None,
            occurred_at: test_time(),
        };

        let err = category
            .handle(&CategoryCommand::CreateCategory(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn set_expiry_mode_changes_mode() {
        let tenant_id = test_tenant_id();
        let category_id = test_category_id();
        let mut category = created_category(tenant_id, category_id);

        let cmd = SetExpiryMode {
            tenant_id,
            category_id,
            mode: ExpiryMode::Minimal,
            occurred_at: test_time(),
        };
        let events = category
            .handle(&CategoryCommand::SetExpiryMode(cmd))
            .unwrap();
        category.apply(&events[0]);

        assert_eq!(category.expiry_mode(), ExpiryMode::Minimal);
        assert_eq!(category.version(), 2);
    }

    #[test]
    fn set_expiry_mode_rejects_no_op() {
        let tenant_id = test_tenant_id();
        let category_id = test_category_id();
        let category = created_category(tenant_id, category_id);

        let cmd = SetExpiryMode {
            tenant_id,
            category_id,
            mode: ExpiryMode::Exact,
            occurred_at: test_time(),
        };
        let err = category
            .handle(&CategoryCommand::SetExpiryMode(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn set_expiry_mode_rejects_wrong_tenant() {
        let category_id = test_category_id();
        let category = created_category(test_tenant_id(), category_id);

        let cmd = SetExpiryMode {
            tenant_id: test_tenant_id(),
            category_id,
            mode: ExpiryMode::Minimal,
            occurred_at: test_time(),
        };
        let err = category
            .handle(&CategoryCommand::SetExpiryMode(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn set_expiry_mode_rejects_unknown_category() {
        let category = ProductCategory::empty(test_category_id());
        let cmd = SetExpiryMode {
            tenant_id: test_tenant_id(),
            category_id: test_category_id(),
            mode: ExpiryMode::Minimal,
            occurred_at: test_time(),
        };
        let err = category
            .handle(&CategoryCommand::SetExpiryMode(cmd))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound));
    }
}
