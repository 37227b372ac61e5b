use serde::{Deserialize, Serialize};

use freshtrack_core::ValueObject;

/// Comparison strictness applied to a scanned lot expiration date at receipt.
///
/// Categories carry one of these as their default; it is also the result of
/// resolving a product's override against that default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryMode {
    /// Warn on any mismatch between scanned and planned dates.
    #[default]
    Exact,
    /// Warn only when the scanned date comes before the planned date.
    Minimal,
}

impl core::fmt::Display for ExpiryMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ExpiryMode::Exact => f.write_str("exact"),
            ExpiryMode::Minimal => f.write_str("minimal"),
        }
    }
}

/// Per-product override of the category default.
///
/// `InheritedFromCategory` is the root of the fallback chain's product side:
/// categories themselves always carry a concrete [`ExpiryMode`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryModeOverride {
    #[default]
    InheritedFromCategory,
    Exact,
    Minimal,
}

impl ExpiryModeOverride {
    /// Resolve the effective mode for a product.
    ///
    /// The override wins unless it is `InheritedFromCategory`, in which case
    /// the owning category's default applies.
    pub fn resolve(self, category_default: ExpiryMode) -> ExpiryMode {
        match self {
            ExpiryModeOverride::InheritedFromCategory => category_default,
            ExpiryModeOverride::Exact => ExpiryMode::Exact,
            ExpiryModeOverride::Minimal => ExpiryMode::Minimal,
        }
    }
}

/// Lot/serial tracking configuration of a product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tracking {
    #[default]
    None,
    Lot,
    Serial,
}

impl Tracking {
    pub fn is_tracked(self) -> bool {
        !matches!(self, Tracking::None)
    }
}

/// The narrow per-product view the receiving side needs to evaluate a
/// scanned expiration date: resolved mode plus the two gating flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryPolicy {
    pub mode: ExpiryMode,
    pub tracking: Tracking,
    pub use_expiration_date: bool,
}

impl ValueObject for ExpiryPolicy {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inherited_resolves_to_category_default() {
        assert_eq!(
            ExpiryModeOverride::InheritedFromCategory.resolve(ExpiryMode::Exact),
            ExpiryMode::Exact
        );
        assert_eq!(
            ExpiryModeOverride::InheritedFromCategory.resolve(ExpiryMode::Minimal),
            ExpiryMode::Minimal
        );
    }

    #[test]
    fn explicit_override_wins_over_category_default() {
        assert_eq!(
            ExpiryModeOverride::Exact.resolve(ExpiryMode::Minimal),
            ExpiryMode::Exact
        );
        assert_eq!(
            ExpiryModeOverride::Minimal.resolve(ExpiryMode::Exact),
            ExpiryMode::Minimal
        );
    }

    #[test]
    fn defaults_match_category_root_and_product_inherit() {
        assert_eq!(ExpiryMode::default(), ExpiryMode::Exact);
        assert_eq!(
            ExpiryModeOverride::default(),
            ExpiryModeOverride::InheritedFromCategory
        );
    }

    #[test]
    fn only_none_tracking_is_untracked() {
        assert!(!Tracking::None.is_tracked());
        assert!(Tracking::Lot.is_tracked());
        assert!(Tracking::Serial.is_tracked());
    }
}
