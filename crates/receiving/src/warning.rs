//! Expiry-warning evaluation.
//!
//! Missing inputs mean "nothing to compare": the evaluator never fails, it
//! just stays silent. Comparison happens on calendar dates — the scanned
//! expiration is a timestamp, the planned expiry a date.

use chrono::{DateTime, NaiveDate, Utc};

use freshtrack_catalog::{ExpiryMode, ExpiryPolicy};

/// Compare a scanned lot expiration against the planned expiry date.
///
/// Returns `None` when either date is absent, when the product is not
/// lot/serial tracked, or when it does not use expiration dates at all.
/// Under [`ExpiryMode::Exact`] any mismatch warns; under
/// [`ExpiryMode::Minimal`] only a scanned date *before* the planned one
/// warns. Equality never warns.
pub fn expiry_warning(
    scanned: Option<DateTime<Utc>>,
    planned: Option<NaiveDate>,
    policy: ExpiryPolicy,
) -> Option<String> {
    let scanned = scanned?.date_naive();
    let planned = planned?;

    if !policy.tracking.is_tracked() || !policy.use_expiration_date {
        return None;
    }

    match policy.mode {
        ExpiryMode::Exact if scanned != planned => {
            Some(format!("{planned} is the exact expected expiration date."))
        }
        ExpiryMode::Minimal if scanned < planned => {
            Some(format!("{planned} is the minimal expiration date expected."))
        }
        _ => None,
    }
}

/// True iff at least one line carries a warning. Empty input is all clear.
pub fn has_expiry_warning<I>(warnings: I) -> bool
where
    I: IntoIterator<Item = Option<String>>,
{
    warnings
        .into_iter()
        .any(|w| w.as_deref().is_some_and(|text| !text.is_empty()))
}
