//! Partial updates
//!
//! A patch only carries the fields the caller wants to change. Empty strings
//! and a zero price mean "leave as is", so a patch can never clear
//! `end_date` or set a field back to an empty value.

use subagg_types::{Subscription, ValidationError};

use crate::validate::{check_range, parse_optional_month, validate_price};

/// Fields of a partial subscription update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionPatch {
    pub service_name: Option<String>,
    pub price: Option<i64>,
    /// `MM-YYYY`
    pub start_date: Option<String>,
    /// `MM-YYYY`
    pub end_date: Option<String>,
}

impl SubscriptionPatch {
    /// Whether applying the patch would change no field
    pub fn is_noop(&self) -> bool {
        blank(self.service_name.as_deref())
            && self.price.map_or(true, |p| p == 0)
            && blank(self.start_date.as_deref())
            && blank(self.end_date.as_deref())
    }
}

/// Apply `patch` to `sub` and return the result.
///
/// Pure: performs no I/O and leaves identity fields and timestamps alone.
/// Fails without partial effect if any supplied field is invalid or the
/// resulting range ends before it starts.
pub fn apply_patch(
    mut sub: Subscription,
    patch: &SubscriptionPatch,
) -> Result<Subscription, ValidationError> {
    if let Some(name) = patch.service_name.as_deref().map(str::trim) {
        if !name.is_empty() {
            sub.service_name = name.to_string();
        }
    }

    match patch.price {
        None | Some(0) => {}
        Some(price) => sub.price = validate_price(price)?,
    }

    if let Some(start) = parse_optional_month("start_date", patch.start_date.as_deref())? {
        sub.start_date = start;
    }

    if let Some(end) = parse_optional_month("end_date", patch.end_date.as_deref())? {
        sub.end_date = Some(end);
    }

    check_range(sub.start_date, sub.end_date)?;

    Ok(sub)
}

fn blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
