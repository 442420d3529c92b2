//! Creation input validation

use subagg_types::{
    timestamp_now, Subscription, SubscriptionId, UserId, ValidationError, YearMonth,
};

/// Raw fields submitted to create a subscription
#[derive(Debug, Clone, Default)]
pub struct NewSubscription {
    pub service_name: String,
    pub price: i64,
    pub user_id: String,
    pub start_date: String,
    /// `MM-YYYY`; `None` or empty for an open-ended subscription
    pub end_date: Option<String>,
}

impl NewSubscription {
    /// Validate the fields and build a subscription with a fresh ID.
    ///
    /// `created_at` and `updated_at` are set to the same instant.
    pub fn into_subscription(self) -> Result<Subscription, ValidationError> {
        let service_name = validate_service_name(&self.service_name)?;
        let price = validate_price(self.price)?;
        let user_id = UserId::parse(&self.user_id)?;
        let start_date = YearMonth::parse_field("start_date", self.start_date.trim())?;
        let end_date = parse_optional_month("end_date", self.end_date.as_deref())?;
        check_range(start_date, end_date)?;

        let now = timestamp_now();
        Ok(Subscription {
            id: SubscriptionId::new(),
            service_name,
            price,
            user_id,
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Trimmed, non-empty service name
pub fn validate_service_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyServiceName);
    }
    Ok(name.to_string())
}

/// Positive price that fits the stored column
pub fn validate_price(price: i64) -> Result<i32, ValidationError> {
    if price <= 0 {
        return Err(ValidationError::NonPositivePrice(price));
    }
    i32::try_from(price).map_err(|_| ValidationError::PriceTooLarge(price))
}

/// Parse an optional `MM-YYYY` value, treating empty as absent
pub fn parse_optional_month(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<YearMonth>, ValidationError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => YearMonth::parse_field(field, v).map(Some),
    }
}

/// Reject an end month before the start month
pub fn check_range(start: YearMonth, end: Option<YearMonth>) -> Result<(), ValidationError> {
    match end {
        Some(end) if end < start => Err(ValidationError::EndBeforeStart {
            start: start.to_string(),
            end: end.to_string(),
        }),
        _ => Ok(()),
    }
}
