//! Subscription types

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{UserId, ValidationError, YearMonth};

/// Unique subscription identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    /// Create a new random subscription ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a subscription ID from a string
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ValidationError::InvalidSubscriptionId(s.to_string()))
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SubscriptionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// A recorded subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscription ID, immutable once assigned
    pub id: SubscriptionId,
    /// Name of the subscribed service
    pub service_name: String,
    /// Flat monthly charge in whole currency units
    pub price: i32,
    /// User who owns the subscription
    pub user_id: UserId,
    /// First billed month (inclusive)
    pub start_date: YearMonth,
    /// Last billed month (inclusive); `None` while still active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<YearMonth>,
    /// When the subscription was recorded
    pub created_at: DateTime<Utc>,
    /// When the subscription was last modified
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Stamp `updated_at` for a successful mutation.
    ///
    /// The new value is strictly later than the previous one even when the
    /// wall clock has not advanced past it.
    pub fn touch(&mut self) {
        self.updated_at = next_timestamp(self.updated_at);
    }

    /// Whether `start_date <= end_date` holds
    pub fn has_valid_range(&self) -> bool {
        self.end_date.map_or(true, |end| self.start_date <= end)
    }
}

/// Current time at the precision the database keeps (microseconds)
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A timestamp strictly after `previous`, normally the current time
pub fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = timestamp_now();
    if now > previous {
        now
    } else {
        previous.trunc_subsecs(6) + Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Subscription {
        let now = timestamp_now();
        Subscription {
            id: SubscriptionId::new(),
            service_name: "Yandex Plus".to_string(),
            price: 400,
            user_id: UserId(Uuid::new_v4()),
            start_date: "07-2025".parse().unwrap(),
            end_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_touch_strictly_advances() {
        let mut sub = sample();
        let before = sub.updated_at;
        sub.touch();
        assert!(sub.updated_at > before);
        assert_eq!(sub.created_at, before);
    }

    #[test]
    fn test_next_timestamp_handles_future_previous() {
        let future = timestamp_now() + Duration::hours(1);
        assert_eq!(next_timestamp(future), future + Duration::microseconds(1));
    }

    #[test]
    fn test_has_valid_range() {
        let mut sub = sample();
        assert!(sub.has_valid_range());

        sub.end_date = Some("07-2025".parse().unwrap());
        assert!(sub.has_valid_range());

        sub.end_date = Some("06-2025".parse().unwrap());
        assert!(!sub.has_valid_range());
    }

    #[test]
    fn test_json_omits_open_end_date() {
        let sub = sample();
        let json = serde_json::to_value(&sub).unwrap();
        assert_eq!(json["start_date"], "07-2025");
        assert!(json.get("end_date").is_none());
    }

    #[test]
    fn test_parse_subscription_id() {
        assert!(SubscriptionId::parse("11111111-1111-1111-1111-111111111111").is_ok());
        assert!(matches!(
            SubscriptionId::parse("42"),
            Err(ValidationError::InvalidSubscriptionId(_))
        ));
    }
}
