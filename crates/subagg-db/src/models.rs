//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use subagg_types::{Subscription, SubscriptionId, UserId, YearMonth};

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub service_name: String,
    pub price: i32,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Conversion implementations between the row type and the domain type
impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            id: SubscriptionId(row.id),
            service_name: row.service_name,
            price: row.price,
            user_id: UserId(row.user_id),
            start_date: YearMonth::from_date(row.start_date),
            end_date: row.end_date.map(YearMonth::from_date),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Subscription> for SubscriptionRow {
    fn from(sub: &Subscription) -> Self {
        Self {
            id: sub.id.0,
            service_name: sub.service_name.clone(),
            price: sub.price,
            user_id: sub.user_id.0,
            start_date: sub.start_date.first_day(),
            end_date: sub.end_date.map(YearMonth::first_day),
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_dates_normalize_to_month() {
        let now = Utc::now();
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            service_name: "Yandex Plus".to_string(),
            price: 400,
            user_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            end_date: Some(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()),
            created_at: now,
            updated_at: now,
        };

        let sub = Subscription::from(row);
        assert_eq!(sub.start_date.to_string(), "07-2025");
        assert_eq!(sub.end_date.map(|d| d.to_string()).as_deref(), Some("12-2025"));

        let back = SubscriptionRow::from(&sub);
        assert_eq!(back.start_date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(back.end_date, NaiveDate::from_ymd_opt(2025, 12, 1));
    }
}
