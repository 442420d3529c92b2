//! PostgreSQL subscription store implementation

use async_trait::async_trait;
use sqlx::PgPool;

use subagg_types::{CostFilter, Subscription, SubscriptionFilter, SubscriptionId};

use crate::error::{DbError, DbResult};
use crate::models::SubscriptionRow;
use crate::repo::{apply_mutation, Mutation, SubscriptionStore};

/// PostgreSQL subscription store
#[derive(Clone)]
pub struct PgSubscriptionStore {
    pool: PgPool,
}

impl PgSubscriptionStore {
    /// Create a new subscription store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionStore for PgSubscriptionStore {
    async fn insert(&self, sub: &Subscription) -> DbResult<()> {
        let row = SubscriptionRow::from(sub);

        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, service_name, price, user_id, start_date, end_date,
                                       created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(row.id)
        .bind(&row.service_name)
        .bind(row.price)
        .bind(row.user_id)
        .bind(row.start_date)
        .bind(row.end_date)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if duplicate {
                DbError::Duplicate(sub.id.to_string())
            } else {
                DbError::Sqlx(e)
            }
        })?;

        Ok(())
    }

    async fn fetch_by_id(&self, id: SubscriptionId) -> DbResult<Subscription> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, service_name, price, user_id, start_date, end_date, created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Subscription::from).ok_or(DbError::NotFound)
    }

    async fn fetch_many(&self, filter: &SubscriptionFilter) -> DbResult<Vec<Subscription>> {
        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, service_name, price, user_id, start_date, end_date, created_at, updated_at
            FROM subscriptions
            WHERE ($1::uuid IS NULL OR user_id = $1)
              AND ($2::text IS NULL OR service_name ILIKE $2 ESCAPE '\')
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.user_id.map(|u| u.0))
        .bind(name_pattern(filter.service_name.as_deref()))
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Subscription::from).collect())
    }

    async fn replace(&self, sub: &Subscription) -> DbResult<()> {
        let row = SubscriptionRow::from(sub);

        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET service_name = $1, price = $2, start_date = $3, end_date = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(&row.service_name)
        .bind(row.price)
        .bind(row.start_date)
        .bind(row.end_date)
        .bind(row.updated_at)
        .bind(row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn delete_by_id(&self, id: SubscriptionId) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }

    async fn sum_cost(&self, filter: &CostFilter) -> DbResult<i64> {
        // Same formula as subagg_types::proration, per-row overlap clamped at zero
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(price::bigint * GREATEST(
                       EXTRACT(YEAR FROM LEAST(COALESCE(end_date, $1), $1)) * 12
                     + EXTRACT(MONTH FROM LEAST(COALESCE(end_date, $1), $1))
                     - EXTRACT(YEAR FROM GREATEST(start_date, $2)) * 12
                     - EXTRACT(MONTH FROM GREATEST(start_date, $2))
                     + 1, 0)), 0)::bigint AS total_cost
            FROM subscriptions
            WHERE start_date <= $1
              AND (end_date IS NULL OR end_date >= $2)
              AND ($3::uuid IS NULL OR user_id = $3)
              AND ($4::text IS NULL OR service_name ILIKE $4 ESCAPE '\')
            "#,
        )
        .bind(filter.window.end().first_day())
        .bind(filter.window.start().first_day())
        .bind(filter.user_id.map(|u| u.0))
        .bind(name_pattern(filter.service_name.as_deref()))
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn update_atomically(
        &self,
        id: SubscriptionId,
        mutate: Mutation,
    ) -> DbResult<Subscription> {
        // Dropping the transaction before commit rolls it back, so every early
        // return and every cancelled await leaves the row untouched.
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, service_name, price, user_id, start_date, end_date, created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.0)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            release(tx, id).await;
            return Err(DbError::NotFound);
        };

        let current = Subscription::from(row);
        let updated = match apply_mutation(&current, mutate) {
            Ok(updated) => updated,
            Err(e) => {
                tracing::debug!(subscription_id = %id, error = %e, "atomic update rejected");
                release(tx, id).await;
                return Err(e);
            }
        };

        let row = SubscriptionRow::from(&updated);
        sqlx::query(
            r#"
            UPDATE subscriptions
            SET service_name = $1, price = $2, start_date = $3, end_date = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(&row.service_name)
        .bind(row.price)
        .bind(row.start_date)
        .bind(row.end_date)
        .bind(row.updated_at)
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Roll back an update that will not be committed.
///
/// A failed rollback only loses the connection; the server discards the
/// transaction either way, so the caller's error is what gets reported.
async fn release(tx: sqlx::Transaction<'_, sqlx::Postgres>, id: SubscriptionId) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(subscription_id = %id, error = %e, "rollback failed");
    }
}

/// `ILIKE` pattern matching `needle` as a literal substring
fn name_pattern(needle: Option<&str>) -> Option<String> {
    let needle = needle.filter(|n| !n.is_empty())?;

    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');

    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_pattern_wraps_substring() {
        assert_eq!(name_pattern(Some("plus")).as_deref(), Some("%plus%"));
    }

    #[test]
    fn test_name_pattern_escapes_wildcards() {
        assert_eq!(
            name_pattern(Some(r"50%_off\")).as_deref(),
            Some(r"%50\%\_off\\%")
        );
    }

    #[test]
    fn test_name_pattern_empty_is_none() {
        assert_eq!(name_pattern(None), None);
        assert_eq!(name_pattern(Some("")), None);
    }
}
