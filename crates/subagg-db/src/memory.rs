//! In-memory subscription store
//!
//! Keeps every subscription in a concurrent map. Atomic updates hold the
//! entry's write guard for the whole read-mutate-write, which serializes
//! callers targeting the same ID.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use subagg_types::proration::total_cost;
use subagg_types::{CostFilter, Subscription, SubscriptionFilter, SubscriptionId};

use crate::error::{DbError, DbResult};
use crate::repo::{apply_mutation, Mutation, SubscriptionStore};

/// In-memory subscription store
#[derive(Default, Clone)]
pub struct MemorySubscriptionStore {
    rows: Arc<DashMap<SubscriptionId, Subscription>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored subscriptions
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the store holds no subscriptions
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn insert(&self, sub: &Subscription) -> DbResult<()> {
        match self.rows.entry(sub.id) {
            Entry::Occupied(_) => Err(DbError::Duplicate(sub.id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(sub.clone());
                Ok(())
            }
        }
    }

    async fn fetch_by_id(&self, id: SubscriptionId) -> DbResult<Subscription> {
        self.rows
            .get(&id)
            .map(|r| r.value().clone())
            .ok_or(DbError::NotFound)
    }

    async fn fetch_many(&self, filter: &SubscriptionFilter) -> DbResult<Vec<Subscription>> {
        let mut subs: Vec<Subscription> = self
            .rows
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();

        subs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.0.cmp(&a.id.0))
        });

        let offset = usize::try_from(filter.offset).unwrap_or(0);
        let limit = usize::try_from(filter.limit).unwrap_or(0);
        Ok(subs.into_iter().skip(offset).take(limit).collect())
    }

    async fn replace(&self, sub: &Subscription) -> DbResult<()> {
        let mut row = self.rows.get_mut(&sub.id).ok_or(DbError::NotFound)?;
        row.service_name = sub.service_name.clone();
        row.price = sub.price;
        row.start_date = sub.start_date;
        row.end_date = sub.end_date;
        row.updated_at = sub.updated_at;
        Ok(())
    }

    async fn delete_by_id(&self, id: SubscriptionId) -> DbResult<()> {
        self.rows.remove(&id).map(|_| ()).ok_or(DbError::NotFound)
    }

    async fn sum_cost(&self, filter: &CostFilter) -> DbResult<i64> {
        let candidates: Vec<Subscription> = self
            .rows
            .iter()
            .filter(|r| filter.matches(r.value()))
            .map(|r| r.value().clone())
            .collect();

        Ok(total_cost(&candidates, &filter.window))
    }

    async fn update_atomically(
        &self,
        id: SubscriptionId,
        mutate: Mutation,
    ) -> DbResult<Subscription> {
        // The guard is held until the new value is written back.
        let mut row = self.rows.get_mut(&id).ok_or(DbError::NotFound)?;
        let updated = apply_mutation(row.value(), mutate)?;
        *row = updated.clone();
        Ok(updated)
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use subagg_types::{timestamp_now, BillingWindow, UserId, ValidationError, YearMonth};
    use uuid::Uuid;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    fn subscription(name: &str, price: i32, start: &str, end: Option<&str>) -> Subscription {
        let now = timestamp_now();
        Subscription {
            id: SubscriptionId::new(),
            service_name: name.to_string(),
            price,
            user_id: UserId(Uuid::new_v4()),
            start_date: ym(start),
            end_date: end.map(ym),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_memory_store_crud() {
        let store = MemorySubscriptionStore::new();
        let sub = subscription("Yandex Plus", 400, "07-2025", None);

        // Insert
        store.insert(&sub).await.unwrap();
        assert_eq!(store.len(), 1);

        // Fetch
        let found = store.fetch_by_id(sub.id).await.unwrap();
        assert_eq!(found, sub);

        // Replace
        let mut changed = found.clone();
        changed.price = 500;
        changed.touch();
        store.replace(&changed).await.unwrap();
        assert_eq!(store.fetch_by_id(sub.id).await.unwrap().price, 500);

        // Delete
        store.delete_by_id(sub.id).await.unwrap();
        assert!(store.is_empty());
        assert!(store.fetch_by_id(sub.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = MemorySubscriptionStore::new();
        let sub = subscription("Netflix", 700, "01-2025", None);
        store.insert(&sub).await.unwrap();

        let err = store.insert(&sub).await.unwrap_err();
        assert!(matches!(err, DbError::Duplicate(_)));
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let store = MemorySubscriptionStore::new();
        let ghost = subscription("Ghost", 1, "01-2025", None);

        assert!(store.replace(&ghost).await.unwrap_err().is_not_found());
        assert!(store.delete_by_id(ghost.id).await.unwrap_err().is_not_found());
        assert!(store
            .update_atomically(ghost.id, Box::new(|_| Ok(())))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_many_newest_first_with_paging() {
        let store = MemorySubscriptionStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let mut sub = subscription(&format!("Service {i}"), 100, "01-2025", None);
            sub.created_at += chrono::Duration::seconds(i);
            sub.updated_at = sub.created_at;
            ids.push(sub.id);
            store.insert(&sub).await.unwrap();
        }

        let page = store
            .fetch_many(&SubscriptionFilter {
                limit: 2,
                offset: 1,
                ..Default::default()
            })
            .await
            .unwrap();

        let got: Vec<_> = page.iter().map(|s| s.id).collect();
        assert_eq!(got, vec![ids[3], ids[2]]);
    }

    #[tokio::test]
    async fn test_sum_cost_excludes_rows_outside_window() {
        let store = MemorySubscriptionStore::new();
        store
            .insert(&subscription("Yandex Plus", 400, "01-2025", Some("12-2025")))
            .await
            .unwrap();
        store
            .insert(&subscription("Netflix", 300, "03-2025", None))
            .await
            .unwrap();
        store
            .insert(&subscription("Old", 10_000, "01-2020", Some("12-2020")))
            .await
            .unwrap();

        let window = BillingWindow::new(ym("01-2025"), ym("06-2025")).unwrap();
        let total = store.sum_cost(&CostFilter::new(window)).await.unwrap();
        assert_eq!(total, 6 * 400 + 4 * 300);

        let only_netflix = CostFilter {
            service_name: Some("NETFLIX".to_string()),
            ..CostFilter::new(window)
        };
        assert_eq!(store.sum_cost(&only_netflix).await.unwrap(), 1200);
    }

    #[tokio::test]
    async fn test_rejected_update_writes_nothing() {
        let store = MemorySubscriptionStore::new();
        let sub = subscription("Spotify", 200, "01-2025", None);
        store.insert(&sub).await.unwrap();

        let err = store
            .update_atomically(
                sub.id,
                Box::new(|s| {
                    s.price = 999;
                    Err(ValidationError::EmptyServiceName)
                }),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Rejected(ValidationError::EmptyServiceName)));
        assert_eq!(store.fetch_by_id(sub.id).await.unwrap(), sub);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let store = MemorySubscriptionStore::new();
        let sub = subscription("Counter", 1, "01-2025", None);
        store.insert(&sub).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .update_atomically(
                        sub.id,
                        Box::new(|s| {
                            s.price += 1;
                            Ok(())
                        }),
                    )
                    .await
                    .unwrap()
            }));
        }

        let mut seen = Vec::new();
        for handle in handles {
            seen.push(handle.await.unwrap().price);
        }

        // Every caller started from a distinct committed state
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 64);
        assert_eq!(store.fetch_by_id(sub.id).await.unwrap().price, 65);
    }
}
