//! Shared fixtures for service tests

use std::sync::Arc;

use async_trait::async_trait;
use subagg_core::{NewSubscription, SubscriptionService};
use subagg_db::{DbError, DbResult, MemorySubscriptionStore, Mutation, SubscriptionStore};
use subagg_types::{CostFilter, Subscription, SubscriptionFilter, SubscriptionId};

pub const ALICE: &str = "60601fee-2bf1-4721-ae6f-7636e79a0cba";
pub const BOB: &str = "1b4e28ba-2fa1-11d2-883f-0016d3cca427";

pub fn memory_service() -> SubscriptionService<MemorySubscriptionStore> {
    SubscriptionService::new(Arc::new(MemorySubscriptionStore::new()))
}

pub fn new_sub(user: &str, name: &str, price: i64, start: &str, end: Option<&str>) -> NewSubscription {
    NewSubscription {
        service_name: name.to_string(),
        price,
        user_id: user.to_string(),
        start_date: start.to_string(),
        end_date: end.map(str::to_string),
    }
}

/// Store whose every call fails as if the database were unreachable
#[derive(Default)]
pub struct UnreachableStore;

fn unreachable_db() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[async_trait]
impl SubscriptionStore for UnreachableStore {
    async fn insert(&self, _: &Subscription) -> DbResult<()> {
        Err(unreachable_db())
    }

    async fn fetch_by_id(&self, _: SubscriptionId) -> DbResult<Subscription> {
        Err(unreachable_db())
    }

    async fn fetch_many(&self, _: &SubscriptionFilter) -> DbResult<Vec<Subscription>> {
        Err(unreachable_db())
    }

    async fn replace(&self, _: &Subscription) -> DbResult<()> {
        Err(unreachable_db())
    }

    async fn delete_by_id(&self, _: SubscriptionId) -> DbResult<()> {
        Err(unreachable_db())
    }

    async fn sum_cost(&self, _: &CostFilter) -> DbResult<i64> {
        Err(unreachable_db())
    }

    async fn update_atomically(&self, _: SubscriptionId, _: Mutation) -> DbResult<Subscription> {
        Err(unreachable_db())
    }

    async fn ping(&self) -> DbResult<()> {
        Err(unreachable_db())
    }
}
