//! Repository traits
//!
//! Define the async storage interface the subscription service is written
//! against. Production wiring uses [`crate::PgSubscriptionStore`]; tests and
//! local runs can use [`crate::MemorySubscriptionStore`].

use async_trait::async_trait;

use subagg_types::{CostFilter, Subscription, SubscriptionFilter, SubscriptionId, ValidationError};

use crate::error::{DbError, DbResult};

/// Caller-supplied change applied to a locked subscription.
///
/// Returning an error aborts the update and rolls it back; the error comes
/// back unchanged inside [`DbError::Rejected`].
pub type Mutation = Box<dyn FnOnce(&mut Subscription) -> Result<(), ValidationError> + Send>;

/// Subscription storage trait
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert a new subscription
    async fn insert(&self, sub: &Subscription) -> DbResult<()>;

    /// Fetch a subscription by ID, failing with [`DbError::NotFound`]
    async fn fetch_by_id(&self, id: SubscriptionId) -> DbResult<Subscription>;

    /// List subscriptions matching `filter`, newest first
    async fn fetch_many(&self, filter: &SubscriptionFilter) -> DbResult<Vec<Subscription>>;

    /// Overwrite every mutable column of an existing subscription
    async fn replace(&self, sub: &Subscription) -> DbResult<()>;

    /// Hard-delete a subscription
    async fn delete_by_id(&self, id: SubscriptionId) -> DbResult<()>;

    /// Sum the prorated cost of matching subscriptions over the filter window
    async fn sum_cost(&self, filter: &CostFilter) -> DbResult<i64>;

    /// Read-lock-mutate-write a single subscription.
    ///
    /// Concurrent calls for the same ID are serialized: the second caller
    /// sees the first caller's committed result. Calls for different IDs do
    /// not wait on each other. `updated_at` is stamped as part of the write.
    async fn update_atomically(&self, id: SubscriptionId, mutate: Mutation)
        -> DbResult<Subscription>;

    /// Check that the store is reachable
    async fn ping(&self) -> DbResult<()>;
}

/// Run `mutate` against a copy of `current` and produce the row to persist.
///
/// Identity fields are restored after the callback so a mutation cannot
/// reassign them, then `updated_at` is advanced.
pub(crate) fn apply_mutation(current: &Subscription, mutate: Mutation) -> DbResult<Subscription> {
    let mut working = current.clone();
    mutate(&mut working).map_err(DbError::Rejected)?;

    working.id = current.id;
    working.user_id = current.user_id;
    working.created_at = current.created_at;
    working.updated_at = current.updated_at;
    working.touch();

    Ok(working)
}
