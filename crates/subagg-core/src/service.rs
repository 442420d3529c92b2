//! Subscription service

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use subagg_db::{DbError, SubscriptionStore};
use subagg_types::{
    next_timestamp, CostFilter, Subscription, SubscriptionFilter, SubscriptionId, CURRENCY,
};

use crate::error::{ServiceError, ServiceResult};
use crate::patch::{apply_patch, SubscriptionPatch};
use crate::validate::{check_range, validate_price, validate_service_name, NewSubscription};

/// Aggregated cost over a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotalCost {
    pub total_cost: i64,
    pub currency: &'static str,
}

/// Subscription service: validation and orchestration over a store.
///
/// Generic over the store so the HTTP layer can wire a trait object while
/// tests use a concrete in-memory store.
pub struct SubscriptionService<S: SubscriptionStore + ?Sized> {
    store: Arc<S>,
}

impl<S: SubscriptionStore + ?Sized> Clone for SubscriptionService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: SubscriptionStore + ?Sized> SubscriptionService<S> {
    /// Create a new subscription service
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate and record a new subscription
    #[instrument(skip(self, input), fields(service_name = %input.service_name, user_id = %input.user_id))]
    pub async fn create(&self, input: NewSubscription) -> ServiceResult<Subscription> {
        let sub = input.into_subscription()?;

        self.store
            .insert(&sub)
            .await
            .map_err(|e| storage_failure("create", Some(sub.id), e))?;

        tracing::info!(subscription_id = %sub.id, "Subscription created");
        Ok(sub)
    }

    /// Fetch one subscription
    #[instrument(skip(self))]
    pub async fn get(&self, id: SubscriptionId) -> ServiceResult<Subscription> {
        self.store
            .fetch_by_id(id)
            .await
            .map_err(|e| storage_failure("get", Some(id), e))
    }

    /// List subscriptions newest first; paging is clamped into range
    #[instrument(skip(self))]
    pub async fn list(&self, filter: SubscriptionFilter) -> ServiceResult<Vec<Subscription>> {
        let filter = filter.clamped();
        self.store
            .fetch_many(&filter)
            .await
            .map_err(|e| storage_failure("list", None, e))
    }

    /// Apply a partial update under the store's per-row lock.
    ///
    /// Concurrent updates to one subscription are serialized; each starts
    /// from the previous committed state.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: SubscriptionId,
        patch: SubscriptionPatch,
    ) -> ServiceResult<Subscription> {
        if patch.is_noop() {
            tracing::debug!("Patch changes no field, only updated_at advances");
        }

        let updated = self
            .store
            .update_atomically(
                id,
                Box::new(move |sub| {
                    let patched = apply_patch(sub.clone(), &patch)?;
                    *sub = patched;
                    Ok(())
                }),
            )
            .await
            .map_err(|e| storage_failure("update", Some(id), e))?;

        tracing::info!(subscription_id = %id, "Subscription updated");
        Ok(updated)
    }

    /// Overwrite a subscription's mutable fields without taking a lock.
    ///
    /// The caller supplies the whole row. `id`, `user_id` and `created_at`
    /// identify it and are not changed; `updated_at` is advanced.
    #[instrument(skip(self, sub), fields(subscription_id = %sub.id))]
    pub async fn replace(&self, mut sub: Subscription) -> ServiceResult<Subscription> {
        sub.service_name = validate_service_name(&sub.service_name)?;
        validate_price(i64::from(sub.price))?;
        check_range(sub.start_date, sub.end_date)?;
        sub.updated_at = next_timestamp(sub.updated_at);

        self.store
            .replace(&sub)
            .await
            .map_err(|e| storage_failure("replace", Some(sub.id), e))?;

        Ok(sub)
    }

    /// Hard-delete a subscription
    #[instrument(skip(self))]
    pub async fn delete(&self, id: SubscriptionId) -> ServiceResult<()> {
        self.store
            .delete_by_id(id)
            .await
            .map_err(|e| storage_failure("delete", Some(id), e))?;

        tracing::info!(subscription_id = %id, "Subscription deleted");
        Ok(())
    }

    /// Total prorated cost of matching subscriptions
    #[instrument(skip(self))]
    pub async fn total_cost(&self, filter: CostFilter) -> ServiceResult<TotalCost> {
        let total_cost = self
            .store
            .sum_cost(&filter)
            .await
            .map_err(|e| storage_failure("total_cost", None, e))?;

        Ok(TotalCost {
            total_cost,
            currency: CURRENCY,
        })
    }

    /// Check that the backing store is reachable
    pub async fn ping(&self) -> ServiceResult<()> {
        self.store
            .ping()
            .await
            .map_err(|e| storage_failure("ping", None, e))
    }
}

/// Convert a store error, logging genuine storage failures with context
fn storage_failure(
    operation: &'static str,
    id: Option<SubscriptionId>,
    err: DbError,
) -> ServiceError {
    let err = ServiceError::from(err);
    match (&err, id) {
        (ServiceError::Storage(source), Some(id)) => {
            tracing::error!(operation, subscription_id = %id, error = %source, "Storage failure");
        }
        (ServiceError::Storage(source), None) => {
            tracing::error!(operation, error = %source, "Storage failure");
        }
        (ServiceError::Validation(e), _) => {
            tracing::debug!(operation, error = %e, "Rejected");
        }
        (ServiceError::NotFound, _) => {}
    }
    err
}

