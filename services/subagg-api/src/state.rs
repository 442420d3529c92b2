//! Application state for the Subscription API service.

use std::sync::Arc;

use subagg_core::SubscriptionService;
use subagg_db::SubscriptionStore;

use crate::config::Config;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Subscription service over the configured store
    pub subscriptions: SubscriptionService<dyn SubscriptionStore>,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state over `store`
    pub fn new(store: Arc<dyn SubscriptionStore>, config: Config) -> Self {
        Self {
            subscriptions: SubscriptionService::new(store),
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
