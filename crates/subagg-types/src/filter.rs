//! Query filters for listing subscriptions and aggregating cost

use serde::{Deserialize, Serialize};

use crate::proration::BillingWindow;
use crate::{Subscription, UserId};

/// Page size used when the caller does not ask for one
pub const DEFAULT_LIST_LIMIT: i64 = 20;

/// Largest page size a caller may ask for
pub const MAX_LIST_LIMIT: i64 = 100;

/// Criteria for listing subscriptions, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionFilter {
    /// Only subscriptions owned by this user
    pub user_id: Option<UserId>,
    /// Case-insensitive substring of the service name
    pub service_name: Option<String>,
    /// Maximum number of rows
    pub limit: i64,
    /// Rows to skip
    pub offset: i64,
}

impl Default for SubscriptionFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            service_name: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl SubscriptionFilter {
    /// Bring paging into range: a non-positive limit becomes the default,
    /// an oversized one is capped, and a negative offset becomes zero.
    pub fn clamped(mut self) -> Self {
        self.limit = match self.limit {
            l if l <= 0 => DEFAULT_LIST_LIMIT,
            l => l.min(MAX_LIST_LIMIT),
        };
        self.offset = self.offset.max(0);
        self
    }

    /// Whether `sub` satisfies the user and service-name criteria
    pub fn matches(&self, sub: &Subscription) -> bool {
        user_matches(self.user_id, sub) && name_matches(self.service_name.as_deref(), sub)
    }
}

/// Criteria for summing subscription cost over a window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostFilter {
    /// Only subscriptions owned by this user
    pub user_id: Option<UserId>,
    /// Case-insensitive substring of the service name
    pub service_name: Option<String>,
    /// Months to aggregate over
    pub window: BillingWindow,
}

impl CostFilter {
    /// Cost filter over `window` with no user or name restriction
    pub fn new(window: BillingWindow) -> Self {
        Self {
            user_id: None,
            service_name: None,
            window,
        }
    }

    /// Whether `sub` satisfies the user and service-name criteria.
    ///
    /// The window is not consulted here; see [`BillingWindow::admits`].
    pub fn matches(&self, sub: &Subscription) -> bool {
        user_matches(self.user_id, sub) && name_matches(self.service_name.as_deref(), sub)
    }
}

fn user_matches(user_id: Option<UserId>, sub: &Subscription) -> bool {
    user_id.map_or(true, |id| sub.user_id == id)
}

fn name_matches(needle: Option<&str>, sub: &Subscription) -> bool {
    match needle {
        None | Some("") => true,
        Some(needle) => sub
            .service_name
            .to_lowercase()
            .contains(&needle.to_lowercase()),
    }
}
