//! Subagg Core - Subscription business logic
//!
//! Validation, partial updates, and the service that orchestrates them over
//! a [`subagg_db::SubscriptionStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use subagg_core::{NewSubscription, SubscriptionPatch, SubscriptionService};
//! use subagg_db::MemorySubscriptionStore;
//!
//! let service = SubscriptionService::new(Arc::new(MemorySubscriptionStore::new()));
//!
//! let sub = service.create(NewSubscription {
//!     service_name: "Yandex Plus".into(),
//!     price: 400,
//!     user_id: "60601fee-2bf1-4721-ae6f-7636e79a0cba".into(),
//!     start_date: "07-2025".into(),
//!     end_date: None,
//! }).await?;
//!
//! // Raise the price; other fields are left alone
//! let patch = SubscriptionPatch { price: Some(500), ..Default::default() };
//! let sub = service.update(sub.id, patch).await?;
//! ```

pub mod error;
pub mod patch;
pub mod service;
pub mod validate;

pub use error::{ServiceError, ServiceResult};
pub use patch::{apply_patch, SubscriptionPatch};
pub use service::{SubscriptionService, TotalCost};
pub use validate::NewSubscription;
