//! Subagg Types - Shared domain types
//!
//! This crate contains domain types used across the subscription aggregator:
//! - Subscription records and identifiers
//! - Month-granular dates (`MM-YYYY`)
//! - Listing and cost filters
//! - The proration engine used for cost aggregation

pub mod error;
pub mod filter;
pub mod month;
pub mod proration;
pub mod subscription;
pub mod user;

pub use error::*;
pub use filter::*;
pub use month::*;
pub use proration::{BillingWindow, CURRENCY};
pub use subscription::*;
pub use user::*;
