//! Subagg DB - Storage layer
//!
//! SQLx-based persistence for subscriptions, plus an in-memory store with
//! the same guarantees for tests and local runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use subagg_db::{create_pool, run_migrations, PgSubscriptionStore, SubscriptionStore};
//!
//! let pool = create_pool("postgres://localhost/subagg").await?;
//! run_migrations(&pool).await?;
//! let store = PgSubscriptionStore::new(pool);
//!
//! let sub = store.fetch_by_id(id).await?;
//! ```

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;

pub use error::{DbError, DbResult};
pub use memory::MemorySubscriptionStore;
pub use models::*;
pub use pg::PgSubscriptionStore;
pub use pool::{create_pool, create_pool_with_options, run_migrations, DbPool, PoolOptions};
pub use repo::{Mutation, SubscriptionStore};
