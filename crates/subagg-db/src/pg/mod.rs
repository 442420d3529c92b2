//! PostgreSQL store implementations

mod subscription;

pub use subscription::PgSubscriptionStore;
