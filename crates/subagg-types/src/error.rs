//! Validation errors shared by every layer

use thiserror::Error;

/// A caller-fixable problem with submitted data.
///
/// Never retried; the message is safe to return to API clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Service name is empty or whitespace
    #[error("service_name must not be empty")]
    EmptyServiceName,

    /// Price is zero or negative
    #[error("price must be a positive integer, got {0}")]
    NonPositivePrice(i64),

    /// Price does not fit the stored column
    #[error("price {0} is too large")]
    PriceTooLarge(i64),

    /// User ID is not a UUID
    #[error("invalid user_id format: {0:?}")]
    InvalidUserId(String),

    /// Subscription ID is not a UUID
    #[error("invalid subscription id: {0:?}")]
    InvalidSubscriptionId(String),

    /// Date string is not `MM-YYYY`
    #[error("invalid {field} format {value:?}, expected MM-YYYY")]
    InvalidDate {
        /// Name of the offending field
        field: &'static str,
        /// Submitted value
        value: String,
    },

    /// A required field was not supplied
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Subscription would end before it starts
    #[error("end_date {end} is before start_date {start}")]
    EndBeforeStart {
        /// Start month (`MM-YYYY`)
        start: String,
        /// End month (`MM-YYYY`)
        end: String,
    },

    /// Cost window starts after it ends
    #[error("start_date {start} is after end_date {end}")]
    InvalidWindow {
        /// Window start (`MM-YYYY`)
        start: String,
        /// Window end (`MM-YYYY`)
        end: String,
    },
}
