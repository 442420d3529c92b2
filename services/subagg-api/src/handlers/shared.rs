//! Shared handler utilities
//!
//! Query-string parsing and metrics helpers used across handlers.

use std::time::Instant;

use subagg_types::{SubscriptionId, UserId, ValidationError};

use crate::error::ApiError;

// ============================================================================
// Input Parsing
// ============================================================================

/// Parse a subscription ID taken from the request path
pub fn parse_subscription_id(raw: &str) -> Result<SubscriptionId, ApiError> {
    Ok(SubscriptionId::parse(raw)?)
}

/// Parse an optional `user_id` query value; empty means "no filter"
pub fn parse_user_filter(raw: Option<&str>) -> Result<Option<UserId>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => Ok(Some(UserId::parse(v)?)),
    }
}

/// Optional non-empty text value
pub fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Lenient integer parsing for paging: garbage yields `None`
pub fn lenient_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse().ok())
}

/// A value that must be present in the query string
pub fn required(raw: Option<&str>, field: &'static str) -> Result<String, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Err(ValidationError::MissingField(field).into()),
        Some(v) => Ok(v.to_string()),
    }
}

// ============================================================================
// Metrics Helpers
// ============================================================================

/// Record HTTP operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "subagg_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}

// ============================================================================
// Tests
// ============================================================================
