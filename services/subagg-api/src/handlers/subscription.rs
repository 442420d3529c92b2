//! Subscription handlers

use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use subagg_core::{NewSubscription, SubscriptionPatch, TotalCost};
use subagg_types::{
    BillingWindow, CostFilter, Subscription, SubscriptionFilter, ValidationError, YearMonth,
    DEFAULT_LIST_LIMIT,
};

use super::shared::{
    lenient_int, non_empty, parse_subscription_id, parse_user_filter, record_op_duration,
    required,
};
use crate::error::{ApiResult, ErrorResponse};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: Uuid,
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    #[schema(example = 400)]
    pub price: i32,
    pub user_id: Uuid,
    #[schema(example = "07-2025")]
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "12-2025")]
    pub end_date: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(sub: Subscription) -> Self {
        Self {
            id: sub.id.0,
            service_name: sub.service_name,
            price: sub.price,
            user_id: sub.user_id.0,
            start_date: sub.start_date.to_string(),
            end_date: sub.end_date.map(|d| d.to_string()),
            created_at: sub.created_at,
            updated_at: sub.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubscriptionRequest {
    #[schema(example = "Yandex Plus")]
    pub service_name: Option<String>,
    /// Monthly price in whole roubles
    #[schema(example = 400)]
    pub price: Option<i64>,
    #[schema(example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: Option<String>,
    /// First billed month, `MM-YYYY`
    #[schema(example = "07-2025")]
    pub start_date: Option<String>,
    /// Last billed month, `MM-YYYY`; omit for an open-ended subscription
    pub end_date: Option<String>,
}

impl TryFrom<CreateSubscriptionRequest> for NewSubscription {
    type Error = ValidationError;

    fn try_from(req: CreateSubscriptionRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            service_name: req
                .service_name
                .ok_or(ValidationError::MissingField("service_name"))?,
            price: req.price.ok_or(ValidationError::MissingField("price"))?,
            user_id: req.user_id.ok_or(ValidationError::MissingField("user_id"))?,
            start_date: req
                .start_date
                .ok_or(ValidationError::MissingField("start_date"))?,
            end_date: req.end_date,
        })
    }
}

/// Partial update; absent, empty or zero fields are left unchanged
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSubscriptionRequest {
    pub service_name: Option<String>,
    pub price: Option<i64>,
    /// `MM-YYYY`
    pub start_date: Option<String>,
    /// `MM-YYYY`
    pub end_date: Option<String>,
}

impl From<UpdateSubscriptionRequest> for SubscriptionPatch {
    fn from(req: UpdateSubscriptionRequest) -> Self {
        Self {
            service_name: req.service_name,
            price: req.price,
            start_date: req.start_date,
            end_date: req.end_date,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Only subscriptions of this user
    pub user_id: Option<String>,
    /// Case-insensitive substring of the service name
    pub service_name: Option<String>,
    /// Page size, default 20, at most 100
    pub limit: Option<String>,
    /// Rows to skip
    pub offset: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CostQuery {
    /// First month of the window, `MM-YYYY`
    pub start_date: Option<String>,
    /// Last month of the window, `MM-YYYY`
    pub end_date: Option<String>,
    /// Only subscriptions of this user
    pub user_id: Option<String>,
    /// Case-insensitive substring of the service name
    pub service_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TotalCostResponse {
    #[schema(example = 4800)]
    pub total_cost: i64,
    #[schema(example = "RUB")]
    pub currency: String,
}

impl From<TotalCost> for TotalCostResponse {
    fn from(cost: TotalCost) -> Self {
        Self {
            total_cost: cost.total_cost,
            currency: cost.currency.to_string(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/subscriptions
#[utoipa::path(
    post,
    path = "/api/v1/subscriptions",
    tag = "subscriptions",
    request_body = CreateSubscriptionRequest,
    responses(
        (status = 201, description = "Subscription created", body = SubscriptionResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    )
)]
pub async fn create_subscription(
    State(state): State<AppState>,
    payload: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let start = Instant::now();

    let Json(req) = payload?;
    let input = NewSubscription::try_from(req)?;

    let result = state.subscriptions.create(input).await;
    record_op_duration("create_subscription", start, result.is_ok());
    let sub = result?;

    metrics::counter!("subagg_subscriptions_created_total").increment(1);

    Ok((StatusCode::CREATED, Json(sub.into())))
}

/// GET /api/v1/subscriptions
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions",
    tag = "subscriptions",
    params(ListQuery),
    responses(
        (status = 200, description = "Subscriptions, newest first", body = Vec<SubscriptionResponse>),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    )
)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SubscriptionResponse>>> {
    let start = Instant::now();

    let Query(query) = query?;
    let filter = SubscriptionFilter {
        user_id: parse_user_filter(query.user_id.as_deref())?,
        service_name: non_empty(query.service_name),
        limit: lenient_int(query.limit.as_deref()).unwrap_or(DEFAULT_LIST_LIMIT),
        offset: lenient_int(query.offset.as_deref()).unwrap_or(0),
    };

    let result = state.subscriptions.list(filter).await;
    record_op_duration("list_subscriptions", start, result.is_ok());

    Ok(Json(result?.into_iter().map(Into::into).collect()))
}

/// GET /api/v1/subscriptions/{id}
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/{id}",
    tag = "subscriptions",
    params(("id" = String, Path, description = "Subscription ID")),
    responses(
        (status = 200, description = "Subscription", body = SubscriptionResponse),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "No such subscription", body = ErrorResponse)
    )
)]
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();
    let id = parse_subscription_id(&id)?;

    let result = state.subscriptions.get(id).await;
    record_op_duration("get_subscription", start, result.is_ok());

    Ok(Json(result?.into()))
}

/// PUT /api/v1/subscriptions/{id}
#[utoipa::path(
    put,
    path = "/api/v1/subscriptions/{id}",
    tag = "subscriptions",
    params(("id" = String, Path, description = "Subscription ID")),
    request_body = UpdateSubscriptionRequest,
    responses(
        (status = 200, description = "Updated subscription", body = SubscriptionResponse),
        (status = 400, description = "Invalid patch", body = ErrorResponse),
        (status = 404, description = "No such subscription", body = ErrorResponse)
    )
)]
pub async fn update_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateSubscriptionRequest>, JsonRejection>,
) -> ApiResult<Json<SubscriptionResponse>> {
    let start = Instant::now();
    let id = parse_subscription_id(&id)?;
    let Json(req) = payload?;

    let result = state.subscriptions.update(id, req.into()).await;
    record_op_duration("update_subscription", start, result.is_ok());
    let sub = result?;

    metrics::counter!("subagg_subscriptions_updated_total").increment(1);

    Ok(Json(sub.into()))
}

/// DELETE /api/v1/subscriptions/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/subscriptions/{id}",
    tag = "subscriptions",
    params(("id" = String, Path, description = "Subscription ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Malformed ID", body = ErrorResponse),
        (status = 404, description = "No such subscription", body = ErrorResponse)
    )
)]
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let start = Instant::now();
    let id = parse_subscription_id(&id)?;

    let result = state.subscriptions.delete(id).await;
    record_op_duration("delete_subscription", start, result.is_ok());
    result?;

    metrics::counter!("subagg_subscriptions_deleted_total").increment(1);

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/subscriptions/cost
#[utoipa::path(
    get,
    path = "/api/v1/subscriptions/cost",
    tag = "subscriptions",
    params(CostQuery),
    responses(
        (status = 200, description = "Total prorated cost", body = TotalCostResponse),
        (status = 400, description = "Missing or malformed window", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    )
)]
pub async fn total_cost(
    State(state): State<AppState>,
    query: Result<Query<CostQuery>, QueryRejection>,
) -> ApiResult<Json<TotalCostResponse>> {
    let start = Instant::now();

    let Query(query) = query?;
    let window_start = required(query.start_date.as_deref(), "start_date")?;
    let window_end = required(query.end_date.as_deref(), "end_date")?;
    let window = BillingWindow::new(
        YearMonth::parse_field("start_date", &window_start)?,
        YearMonth::parse_field("end_date", &window_end)?,
    )?;

    let filter = CostFilter {
        user_id: parse_user_filter(query.user_id.as_deref())?,
        service_name: non_empty(query.service_name),
        window,
    };

    let result = state.subscriptions.total_cost(filter).await;
    record_op_duration("total_cost", start, result.is_ok());

    Ok(Json(result?.into()))
}
