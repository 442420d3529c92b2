use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Subscription Aggregator API"),
    paths(
        crate::handlers::subscription::create_subscription,
        crate::handlers::subscription::list_subscriptions,
        crate::handlers::subscription::total_cost,
        crate::handlers::subscription::get_subscription,
        crate::handlers::subscription::update_subscription,
        crate::handlers::subscription::delete_subscription,
        crate::handlers::health::health,
        crate::handlers::health::ready
    ),
    components(
        schemas(
            crate::handlers::subscription::SubscriptionResponse,
            crate::handlers::subscription::CreateSubscriptionRequest,
            crate::handlers::subscription::UpdateSubscriptionRequest,
            crate::handlers::subscription::TotalCostResponse,
            crate::handlers::health::HealthResponse,
            crate::handlers::health::ReadyResponse,
            crate::error::ErrorResponse,
            crate::error::ErrorDetail
        )
    ),
    tags(
        (name = "subscriptions", description = "Subscription records and cost aggregation"),
        (name = "health", description = "Probes")
    )
)]
pub struct ApiDoc;
