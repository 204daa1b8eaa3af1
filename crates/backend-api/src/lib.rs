mod envelope;
mod error;
mod events;
mod middleware;
mod state;
mod util;

pub mod routes;
pub mod services;

pub use envelope::ApiSuccess;
pub use error::ApiError;
pub use events::{EventBroker, RealtimeEvent};
pub use middleware::AuthUser;
pub use state::{AppState, RateLimiter};

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/healthz", get(routes::health::health_check))
        .route("/readyz", get(routes::health::readiness_check))
        .route("/api/v1/auth/register", post(routes::auth::register))
        .route("/api/v1/auth/login", post(routes::auth::login))
        .route("/api/v1/auth/refresh", post(routes::auth::refresh))
        .route("/api/v1/auth/logout", post(routes::auth::logout));

    let protected = Router::new()
        .route("/api/v1/users/profile", get(routes::auth::profile))
        // Household routes
        .route(
            "/api/v1/households",
            get(routes::households::list_households).post(routes::households::create_household),
        )
        .route(
            "/api/v1/households/:household_id",
            put(routes::households::update_household),
        )
        // Bill routes
        .route(
            "/api/v1/bills",
            get(routes::bills::list_bills).post(routes::bills::create_bill),
        )
        .route(
            "/api/v1/bills/:bill_id",
            get(routes::bills::get_bill)
                .put(routes::bills::update_bill)
                .delete(routes::bills::delete_bill),
        )
        // Admin panel routes
        .route(
            "/api/v1/admin/compliance",
            get(routes::admin::list_compliance).post(routes::admin::create_compliance),
        )
        .route(
            "/api/v1/admin/compliance/metrics",
            get(routes::admin::compliance_metrics),
        )
        .route(
            "/api/v1/admin/compliance/:record_id",
            put(routes::admin::update_compliance).delete(routes::admin::delete_compliance),
        )
        .route(
            "/api/v1/admin/risks",
            get(routes::admin::list_risk_flags).post(routes::admin::create_risk_flag),
        )
        .route("/api/v1/admin/risks/flags", get(routes::admin::refresh_risk_flags))
        .route(
            "/api/v1/admin/risks/:record_id",
            put(routes::admin::update_risk_flag).delete(routes::admin::delete_risk_flag),
        )
        .route(
            "/api/v1/admin/webhooks",
            get(routes::admin::list_webhooks).post(routes::admin::create_webhook),
        )
        .route("/api/v1/admin/webhooks/health", get(routes::admin::webhook_health))
        .route(
            "/api/v1/admin/webhooks/:record_id",
            put(routes::admin::update_webhook).delete(routes::admin::delete_webhook),
        )
        // Realtime routes
        .route("/api/v1/events", post(routes::events::publish_event))
        .route("/api/v1/events/stream", get(routes::events::stream_events))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ));

    public
        .merge(protected)
        .with_state(state.clone())
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::rate_limit,
        ))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::security_headers))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
