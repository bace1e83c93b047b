pub mod admin;
pub mod billing;
pub mod billing_webhooks;
pub mod entitlements;
pub mod ops;

use axum::{Json, Router, routing::get};

use crate::adapters::http::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/entitlements", entitlements::router())
        .nest("/admin", admin::router())
        .nest("/ops", ops::router())
        .nest("/billing", billing::router().merge(billing_webhooks::router()))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
