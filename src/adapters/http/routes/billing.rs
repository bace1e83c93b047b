use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{AuthenticatedAccount, Payload},
    },
    app_error::AppResult,
    application::use_cases::billing::CheckoutInput,
    domain::entities::product::ProductFamily,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/portal", post(create_portal))
}

#[derive(Serialize)]
struct RedirectResponse {
    url: String,
}

/// POST /api/billing/checkout
/// Body: `{ kind, tier?, plan, idempotency_key? }`. Returns the hosted checkout URL.
async fn create_checkout(
    State(app_state): State<AppState>,
    account: AuthenticatedAccount,
    Payload(payload): Payload<CheckoutInput>,
) -> AppResult<Json<RedirectResponse>> {
    let session = app_state
        .billing_use_cases
        .start_checkout(account.account_id, account.email.as_deref(), payload)
        .await?;
    Ok(Json(RedirectResponse { url: session.url }))
}

#[derive(Deserialize)]
struct PortalPayload {
    kind: ProductFamily,
}

/// POST /api/billing/portal
async fn create_portal(
    State(app_state): State<AppState>,
    account: AuthenticatedAccount,
    Payload(payload): Payload<PortalPayload>,
) -> AppResult<Json<RedirectResponse>> {
    let url = app_state
        .billing_use_cases
        .open_portal(account.account_id, payload.kind)
        .await?;
    Ok(Json(RedirectResponse { url }))
}
