use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use axum_extra::extract::WithRejection;
use serde::Serialize;

use crate::{
    adapters::http::{app_state::AppState, extract::AuthenticatedAccount},
    app_error::{AppError, AppResult},
    domain::entities::product::{Plan, ProductKey},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{product}", get(get_entitlement))
}

#[derive(Serialize)]
struct EntitlementResponse {
    product: ProductKey,
    active: bool,
    plan: Option<Plan>,
}

/// GET /api/entitlements/{product}
/// Whether the caller currently holds the product, and on which plan.
async fn get_entitlement(
    State(app_state): State<AppState>,
    account: AuthenticatedAccount,
    WithRejection(Path(product), _): WithRejection<Path<ProductKey>, AppError>,
) -> AppResult<Json<EntitlementResponse>> {
    let plan = app_state
        .entitlement_use_cases
        .active_plan(account.account_id, product)
        .await;

    Ok(Json(EntitlementResponse {
        product,
        active: plan.is_some(),
        plan,
    }))
}
