use axum::{
    Json, Router,
    extract::{Path, State},
    routing::patch,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{Authorized, OpsStaff, Payload},
    },
    app_error::{AppError, AppResult},
    domain::entities::order::{Order, OrderStatus},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/orders/{id}/status", patch(set_order_status))
}

#[derive(Deserialize)]
struct SetStatusPayload {
    status: OrderStatus,
}

#[derive(Serialize)]
struct OrderResponse {
    id: Uuid,
    location_id: Uuid,
    status: OrderStatus,
    customer_name: Option<String>,
    total_cents: i64,
    updated_at: Option<DateTime<Utc>>,
}

impl From<Order> for OrderResponse {
    fn from(o: Order) -> Self {
        Self {
            id: o.id,
            location_id: o.location_id,
            status: o.status,
            customer_name: o.customer_name,
            total_cents: o.total_cents,
            updated_at: o.updated_at,
        }
    }
}

/// PATCH /api/ops/orders/{id}/status
async fn set_order_status(
    State(app_state): State<AppState>,
    auth: Authorized<OpsStaff>,
    WithRejection(Path(order_id), _): WithRejection<Path<Uuid>, AppError>,
    Payload(payload): Payload<SetStatusPayload>,
) -> AppResult<Json<OrderResponse>> {
    let order = app_state
        .ops_use_cases
        .set_order_status(auth.account.account_id, order_id, payload.status)
        .await?;
    Ok(Json(order.into()))
}
