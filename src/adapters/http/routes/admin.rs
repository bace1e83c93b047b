use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, patch, post},
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{AdminOnly, Authorized, Payload},
    },
    app_error::{AppError, AppResult},
    application::use_cases::admin::{ManualGrantInput, UpdateLocationInput},
    domain::entities::{
        entitlement::{Entitlement, EntitlementStatus},
        location::Location,
        product::{Plan, ProductKey},
        profile::{Profile, Role},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profiles/{account_id}/role", patch(set_role))
        .route("/entitlements", post(grant_entitlement))
        .route("/entitlements/{id}", delete(revoke_entitlement))
        .route("/locations/{id}", patch(update_location))
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Serialize)]
struct ProfileResponse {
    id: Uuid,
    email: Option<String>,
    role: Role,
}

impl From<Profile> for ProfileResponse {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            role: p.role,
        }
    }
}

#[derive(Serialize)]
struct EntitlementResponse {
    id: Uuid,
    account_id: Uuid,
    product_key: ProductKey,
    plan: Plan,
    status: EntitlementStatus,
    expires_at: Option<DateTime<Utc>>,
    source_ref: String,
}

impl From<Entitlement> for EntitlementResponse {
    fn from(e: Entitlement) -> Self {
        Self {
            id: e.id,
            account_id: e.account_id,
            product_key: e.product_key,
            plan: e.plan,
            status: e.status,
            expires_at: e.expires_at,
            source_ref: e.source_ref,
        }
    }
}

#[derive(Serialize)]
struct LocationResponse {
    id: Uuid,
    name: String,
    contact_email: Option<String>,
    phone: Option<String>,
    is_published: bool,
    updated_at: Option<DateTime<Utc>>,
}

impl From<Location> for LocationResponse {
    fn from(l: Location) -> Self {
        Self {
            id: l.id,
            name: l.name,
            contact_email: l.contact_email,
            phone: l.phone,
            is_published: l.is_published,
            updated_at: l.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Deserialize)]
struct SetRolePayload {
    role: Role,
}

/// PATCH /api/admin/profiles/{account_id}/role
async fn set_role(
    State(app_state): State<AppState>,
    auth: Authorized<AdminOnly>,
    WithRejection(Path(account_id), _): WithRejection<Path<Uuid>, AppError>,
    Payload(payload): Payload<SetRolePayload>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = app_state
        .admin_use_cases
        .set_role(auth.account.account_id, account_id, payload.role)
        .await?;
    Ok(Json(profile.into()))
}

/// POST /api/admin/entitlements
async fn grant_entitlement(
    State(app_state): State<AppState>,
    auth: Authorized<AdminOnly>,
    Payload(payload): Payload<ManualGrantInput>,
) -> AppResult<Json<EntitlementResponse>> {
    let entitlement = app_state
        .admin_use_cases
        .grant_entitlement(auth.account.account_id, payload)
        .await?;
    Ok(Json(entitlement.into()))
}

/// DELETE /api/admin/entitlements/{id}
/// Revokes the grant; the row is kept for history.
async fn revoke_entitlement(
    State(app_state): State<AppState>,
    auth: Authorized<AdminOnly>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
) -> AppResult<Json<EntitlementResponse>> {
    let entitlement = app_state
        .admin_use_cases
        .revoke_entitlement(auth.account.account_id, id)
        .await?;
    Ok(Json(entitlement.into()))
}

/// PATCH /api/admin/locations/{id}
async fn update_location(
    State(app_state): State<AppState>,
    _auth: Authorized<AdminOnly>,
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    Payload(payload): Payload<UpdateLocationInput>,
) -> AppResult<Json<LocationResponse>> {
    let location = app_state.admin_use_cases.update_location(id, payload).await?;
    Ok(Json(location.into()))
}
