//! Request extractors for the role-gated handlers.
//!
//! Extraction order in a handler signature is the check order: bearer token
//! (401), then role (403), then body (400).

use std::marker::PhantomData;

use axum::{
    Form, Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::CONTENT_TYPE, request::Parts},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::{
        jwt,
        use_cases::access::{ADMIN_ROLES, OPS_ROLES},
    },
    domain::entities::profile::Role,
};

/// Caller identified by a valid access token.
#[derive(Debug, Clone)]
pub struct AuthenticatedAccount {
    pub account_id: Uuid,
    pub email: Option<String>,
}

impl FromRequestParts<AppState> for AuthenticatedAccount {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::Unauthorized)?;

        let claims = jwt::verify_access_token(
            bearer.token(),
            &state.config.auth_jwt_secret,
            &state.config.auth_audience,
        )?;

        Ok(Self {
            account_id: claims.account_id()?,
            email: claims.email,
        })
    }
}

/// Set of roles a handler accepts.
pub trait RoleGate: Send + Sync + 'static {
    const ALLOWED: &'static [Role];
}

pub struct AdminOnly;

impl RoleGate for AdminOnly {
    const ALLOWED: &'static [Role] = ADMIN_ROLES;
}

/// Admins and staff.
pub struct OpsStaff;

impl RoleGate for OpsStaff {
    const ALLOWED: &'static [Role] = OPS_ROLES;
}

/// Authenticated caller whose profile role is in `G::ALLOWED`.
pub struct Authorized<G: RoleGate> {
    pub account: AuthenticatedAccount,
    pub role: Role,
    _gate: PhantomData<G>,
}

impl<G: RoleGate> FromRequestParts<AppState> for Authorized<G> {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        let account = AuthenticatedAccount::from_request_parts(parts, state).await?;
        let role = state
            .access_use_cases
            .require_role(account.account_id, G::ALLOWED)
            .await?;

        Ok(Self {
            account,
            role,
            _gate: PhantomData,
        })
    }
}

/// Body accepted as JSON or as `application/x-www-form-urlencoded`.
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidInput(e.body_text()))?;
            Ok(Payload(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::InvalidInput(e.body_text()))?;
            Ok(Payload(value))
        }
    }
}
