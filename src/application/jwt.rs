use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};

/// Claims of an access token issued by the hosted auth provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String, // account id
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub email: Option<String>,
}

impl AccessClaims {
    pub fn account_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Unauthorized)
    }
}

/// Verify an HS256 access token signed with the provider's shared secret.
///
/// Every failure (bad signature, expired, wrong audience, garbage) is
/// reported as `Unauthorized`; the reason is only logged.
pub fn verify_access_token(
    token: &str,
    secret: &SecretString,
    audience: &str,
) -> AppResult<AccessClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[audience]);

    decode::<AccessClaims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Access token rejected");
        AppError::Unauthorized
    })
}
