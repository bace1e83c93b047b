use std::collections::HashMap;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{CheckoutSession, CheckoutSessionRequest, PaymentGateway},
        use_cases::billing::{CompletedCheckout, SubscriptionChange},
    },
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Maximum age of a signed webhook payload, in seconds.
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
}

impl StripeClient {
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            secret_key,
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        params: &[(String, String)],
        idempotency_key: Option<&str>,
    ) -> AppResult<T> {
        let mut request = self
            .client
            .post(format!("{}/{}", STRIPE_API_BASE, path))
            .header("Authorization", self.auth_header())
            .form(params);

        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Webhook Signature Verification
    // ========================================================================

    /// Verify a `Stripe-Signature` header (`t=...,v1=...`) against the raw body.
    pub fn verify_webhook_signature(
        payload: &str,
        signature_header: &str,
        webhook_secret: &str,
    ) -> AppResult<()> {
        Self::verify_webhook_signature_at(
            payload,
            signature_header,
            webhook_secret,
            chrono::Utc::now().timestamp(),
        )
    }

    pub fn verify_webhook_signature_at(
        payload: &str,
        signature_header: &str,
        webhook_secret: &str,
        now: i64,
    ) -> AppResult<()> {
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| AppError::InvalidInput("Missing timestamp in signature".into()))?;

        if signatures.is_empty() {
            return Err(AppError::InvalidInput("Missing signature".into()));
        }

        let expected = compute_webhook_signature(timestamp, payload, webhook_secret)?;

        if !signatures
            .iter()
            .any(|sig| constant_time_compare(sig, &expected))
        {
            return Err(AppError::InvalidInput("Invalid signature".into()));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| AppError::InvalidInput("Invalid timestamp".into()))?;
        if (now - ts).abs() > WEBHOOK_TOLERANCE_SECS {
            return Err(AppError::InvalidInput("Timestamp too old".into()));
        }

        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read Stripe response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");
            return Err(stripe_error_to_app_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            AppError::Internal(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

/// Idempotency conflicts and card declines are caused by the request and come
/// back as 400. Anything else Stripe rejects is our fault or theirs.
fn stripe_error_to_app_error(status: reqwest::StatusCode, body: &str) -> AppError {
    let Ok(StripeErrorResponse { error }) = serde_json::from_str::<StripeErrorResponse>(body)
    else {
        return AppError::Upstream(format!("Stripe API error: {}", status));
    };

    let message = error.message.unwrap_or_else(|| error.error_type.clone());
    match error.error_type.as_str() {
        "idempotency_error" | "card_error" if status.is_client_error() => {
            AppError::DataRejected(message)
        }
        _ => AppError::Upstream(format!("Stripe error: {}", message)),
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_customer(&self, account_id: Uuid, email: Option<&str>) -> AppResult<String> {
        let mut params = vec![("metadata[account_id]".to_string(), account_id.to_string())];
        if let Some(email) = email {
            params.push(("email".to_string(), email.to_string()));
        }

        let customer: StripeCustomer = self
            .post_form("customers", &params, Some(&format!("customer:{account_id}")))
            .await?;
        Ok(customer.id)
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        let session: StripeCheckoutSession = self
            .post_form(
                "checkout/sessions",
                &checkout_session_params(request),
                Some(&request.reference),
            )
            .await?;

        let url = session
            .url
            .ok_or_else(|| AppError::Upstream("Stripe returned a session without a URL".into()))?;
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> AppResult<String> {
        let params = vec![
            ("customer".to_string(), customer_id.to_string()),
            ("return_url".to_string(), return_url.to_string()),
        ];
        let session: StripePortalSession = self
            .post_form("billing_portal/sessions", &params, None)
            .await?;
        Ok(session.url)
    }
}

/// Form body for `POST /v1/checkout/sessions`. Metadata is what the webhook reads back.
fn checkout_session_params(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = vec![
        ("customer".into(), request.customer_id.clone()),
        ("mode".into(), request.plan.checkout_mode().into()),
        ("line_items[0][price]".into(), request.price_id.clone()),
        ("line_items[0][quantity]".into(), "1".into()),
        ("success_url".into(), request.success_url.clone()),
        ("cancel_url".into(), request.cancel_url.clone()),
        ("client_reference_id".into(), request.reference.clone()),
    ];

    let metadata = [
        ("account_id", request.account_id.to_string()),
        ("price_id", request.price_id.clone()),
        ("product_key", request.product.as_str().to_string()),
        ("plan", request.plan.as_str().to_string()),
    ];
    for (key, value) in &metadata {
        params.push((format!("metadata[{key}]"), value.clone()));
    }
    if request.plan.is_recurring() {
        for (key, value) in &metadata {
            params.push((format!("subscription_data[metadata][{key}]"), value.clone()));
        }
    }
    params
}

/// Hex HMAC-SHA256 of `{timestamp}.{payload}`, as Stripe computes `v1`.
pub fn compute_webhook_signature(
    timestamp: &str,
    payload: &str,
    webhook_secret: &str,
) -> AppResult<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(webhook_secret.as_bytes())
        .map_err(|_| AppError::Internal("HMAC error".into()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

// ============================================================================
// Stripe Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub client_reference_id: Option<String>,
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl From<StripeCheckoutSession> for CompletedCheckout {
    fn from(mut session: StripeCheckoutSession) -> Self {
        CompletedCheckout {
            account_id: session.metadata.remove("account_id"),
            price_id: session.metadata.remove("price_id"),
            session_id: session.id,
            client_reference_id: session.client_reference_id,
            subscription_id: session.subscription,
            payment_status: session.payment_status,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StripePortalSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub status: String,
    pub current_period_end: Option<i64>,
}

impl From<StripeSubscription> for SubscriptionChange {
    fn from(sub: StripeSubscription) -> Self {
        SubscriptionChange {
            subscription_id: sub.id,
            status: sub.status,
            current_period_end: sub.current_period_end,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeError,
}

#[derive(Debug, Deserialize)]
pub struct StripeError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: Option<String>,
}

// ============================================================================
// Webhook Event Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeWebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeWebhookEventData {
    pub object: serde_json::Value,
}

impl StripeWebhookEvent {
    pub fn get_checkout_session(&self) -> Option<StripeCheckoutSession> {
        serde_json::from_value(self.data.object.clone()).ok()
    }

    pub fn get_subscription(&self) -> Option<StripeSubscription> {
        serde_json::from_value(self.data.object.clone()).ok()
    }
}
