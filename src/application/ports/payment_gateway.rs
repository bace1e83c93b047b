use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    domain::entities::product::{Plan, ProductKey},
};

/// Everything the payment provider needs to open a hosted checkout page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub customer_id: String,
    pub price_id: String,
    pub product: ProductKey,
    pub plan: Plan,
    pub success_url: String,
    pub cancel_url: String,
    /// Derived from the caller's idempotency token; also sent as the
    /// provider's idempotency key and as `client_reference_id`.
    pub reference: String,
    pub account_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Payment provider operations used by checkout and portal.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_customer(&self, account_id: Uuid, email: Option<&str>) -> AppResult<String>;

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession>;

    /// Returns the portal URL.
    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> AppResult<String>;
}
