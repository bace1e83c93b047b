//! Billing-side test doubles: processed event store, payment gateway, rate limiter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{CheckoutSession, CheckoutSessionRequest, PaymentGateway},
        use_cases::billing::StripeEventRepoTrait,
    },
};

// ============================================================================
// InMemoryStripeEventRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryStripeEventRepo {
    pub events: Mutex<HashMap<String, String>>,
}

impl InMemoryStripeEventRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StripeEventRepoTrait for InMemoryStripeEventRepo {
    async fn exists(&self, stripe_event_id: &str) -> AppResult<bool> {
        Ok(self.events.lock().unwrap().contains_key(stripe_event_id))
    }

    async fn record(&self, stripe_event_id: &str, event_type: &str) -> AppResult<()> {
        self.events
            .lock()
            .unwrap()
            .entry(stripe_event_id.to_string())
            .or_insert_with(|| event_type.to_string());
        Ok(())
    }
}

// ============================================================================
// RecordingPaymentGateway
// ============================================================================

/// Payment gateway that records every call and returns fake hosted URLs.
/// Replaying a checkout reference with another price is rejected.
#[derive(Default)]
pub struct RecordingPaymentGateway {
    checkouts: Mutex<Vec<CheckoutSessionRequest>>,
    portals: Mutex<Vec<(String, String)>>,
    customers: AtomicUsize,
}

impl RecordingPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checkout_requests(&self) -> Vec<CheckoutSessionRequest> {
        self.checkouts.lock().unwrap().clone()
    }

    /// (customer_id, return_url) pairs.
    pub fn portal_requests(&self) -> Vec<(String, String)> {
        self.portals.lock().unwrap().clone()
    }

    pub fn customers_created(&self) -> usize {
        self.customers.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for RecordingPaymentGateway {
    async fn create_customer(&self, _account_id: Uuid, _email: Option<&str>) -> AppResult<String> {
        self.customers.fetch_add(1, Ordering::SeqCst);
        Ok(format!("cus_test{}", Uuid::new_v4().simple()))
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        let mut checkouts = self.checkouts.lock().unwrap();
        // Stripe refuses an idempotency key replayed with different parameters.
        if checkouts
            .iter()
            .any(|c| c.reference == request.reference && c.price_id != request.price_id)
        {
            return Err(AppError::DataRejected(
                "Keys for idempotent requests can only be used with the same parameters they were first used with".into(),
            ));
        }
        checkouts.push(request.clone());
        let id = format!("cs_test_{}", checkouts.len());
        Ok(CheckoutSession {
            url: format!("https://checkout.stripe.test/{id}"),
            id,
        })
    }

    async fn create_portal_session(&self, customer_id: &str, return_url: &str) -> AppResult<String> {
        self.portals
            .lock()
            .unwrap()
            .push((customer_id.to_string(), return_url.to_string()));
        Ok(format!("https://billing.stripe.test/p/{customer_id}"))
    }
}

// ============================================================================
// InMemoryRateLimiter
// ============================================================================

/// In-memory rate limiter for testing. Counts requests per IP without expiry.
pub struct InMemoryRateLimiter {
    counts: Mutex<HashMap<String, u64>>,
    max_per_ip: u64,
}

impl InMemoryRateLimiter {
    pub fn new(max_per_ip: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            max_per_ip,
        }
    }

    /// Create a permissive rate limiter that never blocks (for most tests).
    pub fn permissive() -> Self {
        Self::new(u64::MAX)
    }
}

#[async_trait]
impl crate::infra::RateLimiterTrait for InMemoryRateLimiter {
    async fn check(&self, ip: &str) -> AppResult<()> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(format!("rate:ip:{ip}")).or_insert(0);
        *count += 1;
        if *count > self.max_per_ip {
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}
