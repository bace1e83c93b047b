use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;
use url::Url;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{CheckoutSession, CheckoutSessionRequest, PaymentGateway},
        pricing::PriceRegistry,
        use_cases::{
            access::ProfileRepoTrait,
            entitlement::{EntitlementUseCases, GrantEntitlementInput},
        },
        validators::is_valid_idempotency_key,
    },
    domain::entities::{
        entitlement::{Entitlement, EntitlementStatus},
        product::{Plan, PresenceTier, ProductFamily, ProductKey},
    },
};

const CHECKOUT_REF_PREFIX: &str = "checkout";

// ============================================================================
// Inputs
// ============================================================================

/// Body of a checkout request. `tier` is required for presence and rejected for qr.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutInput {
    pub kind: ProductFamily,
    #[serde(default)]
    pub tier: Option<PresenceTier>,
    pub plan: Plan,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl CheckoutInput {
    pub fn product(&self) -> AppResult<ProductKey> {
        match (self.kind, self.tier) {
            (ProductFamily::Presence, Some(tier)) => Ok(tier.product()),
            (ProductFamily::Presence, None) => Err(AppError::InvalidInput(
                "tier is required for presence checkout".into(),
            )),
            (ProductFamily::Qr, None) => Ok(ProductKey::QrStudio),
            (ProductFamily::Qr, Some(_)) => Err(AppError::InvalidInput(
                "tier is not accepted for qr checkout".into(),
            )),
        }
    }
}

/// The parts of a completed Checkout Session that reconciliation reads.
#[derive(Debug, Clone, Default)]
pub struct CompletedCheckout {
    pub session_id: String,
    pub client_reference_id: Option<String>,
    /// `metadata.account_id` set when the session was created.
    pub account_id: Option<String>,
    /// `metadata.price_id` set when the session was created.
    pub price_id: Option<String>,
    pub subscription_id: Option<String>,
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SubscriptionChange {
    pub subscription_id: String,
    pub status: String,
    pub current_period_end: Option<i64>,
}

#[derive(Debug)]
pub enum ReconcileOutcome {
    Granted(Entitlement),
    Updated(u64),
    /// Nothing to do; the event is still acknowledged.
    Ignored(&'static str),
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait StripeEventRepoTrait: Send + Sync {
    async fn exists(&self, stripe_event_id: &str) -> AppResult<bool>;
    /// Recording an id twice is a no-op.
    async fn record(&self, stripe_event_id: &str, event_type: &str) -> AppResult<()>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct BillingUseCases {
    prices: Arc<PriceRegistry>,
    profile_repo: Arc<dyn ProfileRepoTrait>,
    event_repo: Arc<dyn StripeEventRepoTrait>,
    gateway: Arc<dyn PaymentGateway>,
    entitlements: EntitlementUseCases,
    app_origin: Url,
}

impl BillingUseCases {
    pub fn new(
        prices: Arc<PriceRegistry>,
        profile_repo: Arc<dyn ProfileRepoTrait>,
        event_repo: Arc<dyn StripeEventRepoTrait>,
        gateway: Arc<dyn PaymentGateway>,
        entitlements: EntitlementUseCases,
        app_origin: Url,
    ) -> Self {
        Self {
            prices,
            profile_repo,
            event_repo,
            gateway,
            entitlements,
            app_origin,
        }
    }

    pub fn prices(&self) -> &PriceRegistry {
        &self.prices
    }

    // ========================================================================
    // Checkout & Portal
    // ========================================================================

    /// Open a hosted checkout page for the caller.
    ///
    /// The same caller token always yields the same reference, so a retried
    /// request collides at Stripe instead of creating a second session.
    #[instrument(skip(self, email, input), fields(kind = input.kind.as_str(), plan = %input.plan))]
    pub async fn start_checkout(
        &self,
        account_id: Uuid,
        email: Option<&str>,
        input: CheckoutInput,
    ) -> AppResult<CheckoutSession> {
        let product = input.product()?;
        let token = match input.idempotency_key.as_deref().map(str::trim) {
            Some(key) if is_valid_idempotency_key(key) => key.to_string(),
            Some(_) => {
                return Err(AppError::InvalidInput(
                    "idempotency_key must be 1-128 characters of letters, digits, '-' or '_'"
                        .into(),
                ));
            }
            None => generate_checkout_token(),
        };

        let price_id = self
            .prices
            .price_for(product, input.plan)
            .ok_or_else(|| {
                AppError::Internal(format!("No price configured for {product} {}", input.plan))
            })?
            .to_string();

        let customer_id = self.ensure_customer(account_id, email).await?;

        let request = CheckoutSessionRequest {
            customer_id,
            price_id,
            product,
            plan: input.plan,
            success_url: self.return_url(input.kind, Some(("checkout", "success")))?,
            cancel_url: self.return_url(input.kind, Some(("checkout", "canceled")))?,
            reference: checkout_reference(account_id, input.kind, &token),
            account_id,
        };

        let session = self.gateway.create_checkout_session(&request).await?;
        tracing::info!(
            %account_id,
            session_id = %session.id,
            reference = %request.reference,
            "Checkout session created"
        );
        Ok(session)
    }

    /// Portal URL for the caller's Stripe customer. Accounts that never
    /// started a checkout have no customer and get `NotFound`.
    #[instrument(skip(self))]
    pub async fn open_portal(&self, account_id: Uuid, kind: ProductFamily) -> AppResult<String> {
        let customer_id = self
            .profile_repo
            .get_by_id(account_id)
            .await?
            .and_then(|p| p.stripe_customer_id)
            .ok_or(AppError::NotFound)?;

        let return_url = self.return_url(kind, None)?;
        self.gateway
            .create_portal_session(&customer_id, &return_url)
            .await
    }

    /// Stripe customer stored on the profile, created on first use.
    async fn ensure_customer(&self, account_id: Uuid, email: Option<&str>) -> AppResult<String> {
        let profile = self
            .profile_repo
            .get_by_id(account_id)
            .await?
            .ok_or(AppError::Forbidden)?;

        if let Some(customer_id) = profile.stripe_customer_id {
            return Ok(customer_id);
        }

        let email = email.or(profile.email.as_deref());
        let customer_id = self.gateway.create_customer(account_id, email).await?;
        self.profile_repo
            .set_stripe_customer_id(account_id, &customer_id)
            .await?;

        tracing::info!(%account_id, %customer_id, "Stripe customer created");
        Ok(customer_id)
    }

    fn return_url(&self, kind: ProductFamily, query: Option<(&str, &str)>) -> AppResult<String> {
        let mut url = self
            .app_origin
            .join(kind.billing_path())
            .map_err(|e| AppError::Internal(format!("Invalid return URL: {e}")))?;
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, value);
        }
        Ok(url.to_string())
    }

    // ========================================================================
    // Webhook Reconciliation
    // ========================================================================

    pub async fn is_event_processed(&self, stripe_event_id: &str) -> AppResult<bool> {
        self.event_repo.exists(stripe_event_id).await
    }

    pub async fn mark_event_processed(
        &self,
        stripe_event_id: &str,
        event_type: &str,
    ) -> AppResult<()> {
        self.event_repo.record(stripe_event_id, event_type).await
    }

    /// Turn a paid checkout into an active entitlement.
    ///
    /// The product comes only from the registry; a price id it does not know
    /// grants nothing.
    #[instrument(skip(self, checkout), fields(session_id = %checkout.session_id))]
    pub async fn record_checkout_completed(
        &self,
        checkout: &CompletedCheckout,
    ) -> AppResult<ReconcileOutcome> {
        match checkout.payment_status.as_deref() {
            Some("paid") | Some("no_payment_required") => {}
            other => {
                tracing::info!(payment_status = ?other, "Checkout not paid yet, skipping");
                return Ok(ReconcileOutcome::Ignored("payment not settled"));
            }
        }

        let Some(price_id) = checkout.price_id.as_deref() else {
            tracing::warn!("Checkout session without price_id metadata");
            return Ok(ReconcileOutcome::Ignored("missing price"));
        };

        let Some(priced) = self.prices.resolve(price_id) else {
            tracing::error!(
                price_id,
                "Unknown price id on completed checkout, no entitlement granted"
            );
            return Ok(ReconcileOutcome::Ignored("unknown price"));
        };

        let account_id = checkout
            .account_id
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
            .or_else(|| {
                checkout
                    .client_reference_id
                    .as_deref()
                    .and_then(parse_checkout_reference)
            });
        let Some(account_id) = account_id else {
            tracing::warn!(
                client_reference_id = ?checkout.client_reference_id,
                "Checkout session without a resolvable account"
            );
            return Ok(ReconcileOutcome::Ignored("missing account"));
        };

        let source_ref = match priced.plan {
            Plan::Monthly => match checkout.subscription_id.as_deref() {
                Some(sub_id) => sub_id.to_string(),
                None => {
                    tracing::warn!(price_id, "Monthly checkout without subscription id");
                    return Ok(ReconcileOutcome::Ignored("missing subscription"));
                }
            },
            Plan::Onetime => checkout.session_id.clone(),
        };

        let entitlement = self
            .entitlements
            .grant(&GrantEntitlementInput {
                account_id,
                product_key: priced.product,
                plan: priced.plan,
                expires_at: None,
                source_ref,
            })
            .await?;

        Ok(ReconcileOutcome::Granted(entitlement))
    }

    /// Mirror a subscription's status and period end onto the grants it created.
    #[instrument(skip(self, change), fields(subscription_id = %change.subscription_id))]
    pub async fn record_subscription_change(
        &self,
        change: &SubscriptionChange,
    ) -> AppResult<ReconcileOutcome> {
        let status = EntitlementStatus::from_stripe(&change.status);
        let expires_at = change
            .current_period_end
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

        let rows = self
            .entitlements
            .apply_status_change(&change.subscription_id, status, expires_at)
            .await?;

        if rows == 0 {
            tracing::debug!(
                stripe_status = %change.status,
                "No entitlement for subscription, nothing to update"
            );
            return Ok(ReconcileOutcome::Ignored("no matching entitlement"));
        }

        tracing::info!(
            stripe_status = %change.status,
            status = status.as_str(),
            rows,
            "Entitlements updated from subscription"
        );
        Ok(ReconcileOutcome::Updated(rows))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `checkout:{account_id}:{kind}:{token}`, used as both the Stripe
/// idempotency key and `client_reference_id`.
pub fn checkout_reference(account_id: Uuid, kind: ProductFamily, token: &str) -> String {
    format!(
        "{CHECKOUT_REF_PREFIX}:{account_id}:{}:{token}",
        kind.as_str()
    )
}

/// Account id embedded in a reference built by [`checkout_reference`].
pub fn parse_checkout_reference(reference: &str) -> Option<Uuid> {
    let mut parts = reference.splitn(4, ':');
    if parts.next()? != CHECKOUT_REF_PREFIX {
        return None;
    }
    Uuid::parse_str(parts.next()?).ok()
}

fn generate_checkout_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
