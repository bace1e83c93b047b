//! Stripe webhook endpoint.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::use_cases::billing::{CompletedCheckout, ReconcileOutcome, SubscriptionChange},
    infra::stripe_client::{StripeClient, StripeWebhookEvent},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/webhook", post(handle_webhook))
}

/// Whether Stripe should redeliver the event.
///
/// Transient failures return 5xx so Stripe retries; anything a retry cannot
/// fix is logged and acknowledged.
fn is_retryable_error(error: &AppError) -> bool {
    match error {
        AppError::Upstream(_) | AppError::Internal(_) | AppError::RateLimited => true,

        AppError::NotFound
        | AppError::InvalidInput(_)
        | AppError::DataRejected(_)
        | AppError::Forbidden
        | AppError::Unauthorized => false,
    }
}

/// POST /api/billing/webhook
/// Verifies the signature over the raw body before anything is parsed.
#[instrument(skip_all)]
async fn handle_webhook(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> AppResult<StatusCode> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidInput("Missing Stripe signature".into()))?;

    StripeClient::verify_webhook_signature(
        &body,
        signature,
        app_state.config.stripe_webhook_secret.expose_secret(),
    )?;

    let event: StripeWebhookEvent = serde_json::from_str(&body)
        .map_err(|e| AppError::InvalidInput(format!("Invalid webhook payload: {e}")))?;

    let event_id = event.id.as_str();
    let event_type = event.event_type.as_str();

    if app_state
        .billing_use_cases
        .is_event_processed(event_id)
        .await?
    {
        tracing::debug!(event_id, event_type, "Webhook event already processed");
        return Ok(StatusCode::OK);
    }

    let outcome = match event_type {
        // Delayed payment methods complete unpaid and settle with a second event.
        "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
            match event.get_checkout_session() {
                Some(session) => {
                    let checkout = CompletedCheckout::from(session);
                    app_state
                        .billing_use_cases
                        .record_checkout_completed(&checkout)
                        .await
                }
                None => Ok(ReconcileOutcome::Ignored("unparseable checkout session")),
            }
        }
        "customer.subscription.updated" | "customer.subscription.deleted" => {
            match event.get_subscription() {
                Some(subscription) => {
                    let change = SubscriptionChange::from(subscription);
                    app_state
                        .billing_use_cases
                        .record_subscription_change(&change)
                        .await
                }
                None => Ok(ReconcileOutcome::Ignored("unparseable subscription")),
            }
        }
        _ => Ok(ReconcileOutcome::Ignored("unhandled event type")),
    };

    match outcome {
        Ok(ReconcileOutcome::Ignored(reason)) => {
            tracing::debug!(event_id, event_type, reason, "Webhook event ignored");
        }
        Ok(outcome) => {
            tracing::info!(event_id, event_type, ?outcome, "Webhook event processed");
        }
        Err(e) if is_retryable_error(&e) => {
            tracing::error!(
                error = %e,
                event_id,
                event_type,
                retryable = true,
                "Webhook processing failed, returning error for Stripe retry"
            );
            return Err(e);
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                event_id,
                event_type,
                retryable = false,
                "Webhook processing failed, acknowledging"
            );
        }
    }

    app_state
        .billing_use_cases
        .mark_event_processed(event_id, event_type)
        .await?;

    Ok(StatusCode::OK)
}
