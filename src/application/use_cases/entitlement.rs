use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::AppResult;
use crate::domain::entities::{
    entitlement::{Entitlement, EntitlementStatus},
    product::{Plan, ProductKey},
};

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Clone)]
pub struct GrantEntitlementInput {
    pub account_id: Uuid,
    pub product_key: ProductKey,
    pub plan: Plan,
    pub expires_at: Option<DateTime<Utc>>,
    pub source_ref: String,
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait EntitlementRepoTrait: Send + Sync {
    /// Rows for the account and product whose status is `active` and whose
    /// `expires_at` is unset or still in the future.
    async fn list_active(
        &self,
        account_id: Uuid,
        product_key: ProductKey,
    ) -> AppResult<Vec<Entitlement>>;

    /// Insert or reactivate the row identified by (account, product, source_ref).
    async fn upsert_active(&self, input: &GrantEntitlementInput) -> AppResult<Entitlement>;

    /// Fails with `NotFound` when the id does not exist.
    async fn set_status(&self, id: Uuid, status: EntitlementStatus) -> AppResult<Entitlement>;

    /// Returns the number of rows touched.
    async fn update_by_source_ref(
        &self,
        source_ref: &str,
        status: EntitlementStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<u64>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct EntitlementUseCases {
    repo: Arc<dyn EntitlementRepoTrait>,
}

impl EntitlementUseCases {
    pub fn new(repo: Arc<dyn EntitlementRepoTrait>) -> Self {
        Self { repo }
    }

    /// True iff the account holds at least one active grant for the product.
    ///
    /// Fails closed: a store error is logged and reported as "no entitlement".
    #[instrument(skip(self))]
    pub async fn has_entitlement(&self, account_id: Uuid, product_key: ProductKey) -> bool {
        match self.repo.list_active(account_id, product_key).await {
            Ok(rows) => !rows.is_empty(),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    %account_id,
                    product = %product_key,
                    "Entitlement lookup failed, denying access"
                );
                false
            }
        }
    }

    /// Plan of the account's active grant. Monthly wins when both cadences are active.
    ///
    /// Fails closed like [`Self::has_entitlement`].
    #[instrument(skip(self))]
    pub async fn active_plan(&self, account_id: Uuid, product_key: ProductKey) -> Option<Plan> {
        match self.repo.list_active(account_id, product_key).await {
            Ok(rows) => preferred_plan(&rows),
            Err(err) => {
                tracing::error!(
                    error = %err,
                    %account_id,
                    product = %product_key,
                    "Entitlement lookup failed, denying access"
                );
                None
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn grant(&self, input: &GrantEntitlementInput) -> AppResult<Entitlement> {
        let entitlement = self.repo.upsert_active(input).await?;
        tracing::info!(
            entitlement_id = %entitlement.id,
            account_id = %entitlement.account_id,
            product = %entitlement.product_key,
            plan = %entitlement.plan,
            "Entitlement granted"
        );
        Ok(entitlement)
    }

    #[instrument(skip(self))]
    pub async fn revoke(&self, id: Uuid) -> AppResult<Entitlement> {
        self.repo.set_status(id, EntitlementStatus::Revoked).await
    }

    /// Apply a payment-provider status change to every grant created from `source_ref`.
    #[instrument(skip(self))]
    pub async fn apply_status_change(
        &self,
        source_ref: &str,
        status: EntitlementStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        self.repo
            .update_by_source_ref(source_ref, status, expires_at)
            .await
    }
}

/// Explicit tie-break across several active grants: monthly over one-time.
fn preferred_plan(rows: &[Entitlement]) -> Option<Plan> {
    let now = Utc::now();
    let active = rows.iter().filter(|e| e.grants_access_at(now));
    let mut found = None;
    for row in active {
        match row.plan {
            Plan::Monthly => return Some(Plan::Monthly),
            Plan::Onetime => found = Some(Plan::Onetime),
        }
    }
    found
}
