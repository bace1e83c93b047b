use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        use_cases::{
            access::ProfileRepoTrait,
            entitlement::{EntitlementUseCases, GrantEntitlementInput},
        },
        validators::{MAX_LOCATION_NAME_LEN, is_valid_email, is_valid_phone},
    },
    domain::entities::{
        entitlement::Entitlement,
        location::Location,
        product::{Plan, ProductKey},
        profile::{Profile, Role},
    },
};

// ============================================================================
// Inputs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ManualGrantInput {
    pub account_id: Uuid,
    pub product_key: ProductKey,
    pub plan: Plan,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Partial update of a location. Absent fields are left untouched; an empty
/// `contact_email` or `phone` clears the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLocationInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_published: Option<bool>,
}

impl UpdateLocationInput {
    /// Trim text fields and reject anything the listing cannot store.
    pub fn normalized(self) -> AppResult<Self> {
        let name = match self.name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(AppError::InvalidInput("name must not be empty".into()));
                }
                if name.chars().count() > MAX_LOCATION_NAME_LEN {
                    return Err(AppError::InvalidInput(format!(
                        "name must be at most {MAX_LOCATION_NAME_LEN} characters"
                    )));
                }
                Some(name)
            }
            None => None,
        };

        let contact_email = match self.contact_email {
            Some(email) if email.trim().is_empty() => Some(String::new()),
            Some(email) if !is_valid_email(&email) => {
                return Err(AppError::InvalidInput("contact_email is not valid".into()));
            }
            Some(email) => Some(email.trim().to_lowercase()),
            None => None,
        };

        let phone = match self.phone {
            Some(phone) if phone.trim().is_empty() => Some(String::new()),
            Some(phone) if !is_valid_phone(&phone) => {
                return Err(AppError::InvalidInput("phone is not valid".into()));
            }
            Some(phone) => Some(phone.trim().to_string()),
            None => None,
        };

        let input = Self {
            name,
            contact_email,
            phone,
            is_published: self.is_published,
        };

        if input.is_empty() {
            return Err(AppError::InvalidInput("no fields to update".into()));
        }

        Ok(input)
    }

    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.contact_email.is_none()
            && self.phone.is_none()
            && self.is_published.is_none()
    }
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait LocationRepoTrait: Send + Sync {
    /// Fails with `NotFound` when the id does not exist.
    async fn update(&self, id: Uuid, input: &UpdateLocationInput) -> AppResult<Location>;
}

// ============================================================================
// Use Cases
// ============================================================================

/// Mutations reserved for administrators. Callers must already be authorized.
#[derive(Clone)]
pub struct AdminUseCases {
    profile_repo: Arc<dyn ProfileRepoTrait>,
    location_repo: Arc<dyn LocationRepoTrait>,
    entitlements: EntitlementUseCases,
}

impl AdminUseCases {
    pub fn new(
        profile_repo: Arc<dyn ProfileRepoTrait>,
        location_repo: Arc<dyn LocationRepoTrait>,
        entitlements: EntitlementUseCases,
    ) -> Self {
        Self {
            profile_repo,
            location_repo,
            entitlements,
        }
    }

    #[instrument(skip(self))]
    pub async fn set_role(&self, actor_id: Uuid, target_id: Uuid, role: Role) -> AppResult<Profile> {
        if actor_id == target_id && role != Role::Admin {
            return Err(AppError::InvalidInput(
                "administrators cannot demote themselves".into(),
            ));
        }

        let profile = self.profile_repo.set_role(target_id, role).await?;
        tracing::info!(%actor_id, %target_id, role = %role, "Role changed");
        Ok(profile)
    }

    /// Grant a product outside of Stripe. Granting twice reactivates the same row.
    #[instrument(skip(self))]
    pub async fn grant_entitlement(
        &self,
        actor_id: Uuid,
        input: ManualGrantInput,
    ) -> AppResult<Entitlement> {
        if let Some(expires_at) = input.expires_at {
            if expires_at <= Utc::now() {
                return Err(AppError::InvalidInput(
                    "expires_at must be in the future".into(),
                ));
            }
        }

        self.entitlements
            .grant(&GrantEntitlementInput {
                account_id: input.account_id,
                product_key: input.product_key,
                plan: input.plan,
                expires_at: input.expires_at,
                source_ref: manual_grant_ref(actor_id),
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn revoke_entitlement(&self, actor_id: Uuid, id: Uuid) -> AppResult<Entitlement> {
        let entitlement = self.entitlements.revoke(id).await?;
        tracing::info!(%actor_id, entitlement_id = %id, "Entitlement revoked");
        Ok(entitlement)
    }

    #[instrument(skip(self))]
    pub async fn update_location(
        &self,
        id: Uuid,
        input: UpdateLocationInput,
    ) -> AppResult<Location> {
        let input = input.normalized()?;
        self.location_repo.update(id, &input).await
    }
}

/// `source_ref` recorded on grants made by an administrator.
pub fn manual_grant_ref(actor_id: Uuid) -> String {
    format!("admin:{actor_id}")
}
