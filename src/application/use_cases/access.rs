use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::domain::entities::profile::{Profile, Role};

pub const ADMIN_ROLES: &[Role] = &[Role::Admin];
pub const OPS_ROLES: &[Role] = &[Role::Admin, Role::Staff];

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait ProfileRepoTrait: Send + Sync {
    async fn get_by_id(&self, account_id: Uuid) -> AppResult<Option<Profile>>;
    /// Fails with `NotFound` when no profile exists for the account.
    async fn set_role(&self, account_id: Uuid, role: Role) -> AppResult<Profile>;
    async fn set_stripe_customer_id(&self, account_id: Uuid, customer_id: &str) -> AppResult<()>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct AccessUseCases {
    profile_repo: Arc<dyn ProfileRepoTrait>,
}

impl AccessUseCases {
    pub fn new(profile_repo: Arc<dyn ProfileRepoTrait>) -> Self {
        Self { profile_repo }
    }

    /// Load the caller's role and check it against the roles a handler accepts.
    /// An account without a profile row has no role and is rejected.
    #[instrument(skip(self))]
    pub async fn require_role(&self, account_id: Uuid, allowed: &[Role]) -> AppResult<Role> {
        let Some(profile) = self.profile_repo.get_by_id(account_id).await? else {
            tracing::warn!(%account_id, "No profile for authenticated account");
            return Err(AppError::Forbidden);
        };

        if !allowed.contains(&profile.role) {
            tracing::warn!(%account_id, role = %profile.role, "Role not permitted");
            return Err(AppError::Forbidden);
        }

        Ok(profile.role)
    }
}
