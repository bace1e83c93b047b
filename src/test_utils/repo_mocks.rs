//! In-memory mock implementations of the repository traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        access::ProfileRepoTrait,
        admin::{LocationRepoTrait, UpdateLocationInput},
        entitlement::{EntitlementRepoTrait, GrantEntitlementInput},
        ops::OrderRepoTrait,
    },
    domain::entities::{
        entitlement::{Entitlement, EntitlementStatus},
        location::Location,
        order::{Order, OrderStatus},
        product::ProductKey,
        profile::{Profile, Role},
    },
};

// ============================================================================
// InMemoryProfileRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryProfileRepo {
    pub profiles: Mutex<HashMap<Uuid, Profile>>,
}

impl InMemoryProfileRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: Mutex::new(profiles.into_iter().map(|p| (p.id, p)).collect()),
        }
    }
}

#[async_trait]
impl ProfileRepoTrait for InMemoryProfileRepo {
    async fn get_by_id(&self, account_id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.profiles.lock().unwrap().get(&account_id).cloned())
    }

    async fn set_role(&self, account_id: Uuid, role: Role) -> AppResult<Profile> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles.get_mut(&account_id).ok_or(AppError::NotFound)?;
        profile.role = role;
        profile.updated_at = Some(Utc::now());
        Ok(profile.clone())
    }

    async fn set_stripe_customer_id(&self, account_id: Uuid, customer_id: &str) -> AppResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        let profile = profiles.get_mut(&account_id).ok_or(AppError::NotFound)?;
        profile.stripe_customer_id = Some(customer_id.to_string());
        Ok(())
    }
}

// ============================================================================
// InMemoryEntitlementRepo
// ============================================================================

/// Mirrors the table's unique (account_id, product_key, source_ref) key.
#[derive(Default)]
pub struct InMemoryEntitlementRepo {
    pub entitlements: Mutex<Vec<Entitlement>>,
}

impl InMemoryEntitlementRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entitlements(entitlements: Vec<Entitlement>) -> Self {
        Self {
            entitlements: Mutex::new(entitlements),
        }
    }

    pub fn insert(&self, entitlement: Entitlement) {
        self.entitlements.lock().unwrap().push(entitlement);
    }

    /// Get all rows regardless of status (for test assertions).
    pub fn get_all(&self) -> Vec<Entitlement> {
        self.entitlements.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntitlementRepoTrait for InMemoryEntitlementRepo {
    async fn list_active(
        &self,
        account_id: Uuid,
        product_key: ProductKey,
    ) -> AppResult<Vec<Entitlement>> {
        Ok(self
            .entitlements
            .lock()
            .unwrap()
            .iter()
            .filter(|e| {
                e.account_id == account_id
                    && e.product_key == product_key
                    && e.grants_access_at(Utc::now())
            })
            .cloned()
            .collect())
    }

    async fn upsert_active(&self, input: &GrantEntitlementInput) -> AppResult<Entitlement> {
        let mut rows = self.entitlements.lock().unwrap();
        let now = Utc::now();

        if let Some(existing) = rows.iter_mut().find(|e| {
            e.account_id == input.account_id
                && e.product_key == input.product_key
                && e.source_ref == input.source_ref
        }) {
            existing.plan = input.plan;
            existing.status = EntitlementStatus::Active;
            existing.expires_at = input.expires_at;
            existing.updated_at = Some(now);
            return Ok(existing.clone());
        }

        let entitlement = Entitlement {
            id: Uuid::new_v4(),
            account_id: input.account_id,
            product_key: input.product_key,
            plan: input.plan,
            status: EntitlementStatus::Active,
            expires_at: input.expires_at,
            source_ref: input.source_ref.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        };
        rows.push(entitlement.clone());
        Ok(entitlement)
    }

    async fn set_status(&self, id: Uuid, status: EntitlementStatus) -> AppResult<Entitlement> {
        let mut rows = self.entitlements.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(AppError::NotFound)?;
        row.status = status;
        row.updated_at = Some(Utc::now());
        Ok(row.clone())
    }

    async fn update_by_source_ref(
        &self,
        source_ref: &str,
        status: EntitlementStatus,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        let mut rows = self.entitlements.lock().unwrap();
        let mut touched = 0;
        for row in rows
            .iter_mut()
            .filter(|e| e.source_ref == source_ref && e.status != EntitlementStatus::Revoked)
        {
            row.status = status;
            if expires_at.is_some() {
                row.expires_at = expires_at;
            }
            row.updated_at = Some(Utc::now());
            touched += 1;
        }
        Ok(touched)
    }
}

/// Every call fails as if the database were unreachable.
pub struct FailingEntitlementRepo;

#[async_trait]
impl EntitlementRepoTrait for FailingEntitlementRepo {
    async fn list_active(&self, _: Uuid, _: ProductKey) -> AppResult<Vec<Entitlement>> {
        Err(AppError::Upstream("connection refused".into()))
    }

    async fn upsert_active(&self, _: &GrantEntitlementInput) -> AppResult<Entitlement> {
        Err(AppError::Upstream("connection refused".into()))
    }

    async fn set_status(&self, _: Uuid, _: EntitlementStatus) -> AppResult<Entitlement> {
        Err(AppError::Upstream("connection refused".into()))
    }

    async fn update_by_source_ref(
        &self,
        _: &str,
        _: EntitlementStatus,
        _: Option<DateTime<Utc>>,
    ) -> AppResult<u64> {
        Err(AppError::Upstream("connection refused".into()))
    }
}

// ============================================================================
// InMemoryOrderRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryOrderRepo {
    pub orders: Mutex<HashMap<Uuid, Order>>,
}

impl InMemoryOrderRepo {
    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: Mutex::new(orders.into_iter().map(|o| (o.id, o)).collect()),
        }
    }
}

#[async_trait]
impl OrderRepoTrait for InMemoryOrderRepo {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn set_status(&self, id: Uuid, status: OrderStatus) -> AppResult<Option<Order>> {
        let mut orders = self.orders.lock().unwrap();
        let Some(order) = orders
            .get_mut(&id)
            .filter(|o| o.status.can_transition_to(status))
        else {
            return Ok(None);
        };
        order.status = status;
        order.updated_at = Some(Utc::now());
        Ok(Some(order.clone()))
    }
}

// ============================================================================
// InMemoryLocationRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryLocationRepo {
    pub locations: Mutex<HashMap<Uuid, Location>>,
}

impl InMemoryLocationRepo {
    pub fn with_locations(locations: Vec<Location>) -> Self {
        Self {
            locations: Mutex::new(locations.into_iter().map(|l| (l.id, l)).collect()),
        }
    }
}

#[async_trait]
impl LocationRepoTrait for InMemoryLocationRepo {
    async fn update(&self, id: Uuid, input: &UpdateLocationInput) -> AppResult<Location> {
        let mut locations = self.locations.lock().unwrap();
        let location = locations.get_mut(&id).ok_or(AppError::NotFound)?;
        if let Some(name) = &input.name {
            location.name = name.clone();
        }
        if let Some(email) = &input.contact_email {
            location.contact_email = Some(email.clone()).filter(|e| !e.is_empty());
        }
        if let Some(phone) = &input.phone {
            location.phone = Some(phone.clone()).filter(|p| !p.is_empty());
        }
        if let Some(published) = input.is_published {
            location.is_published = published;
        }
        location.updated_at = Some(Utc::now());
        Ok(location.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::product::Plan;
    use crate::test_utils::create_test_entitlement;

    fn grant(account_id: Uuid, source_ref: &str) -> GrantEntitlementInput {
        GrantEntitlementInput {
            account_id,
            product_key: ProductKey::QrStudio,
            plan: Plan::Onetime,
            expires_at: None,
            source_ref: source_ref.to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_reactivates_same_key() {
        let repo = InMemoryEntitlementRepo::new();
        let account_id = Uuid::new_v4();

        let first = repo.upsert_active(&grant(account_id, "cs_1")).await.unwrap();
        repo.set_status(first.id, EntitlementStatus::Canceled)
            .await
            .unwrap();
        let second = repo.upsert_active(&grant(account_id, "cs_1")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.status, EntitlementStatus::Active);
        assert_eq!(repo.get_all().len(), 1);
    }

    #[tokio::test]
    async fn test_update_by_source_ref_skips_revoked() {
        let account_id = Uuid::new_v4();
        let repo = InMemoryEntitlementRepo::with_entitlements(vec![create_test_entitlement(
            account_id,
            ProductKey::PresenceBasic,
            |e| {
                e.source_ref = "sub_1".into();
                e.status = EntitlementStatus::Revoked;
            },
        )]);

        let touched = repo
            .update_by_source_ref("sub_1", EntitlementStatus::Active, None)
            .await
            .unwrap();
        assert_eq!(touched, 0);
    }

    #[tokio::test]
    async fn test_order_set_status_refuses_terminal_rows() {
        let order = crate::test_utils::create_test_order(|o| o.status = OrderStatus::Canceled);
        let repo = InMemoryOrderRepo::with_orders(vec![order.clone()]);

        let written = repo
            .set_status(order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert!(written.is_none());
        assert_eq!(
            repo.get_by_id(order.id).await.unwrap().unwrap().status,
            OrderStatus::Canceled
        );
        assert!(
            repo.set_status(Uuid::new_v4(), OrderStatus::Ready)
                .await
                .unwrap()
                .is_none()
        );
    }
}
