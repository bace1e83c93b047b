//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use crate::{
    application::{jwt::AccessClaims, pricing::PriceRegistry},
    domain::entities::{
        entitlement::{Entitlement, EntitlementStatus},
        location::Location,
        order::{Order, OrderStatus},
        product::{Plan, ProductKey},
        profile::{Profile, Role},
    },
};

use super::{TEST_AUTH_AUDIENCE, TEST_AUTH_SECRET};

/// Create a test profile with sensible defaults (plain user, no Stripe customer).
pub fn create_test_profile(overrides: impl FnOnce(&mut Profile)) -> Profile {
    let id = Uuid::new_v4();
    let mut profile = Profile {
        id,
        email: Some(format!("user-{}@example.com", id.simple())),
        role: Role::User,
        stripe_customer_id: None,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut profile);
    profile
}

/// Create an active monthly entitlement with a unique `source_ref`.
pub fn create_test_entitlement(
    account_id: Uuid,
    product_key: ProductKey,
    overrides: impl FnOnce(&mut Entitlement),
) -> Entitlement {
    let mut entitlement = Entitlement {
        id: Uuid::new_v4(),
        account_id,
        product_key,
        plan: Plan::Monthly,
        status: EntitlementStatus::Active,
        expires_at: None,
        source_ref: format!("sub_test{}", Uuid::new_v4().simple()),
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut entitlement);
    entitlement
}

/// Create a pending order at a random location.
pub fn create_test_order(overrides: impl FnOnce(&mut Order)) -> Order {
    let mut order = Order {
        id: Uuid::new_v4(),
        location_id: Uuid::new_v4(),
        status: OrderStatus::Pending,
        customer_name: Some("Sam Taylor".to_string()),
        total_cents: 1250,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut order);
    order
}

pub fn create_test_location(overrides: impl FnOnce(&mut Location)) -> Location {
    let mut location = Location {
        id: Uuid::new_v4(),
        name: "Main Street Bakery".to_string(),
        contact_email: Some("hello@bakery.example".to_string()),
        phone: Some("+1 555 010 2030".to_string()),
        is_published: false,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut location);
    location
}

/// Sign an access token the way the auth provider does (HS256).
/// A negative `ttl_secs` yields an already expired token.
pub fn issue_test_token(account_id: Uuid, secret: &str, audience: &str, ttl_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = AccessClaims {
        sub: account_id.to_string(),
        aud: audience.to_string(),
        exp: now + ttl_secs,
        iat: now,
        email: Some(format!("user-{}@example.com", account_id.simple())),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// `Authorization` header value accepted by `TestAppStateBuilder` states.
pub fn bearer_for(account_id: Uuid) -> String {
    format!(
        "Bearer {}",
        issue_test_token(account_id, TEST_AUTH_SECRET, TEST_AUTH_AUDIENCE, 3600)
    )
}

/// Registry where every slot's price id is `price_` + the lowercased variable name.
pub fn test_price_registry() -> PriceRegistry {
    PriceRegistry::from_lookup(|var| Some(format!("price_{}", var.to_lowercase()))).unwrap()
}

/// Returns a fixed datetime for reproducible tests.
fn test_datetime() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::jwt::verify_access_token;
    use secrecy::SecretString;

    #[test]
    fn test_create_profile_with_defaults() {
        let profile = create_test_profile(|_| {});
        assert_eq!(profile.role, Role::User);
        assert!(profile.email.is_some());
        assert!(profile.stripe_customer_id.is_none());
    }

    #[test]
    fn test_create_entitlement_defaults_are_active_and_unique() {
        let account_id = Uuid::new_v4();
        let a = create_test_entitlement(account_id, ProductKey::QrStudio, |_| {});
        let b = create_test_entitlement(account_id, ProductKey::QrStudio, |_| {});
        assert_eq!(a.status, EntitlementStatus::Active);
        assert_eq!(a.plan, Plan::Monthly);
        assert_ne!(a.source_ref, b.source_ref);
    }

    #[test]
    fn test_create_order_with_overrides() {
        let order = create_test_order(|o| o.status = OrderStatus::Ready);
        assert_eq!(order.status, OrderStatus::Ready);
        assert_eq!(create_test_order(|_| {}).status, OrderStatus::Pending);
    }

    #[test]
    fn test_bearer_token_verifies_with_test_secret() {
        let account_id = Uuid::new_v4();
        let header = bearer_for(account_id);
        let token = header.strip_prefix("Bearer ").unwrap();
        let claims = verify_access_token(
            token,
            &SecretString::new(TEST_AUTH_SECRET.into()),
            TEST_AUTH_AUDIENCE,
        )
        .unwrap();
        assert_eq!(claims.account_id().unwrap(), account_id);
    }

    #[test]
    fn test_price_registry_covers_every_slot() {
        let registry = test_price_registry();
        assert_eq!(
            registry.price_for(ProductKey::QrStudio, Plan::Onetime),
            Some("price_stripe_price_qr_studio_onetime")
        );
    }
}
