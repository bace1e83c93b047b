//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` creates an `AppState` backed by in-memory mocks and a
//! config whose auth secret matches [`super::bearer_for`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        access::AccessUseCases, admin::AdminUseCases, billing::BillingUseCases,
        entitlement::EntitlementUseCases, ops::OpsUseCases,
    },
    domain::entities::{entitlement::Entitlement, location::Location, order::Order, profile::Profile},
    infra::{RateLimiterTrait, config::AppConfig},
    test_utils::{
        InMemoryEntitlementRepo, InMemoryLocationRepo, InMemoryOrderRepo, InMemoryProfileRepo,
        InMemoryRateLimiter, InMemoryStripeEventRepo, RecordingPaymentGateway,
        test_price_registry,
    },
};

pub const TEST_AUTH_SECRET: &str = "test_auth_secret";
pub const TEST_AUTH_AUDIENCE: &str = "authenticated";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test";

/// Handles to the mocks behind a built `AppState`, for assertions.
pub struct TestMocks {
    pub profiles: Arc<InMemoryProfileRepo>,
    pub entitlements: Arc<InMemoryEntitlementRepo>,
    pub orders: Arc<InMemoryOrderRepo>,
    pub locations: Arc<InMemoryLocationRepo>,
    pub events: Arc<InMemoryStripeEventRepo>,
    pub gateway: Arc<RecordingPaymentGateway>,
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let admin = create_test_profile(|p| p.role = Role::Admin);
/// let app_state = TestAppStateBuilder::new().with_profile(admin.clone()).build();
/// let server = TestServer::new(router().with_state(app_state)).unwrap();
/// server.get("/").add_header("Authorization", bearer_for(admin.id)).await;
/// ```
pub struct TestAppStateBuilder {
    profiles: Vec<Profile>,
    entitlements: Vec<Entitlement>,
    orders: Vec<Order>,
    locations: Vec<Location>,
    rate_limiter: Option<Arc<dyn RateLimiterTrait>>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            profiles: vec![],
            entitlements: vec![],
            orders: vec![],
            locations: vec![],
            rate_limiter: None,
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.push(profile);
        self
    }

    pub fn with_entitlement(mut self, entitlement: Entitlement) -> Self {
        self.entitlements.push(entitlement);
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.push(location);
        self
    }

    /// Replace the default permissive limiter.
    pub fn with_rate_limiter(mut self, limiter: Arc<dyn RateLimiterTrait>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    /// Build the AppState and keep handles to its mocks.
    pub fn build_with_mocks(self) -> (AppState, TestMocks) {
        let mocks = TestMocks {
            profiles: Arc::new(InMemoryProfileRepo::with_profiles(self.profiles)),
            entitlements: Arc::new(InMemoryEntitlementRepo::with_entitlements(
                self.entitlements,
            )),
            orders: Arc::new(InMemoryOrderRepo::with_orders(self.orders)),
            locations: Arc::new(InMemoryLocationRepo::with_locations(self.locations)),
            events: Arc::new(InMemoryStripeEventRepo::new()),
            gateway: Arc::new(RecordingPaymentGateway::new()),
        };

        let config = test_config();

        let entitlement_use_cases = EntitlementUseCases::new(mocks.entitlements.clone());
        let access_use_cases = AccessUseCases::new(mocks.profiles.clone());
        let admin_use_cases = AdminUseCases::new(
            mocks.profiles.clone(),
            mocks.locations.clone(),
            entitlement_use_cases.clone(),
        );
        let ops_use_cases = OpsUseCases::new(mocks.orders.clone());
        let billing_use_cases = BillingUseCases::new(
            config.prices.clone(),
            mocks.profiles.clone(),
            mocks.events.clone(),
            mocks.gateway.clone(),
            entitlement_use_cases.clone(),
            config.app_origin.clone(),
        );

        let rate_limiter = self
            .rate_limiter
            .unwrap_or_else(|| Arc::new(InMemoryRateLimiter::permissive()));

        let app_state = AppState {
            config: Arc::new(config),
            access_use_cases: Arc::new(access_use_cases),
            entitlement_use_cases: Arc::new(entitlement_use_cases),
            admin_use_cases: Arc::new(admin_use_cases),
            ops_use_cases: Arc::new(ops_use_cases),
            billing_use_cases: Arc::new(billing_use_cases),
            rate_limiter,
        };

        (app_state, mocks)
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        database_url: String::new(),
        auth_jwt_secret: SecretString::new(TEST_AUTH_SECRET.into()),
        auth_audience: TEST_AUTH_AUDIENCE.to_string(),
        stripe_secret_key: SecretString::new("sk_test_unused".into()),
        stripe_webhook_secret: SecretString::new(TEST_WEBHOOK_SECRET.into()),
        app_origin: Url::parse("http://localhost:3000").unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
        redis_url: String::new(),
        rate_limit_window_secs: 60,
        rate_limit_per_ip: 60,
        trust_proxy: false,
        prices: Arc::new(test_price_registry()),
    }
}
