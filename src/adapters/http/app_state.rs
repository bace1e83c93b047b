use std::sync::Arc;

use crate::{
    application::use_cases::{
        access::AccessUseCases, admin::AdminUseCases, billing::BillingUseCases,
        entitlement::EntitlementUseCases, ops::OpsUseCases,
    },
    infra::{RateLimiterTrait, config::AppConfig},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub access_use_cases: Arc<AccessUseCases>,
    pub entitlement_use_cases: Arc<EntitlementUseCases>,
    pub admin_use_cases: Arc<AdminUseCases>,
    pub ops_use_cases: Arc<OpsUseCases>,
    pub billing_use_cases: Arc<BillingUseCases>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}
