use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    application::{
        ports::payment_gateway::PaymentGateway,
        use_cases::{
            access::{AccessUseCases, ProfileRepoTrait},
            admin::{AdminUseCases, LocationRepoTrait},
            billing::{BillingUseCases, StripeEventRepoTrait},
            entitlement::{EntitlementRepoTrait, EntitlementUseCases},
            ops::{OpsUseCases, OrderRepoTrait},
        },
    },
    infra::{
        InfraError, RateLimiterTrait, config::AppConfig, postgres_persistence,
        rate_limit::RedisRateLimiter, stripe_client::StripeClient,
    },
};

pub async fn init_app_state() -> Result<AppState, InfraError> {
    let config = AppConfig::from_env()?;

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);

    let rate_limiter: Arc<dyn RateLimiterTrait> = Arc::new(
        RedisRateLimiter::new(
            &config.redis_url,
            config.rate_limit_window_secs,
            config.rate_limit_per_ip,
        )
        .await?,
    );

    let profile_repo = postgres_arc.clone() as Arc<dyn ProfileRepoTrait>;
    let entitlement_repo = postgres_arc.clone() as Arc<dyn EntitlementRepoTrait>;
    let location_repo = postgres_arc.clone() as Arc<dyn LocationRepoTrait>;
    let order_repo = postgres_arc.clone() as Arc<dyn OrderRepoTrait>;
    let event_repo = postgres_arc.clone() as Arc<dyn StripeEventRepoTrait>;

    let gateway: Arc<dyn PaymentGateway> = Arc::new(StripeClient::new(config.stripe_secret_key.clone()));

    let entitlement_use_cases = EntitlementUseCases::new(entitlement_repo);
    let access_use_cases = AccessUseCases::new(profile_repo.clone());
    let admin_use_cases = AdminUseCases::new(
        profile_repo.clone(),
        location_repo,
        entitlement_use_cases.clone(),
    );
    let ops_use_cases = OpsUseCases::new(order_repo);
    let billing_use_cases = BillingUseCases::new(
        config.prices.clone(),
        profile_repo,
        event_repo,
        gateway,
        entitlement_use_cases.clone(),
        config.app_origin.clone(),
    );

    Ok(AppState {
        config: Arc::new(config),
        access_use_cases: Arc::new(access_use_cases),
        entitlement_use_cases: Arc::new(entitlement_use_cases),
        admin_use_cases: Arc::new(admin_use_cases),
        ops_use_cases: Arc::new(ops_use_cases),
        billing_use_cases: Arc::new(billing_use_cases),
        rate_limiter,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "entitlement_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs). Console-only when the file cannot be created.
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
