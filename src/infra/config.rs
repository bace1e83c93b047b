use std::{net::SocketAddr, sync::Arc};

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use super::InfraError;
use crate::application::pricing::PriceRegistry;

pub struct AppConfig {
    pub database_url: String,
    /// Shared secret the auth provider signs access tokens with (HS256).
    pub auth_jwt_secret: SecretString,
    /// Expected `aud` claim of access tokens.
    pub auth_audience: String,
    pub stripe_secret_key: SecretString,
    pub stripe_webhook_secret: SecretString,
    /// Base for checkout/portal return URLs.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub redis_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    /// Whether to trust X-Forwarded-For headers. Set to true when behind a reverse proxy (Caddy, nginx).
    /// SECURITY: Only enable this when the API is not directly exposed to the internet.
    pub trust_proxy: bool,
    pub prices: Arc<PriceRegistry>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let database_url: String = get_env("DATABASE_URL");
        let auth_jwt_secret = SecretString::new(get_env::<String>("AUTH_JWT_SECRET").into());
        let auth_audience: String =
            get_env_default("AUTH_JWT_AUDIENCE", "authenticated".to_string());
        let stripe_secret_key = SecretString::new(get_env::<String>("STRIPE_SECRET_KEY").into());
        let stripe_webhook_secret =
            SecretString::new(get_env::<String>("STRIPE_WEBHOOK_SECRET").into());

        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid { var: "CORS_ORIGIN" })?;

        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3001)),
        );
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 60);
        // Default to false for security - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let prices = PriceRegistry::from_lookup(|var| std::env::var(var).ok())?;
        tracing::debug!(count = prices.len(), "Price registry loaded");

        Ok(Self {
            database_url,
            auth_jwt_secret,
            auth_audience,
            stripe_secret_key,
            stripe_webhook_secret,
            app_origin,
            cors_origin,
            bind_addr,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            trust_proxy,
            prices: Arc::new(prices),
        })
    }
}
