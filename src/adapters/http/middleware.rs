use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use crate::{adapters::http::app_state::AppState, app_error::AppError};

pub async fn rate_limit_middleware(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let connect_ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    // Only trust forwarded headers if explicitly configured (when behind a reverse proxy)
    let ip = if app_state.config.trust_proxy {
        forwarded_ip(&request).or(connect_ip.clone())
    } else {
        connect_ip.clone()
    }
    .unwrap_or_else(|| "unknown".to_string());

    tracing::debug!(
        trust_proxy = app_state.config.trust_proxy,
        connect_ip = ?connect_ip,
        using_ip = %ip,
        "Rate limiting request"
    );

    app_state.rate_limiter.check(&ip).await?;

    Ok(next.run(request).await)
}

fn forwarded_ip(req: &Request) -> Option<String> {
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let trimmed = first.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    if let Some(real) = req.headers().get("x-real-ip")
        && let Ok(val) = real.to_str()
        && !val.trim().is_empty()
    {
        return Some(val.trim().to_string());
    }
    None
}
