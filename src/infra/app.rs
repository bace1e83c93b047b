use std::any::Any;

use axum::{
    Router, http, middleware,
    response::{IntoResponse, Response},
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::{
    adapters::{
        self,
        http::{app_state::AppState, middleware::rate_limit_middleware},
    },
    app_error::AppError,
    infra::setup::init_tracing,
};

pub fn create_app(app_state: AppState) -> Router {
    init_tracing();
    with_layers(
        Router::new().nest("/api", adapters::http::routes::router()),
        app_state,
    )
}

/// A panicking handler answers like any other internal error.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    AppError::Internal(format!("handler panicked: {detail}")).into_response()
}

fn with_layers(routes: Router<AppState>, app_state: AppState) -> Router {
    // Bearer tokens only, no cookies, so credentials stay off.
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PATCH,
            http::Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    routes
        .with_state(app_state.clone())
        .layer(middleware::from_fn_with_state(
            app_state,
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            http::header::X_CONTENT_TYPE_OPTIONS,
            http::HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            http::header::X_FRAME_OPTIONS,
            http::HeaderValue::from_static("DENY"),
        ))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &http::Request<_>| {
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http-request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id
                )
            }),
        )
}
