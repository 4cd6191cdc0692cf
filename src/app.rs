use std::net::SocketAddr;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::auth::csrf;
use crate::state::AppState;
use crate::{admin, auth, recordings};

pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/user", auth::router())
        .nest("/recording", recordings::router())
        .route("/csrf", get(csrf::csrf_token))
        .route("/health", get(|| async { "ok" }));

    let media = ServeDir::new(&state.config.media_root);

    Router::new()
        .nest("/api", api)
        .nest("/admin", admin::router())
        .layer(middleware::from_fn(csrf::csrf_protect))
        .nest_service("/recordings", media)
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

// Cookie auth needs a concrete allowed origin; a wildcard would make
// the browser drop credentialed requests.
fn cors_layer(state: &AppState) -> CorsLayer {
    let origin = state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(csrf::CSRF_HEADER),
        ])
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
