use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::{create_cors_layer, security_headers};
use axum::http::HeaderValue;
use axum::{Router, middleware};
use core_config::server::ServerConfig;
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;

/// Creates a configured Axum router with common middleware and documentation.
///
/// This function sets up:
/// - OpenAPI documentation (Swagger UI, ReDoc, RapiDoc, Scalar)
/// - API routes nested under `/api`
/// - Tracing, security headers, CORS and response compression
/// - JSON 404 / 405 fallbacks
///
/// Health endpoints are merged by the app.
///
/// # Errors
/// Returns `InvalidInput` when `allowed_origins` is empty.
///
/// # Example
/// ```ignore
/// let origins = vec![HeaderValue::from_static("http://localhost:4200")];
/// let router = create_router::<ApiDoc>(api_routes, origins)?;
/// ```
pub fn create_router<T>(apis: Router, allowed_origins: Vec<HeaderValue>) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};
    use utoipa_swagger_ui::SwaggerUi;

    if allowed_origins.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "At least one CORS origin is required",
        ));
    }

    info!(origins = ?allowed_origins, "CORS configured");

    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .nest("/api", apis)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(create_cors_layer(allowed_origins))
        .layer(CompressionLayer::new());

    Ok(router)
}

/// Production server with coordinated shutdown and cleanup.
///
/// On SIGTERM/SIGINT the server stops accepting connections and drains
/// in-flight requests. Draining is cut off after `shutdown_timeout`, then
/// `cleanup` runs (also bounded by `shutdown_timeout`).
///
/// # Example
/// ```ignore
/// create_production_app(
///     router,
///     &config.server,
///     Duration::from_secs(30),
///     close_postgres(db, "products"),
/// ).await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    shutdown_timeout: Duration,
    cleanup: F,
) -> io::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let (coordinator, mut drain_rx) = ShutdownCoordinator::new();
    let mut deadline_rx = coordinator.subscribe();

    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let signal_coordinator = coordinator.clone();
    tokio::spawn(async move { signal_coordinator.wait_for_signal().await });

    let mut server = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = drain_rx.recv().await;
            })
            .await
    });

    let serve_result = tokio::select! {
        joined = &mut server => joined.map_err(io::Error::other)?,
        _ = async {
            let _ = deadline_rx.recv().await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!(
                "In-flight requests did not drain within {:?}, forcing shutdown",
                shutdown_timeout
            );
            server.abort();
            Ok(())
        }
    };

    if let Err(e) = &serve_result {
        tracing::error!("Server encountered an error: {:?}", e);
    }

    info!("Starting cleanup tasks (timeout: {:?})", shutdown_timeout);
    match tokio::time::timeout(shutdown_timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed successfully"),
        Err(_) => tracing::warn!(
            "Cleanup exceeded timeout of {:?}, forcing shutdown",
            shutdown_timeout
        ),
    }

    serve_result
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use tower::ServiceExt;

    #[derive(OpenApi)]
    #[openapi(paths())]
    struct EmptyDoc;

    fn origins() -> Vec<HeaderValue> {
        vec![HeaderValue::from_static("http://localhost:4200")]
    }

    #[test]
    fn test_create_router_requires_an_origin() {
        let result = create_router::<EmptyDoc>(Router::new(), Vec::new());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_routes_are_nested_under_api() {
        let apis = Router::new().route("/ping", get(|| async { "pong" }));
        let app = create_router::<EmptyDoc>(apis, origins()).unwrap();

        let response = app
            .oneshot(Request::get("/api/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-content-type-options").unwrap(),
            "nosniff"
        );
    }

    #[tokio::test]
    async fn test_unknown_route_returns_json_404() {
        let app = create_router::<EmptyDoc>(Router::new(), origins()).unwrap();

        let response = app
            .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
    }
}
