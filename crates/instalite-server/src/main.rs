mod config;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, StatusCode, header};
use axum::middleware;
use axum::response::Response;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use instalite_api::rate_limit::RateLimiter;
use instalite_api::storage::Storage;
use instalite_api::{AppState, AppStateInner};
use instalite_caption::CaptionService;
use instalite_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "instalite=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.has_placeholder_secret() {
        warn!("INSTALITE_JWT_SECRET is unset or still a placeholder; set it before deploying");
    }
    info!(
        "Caption API key: {}",
        if config.openai_api_key.is_some() { "configured" } else { "missing" }
    );

    let db = Database::open(&config.db_path)?;
    let storage = Storage::new(config.upload_dir.clone()).await?;
    let captions = CaptionService::openai(config.openai_api_key.clone(), &config.caption_model);

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        storage,
        captions,
        caption_limiter: RateLimiter::for_captions(),
    });

    let app = app(state, &config.upload_dir);

    let addr = config.addr()?;
    info!("Instalite server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// API routes plus `/uploads`, under the shared HTTP layers.
fn app(state: AppState, upload_dir: &Path) -> Router {
    let uploads = Router::new()
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .layer(middleware::map_response(cache_uploads));

    instalite_api::router(state)
        .merge(uploads)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Uploaded files never change under their name; misses must stay uncached.
async fn cache_uploads(mut res: Response) -> Response {
    if res.status().is_success() || res.status() == StatusCode::NOT_MODIFIED {
        res.headers_mut().insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=31536000"),
        );
    }
    res
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    async fn test_app() -> (Router, tempfile::TempDir) {
        let uploads = tempfile::tempdir().unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            jwt_secret: "test-secret".to_string(),
            storage: Storage::new(uploads.path().to_path_buf()).await.unwrap(),
            captions: CaptionService::disabled(),
            caption_limiter: RateLimiter::for_captions(),
        });
        (app(state, uploads.path()), uploads)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn uploads_are_served_with_a_long_cache() {
        let (app, dir) = test_app().await;
        std::fs::write(dir.path().join("photo.png"), b"\x89PNG\r\n\x1a\n").unwrap();

        let res = app.oneshot(get("/uploads/photo.png")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CACHE_CONTROL], "public, max-age=31536000");
    }

    #[tokio::test]
    async fn missing_upload_is_not_cached() {
        let (app, _dir) = test_app().await;

        let res = app.oneshot(get("/uploads/nope.png")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let (app, _dir) = test_app().await;

        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/posts")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn text_responses_are_compressed_on_request() {
        let (app, dir) = test_app().await;
        std::fs::write(dir.path().join("notes.txt"), "caption ".repeat(512)).unwrap();

        let req = Request::get("/uploads/notes.txt")
            .header(header::ACCEPT_ENCODING, "gzip")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_ENCODING], "gzip");
    }
}
