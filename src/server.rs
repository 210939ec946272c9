/// HTTP server setup and routing
use crate::{
    api::{landing::gone_page, middleware::block_bots},
    context::AppContext,
    error::{TabiError, TabiResult},
};
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, Method},
    middleware,
    response::Response,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let static_files = ServeDir::new(&ctx.config.storage.static_directory);

    Router::new()
        .merge(crate::api::routes())
        .nest_service("/static", static_files)
        // Unknown routes get the terminal gone page, never a 404
        .fallback(fallback)
        .with_state(ctx.clone())
        // Bot filter runs before every request
        .layer(middleware::from_fn_with_state(ctx.clone(), block_bots))
        .layer(DefaultBodyLimit::max(ctx.config.service.upload_limit))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Unknown-route handler
async fn fallback(State(ctx): State<AppContext>) -> Response {
    gone_page(&ctx).await
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> TabiResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Tabiroku listening on {}", addr);
    info!("   Service URL: {}", ctx.service_url());

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TabiError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| TabiError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        LoggingConfig, MediaConfig, NotifierConfig, ServerConfig, ServiceConfig, StorageConfig,
    };
    use crate::notifier::Notifier;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tower::ServiceExt;

    const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

    fn config_for(dir: &TempDir) -> ServerConfig {
        let root = dir.path();
        ServerConfig {
            service: ServiceConfig {
                hostname: "localhost".into(),
                port: 0,
                upload_limit: 10 * 1024 * 1024,
                unlock_time: "2025-07-26T00:00:00Z".into(),
            },
            storage: StorageConfig {
                data_directory: root.join("data"),
                travel_data_file: root.join("data/travel_data.json"),
                user_file: root.join("data/user.json"),
                static_directory: root.join("static"),
                photo_directory: root.join("static/photos"),
                video_directory: root.join("static/videos"),
            },
            media: MediaConfig {
                compress_interval_secs: 3600,
                lqip_scale: 0.1,
                lqip_max_size_kb: 1024,
                thumbnail_max_width: 800,
            },
            notifier: NotifierConfig {
                webhook_url: None,
                username: "tabiroku".into(),
            },
            logging: LoggingConfig { level: "info".into() },
        }
    }

    /// Router over a fresh site: one region ("Tokyo"), one user
    /// ("al1c3" -> "alice"), notifications captured in the receiver
    async fn test_site() -> (TempDir, AppContext, Router, UnboundedReceiver<String>) {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);

        tokio::fs::create_dir_all(&config.storage.data_directory)
            .await
            .unwrap();
        tokio::fs::create_dir_all(&config.storage.static_directory)
            .await
            .unwrap();
        tokio::fs::write(
            &config.storage.travel_data_file,
            serde_json::to_vec(&json!({
                "Tokyo": { "photos": [], "videos": [], "capital": true }
            }))
            .unwrap(),
        )
        .await
        .unwrap();
        tokio::fs::write(&config.storage.user_file, br#"{"al1c3": "alice"}"#)
            .await
            .unwrap();
        tokio::fs::write(
            config.storage.static_directory.join("japan.html"),
            "<html>japan</html>",
        )
        .await
        .unwrap();
        tokio::fs::write(
            config.storage.static_directory.join("error.html"),
            "<html>gone</html>",
        )
        .await
        .unwrap();

        let (notifier, rx) = Notifier::channel();
        let ctx = AppContext::with_notifier(config, notifier).await.unwrap();
        let router = build_router(ctx.clone());
        (dir, ctx, router, rx)
    }

    fn multipart_body(prefecture: &str, field: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"prefecture\"\r\n\r\n{prefecture}\r\n"
            )
            .as_bytes(),
        );
        for (filename, data) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header("authorization", format!("Bearer {token}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn response_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_upload_image_records_stored_name() {
        let (_dir, ctx, router, mut rx) = test_site().await;
        let token = ctx.sessions.create("alice").await;

        let body = multipart_body("Tokyo", "images", &[("a.png", b"fake png bytes".as_slice())]);
        let resp = router
            .oneshot(upload_request("/api/upload/image", &token, body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["filenames"], json!(["alice_a.png"]));

        // Bytes landed under the stored name
        let saved = ctx.config.storage.photo_directory.join("alice_a.png");
        assert_eq!(tokio::fs::read(&saved).await.unwrap(), b"fake png bytes");

        // Store updated, unrelated fields intact
        let doc = ctx.travel_store.read().await.unwrap();
        assert_eq!(doc["Tokyo"]["photos"], json!(["alice_a.png"]));
        assert_eq!(doc["Tokyo"]["capital"], json!(true));

        // Upload notification emitted
        let note = rx.try_recv().unwrap();
        assert!(note.contains("alice"));
        assert!(note.contains("Tokyo"));
    }

    #[tokio::test]
    async fn test_upload_skips_rejected_files_in_mixed_batch() {
        let (_dir, ctx, router, _rx) = test_site().await;
        let token = ctx.sessions.create("alice").await;

        let body = multipart_body(
            "Tokyo",
            "images",
            &[("a.png", b"png".as_slice()), ("virus.exe", b"mz".as_slice())],
        );
        let resp = router
            .oneshot(upload_request("/api/upload/image", &token, body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["filenames"], json!(["alice_a.png"]));
    }

    #[tokio::test]
    async fn test_upload_all_rejected_is_validation_error() {
        let (_dir, ctx, router, _rx) = test_site().await;
        let token = ctx.sessions.create("alice").await;

        let body = multipart_body("Tokyo", "images", &[("virus.exe", b"mz".as_slice())]);
        let resp = router
            .oneshot(upload_request("/api/upload/image", &token, body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = response_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("virus.exe"));

        // Store untouched
        let doc = ctx.travel_store.read().await.unwrap();
        assert_eq!(doc["Tokyo"]["photos"], json!([]));
    }

    #[tokio::test]
    async fn test_upload_video_error_mentions_videos() {
        let (_dir, ctx, router, _rx) = test_site().await;
        let token = ctx.sessions.create("alice").await;

        let body = multipart_body("Tokyo", "videos", &[]);
        let resp = router
            .oneshot(upload_request("/api/upload/video", &token, body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = response_json(resp).await;
        // Kind-correct messaging on the video path
        assert!(json["error"].as_str().unwrap().contains("video"));
    }

    #[tokio::test]
    async fn test_upload_unknown_region_is_404() {
        let (_dir, ctx, router, _rx) = test_site().await;
        let token = ctx.sessions.create("alice").await;

        let body = multipart_body("Atlantis", "images", &[("a.png", b"png".as_slice())]);
        let resp = router
            .oneshot(upload_request("/api/upload/image", &token, body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_without_session_is_401() {
        let (_dir, _ctx, router, _rx) = test_site().await;

        let body = multipart_body("Tokyo", "images", &[("a.png", b"png".as_slice())]);
        let req = Request::builder()
            .method("POST")
            .uri("/api/upload/image")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();

        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_travel_data_returns_document() {
        let (_dir, _ctx, router, _rx) = test_site().await;

        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/api/travel-data")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = response_json(resp).await;
        assert_eq!(json["Tokyo"]["capital"], json!(true));
    }

    #[tokio::test]
    async fn test_unlock_time_reports_configured_instant() {
        let (_dir, _ctx, router, _rx) = test_site().await;

        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/api/unlock-time")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = response_json(resp).await;
        assert_eq!(json["unlockTime"], json!("2025-07-26T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_landing_known_user_mints_session() {
        let (_dir, ctx, router, mut rx) = test_site().await;

        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/japan/al1c3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let token = resp
            .headers()
            .get(crate::api::landing::SESSION_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(ctx.sessions.resolve(&token).await, Some("alice".to_string()));

        // Visit notification emitted
        assert!(rx.try_recv().unwrap().contains("alice"));
    }

    #[tokio::test]
    async fn test_landing_unknown_user_is_gone_and_silent() {
        let (_dir, _ctx, router, mut rx) = test_site().await;

        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/japan/mallory")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::GONE);
        assert!(resp.headers().get(crate::api::landing::SESSION_HEADER).is_none());
        // No notification for unknown visitors
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_bot_user_agent_is_gone() {
        let (_dir, _ctx, router, _rx) = test_site().await;

        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/api/travel-data")
                    .header("user-agent", "Googlebot/2.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn test_unknown_route_is_gone() {
        let (_dir, _ctx, router, _rx) = test_site().await;

        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/admin/secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::GONE);
    }

    #[tokio::test]
    async fn test_robots_txt_disallows_everything() {
        let (_dir, _ctx, router, _rx) = test_site().await;

        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/robots.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(std::str::from_utf8(&bytes).unwrap().contains("Disallow: /"));
    }
}
