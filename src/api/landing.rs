/// Personal landing pages and crawler-facing routes
use crate::context::AppContext;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Local;
use tracing::warn;

/// Response header carrying the freshly minted upload session token
pub const SESSION_HEADER: &str = "x-tabi-session";

/// Fallback body when the static error page itself is missing
const FALLBACK_ERROR_HTML: &str = "<!DOCTYPE html><html><body><h1>410 Gone</h1></body></html>";

/// Build landing routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/japan/:user", get(landing))
        .route("/robots.txt", get(robots_txt))
        .route("/favicon.ico", get(favicon))
}

/// The terminal "gone" page.
///
/// Unknown users, unknown routes, and blocked bots all receive this
/// same static page with HTTP 410, never a 404, so probes cannot
/// distinguish valid paths from invalid ones.
pub async fn gone_page(ctx: &AppContext) -> Response {
    let page_path = ctx.config.storage.static_directory.join("error.html");
    let body = tokio::fs::read_to_string(&page_path)
        .await
        .unwrap_or_else(|_| FALLBACK_ERROR_HTML.to_string());

    (StatusCode::GONE, Html(body)).into_response()
}

/// Personal landing page: `/japan/{user}`.
///
/// Resolves the path segment against the user directory. Unknown keys
/// and a missing or corrupt directory all answer with the gone page, and
/// neither a session nor a notification is produced for them. A resolved
/// visitor gets the site page, an upload session token in the response
/// headers, and a visit notification.
async fn landing(State(ctx): State<AppContext>, Path(user): Path<String>) -> Response {
    let display_name = match ctx.user_directory.resolve(&user).await {
        Ok(Some(name)) => name,
        Ok(None) => return gone_page(&ctx).await,
        Err(e) => {
            warn!("user directory lookup failed: {}", e);
            return gone_page(&ctx).await;
        }
    };

    let token = ctx.sessions.create(&display_name).await;
    ctx.notifier.notify(format!(
        "{} {} entered the site!",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        display_name
    ));

    let page_path = ctx.config.storage.static_directory.join("japan.html");
    match tokio::fs::read_to_string(&page_path).await {
        Ok(body) => ([(SESSION_HEADER, token)], Html(body)).into_response(),
        Err(e) => {
            warn!("failed to read landing page {}: {}", page_path.display(), e);
            (StatusCode::INTERNAL_SERVER_ERROR, Html("")).into_response()
        }
    }
}

/// Disallow-all robots policy
async fn robots_txt() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

/// Site icon
async fn favicon(State(ctx): State<AppContext>) -> Response {
    let icon_path = ctx.config.storage.static_directory.join("favicon.ico");
    match tokio::fs::read(&icon_path).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "image/vnd.microsoft.icon")],
            bytes,
        )
            .into_response(),
        Err(_) => gone_page(&ctx).await,
    }
}
