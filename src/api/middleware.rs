/// Request gating and session middleware
use crate::{
    api::landing::gone_page,
    context::AppContext,
    error::{TabiError, TabiResult},
};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(String::from)
}

/// Resolve the uploader's display name from the request's session token,
/// or fail with a session error
pub async fn require_session(ctx: &AppContext, headers: &HeaderMap) -> TabiResult<String> {
    let token = extract_bearer_token(headers)
        .ok_or_else(|| TabiError::Session("Missing session token".to_string()))?;

    ctx.sessions
        .resolve(&token)
        .await
        .ok_or_else(|| TabiError::Session("Unknown or expired session token".to_string()))
}

/// Reject scrapers before routing.
///
/// Any User-Agent containing "bot" or "spider" gets the terminal gone
/// page, the same response unknown users and unknown routes receive.
pub async fn block_bots(State(ctx): State<AppContext>, req: Request, next: Next) -> Response {
    let user_agent = req
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if user_agent.contains("bot") || user_agent.contains("spider") {
        debug!("blocked bot user-agent: {}", user_agent);
        return gone_page(&ctx).await;
    }

    next.run(req).await
}
