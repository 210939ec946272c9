/// Media upload endpoints
///
/// Multipart uploads carry a `prefecture` field and one or more file
/// parts named `images` or `videos`. Each accepted file is persisted
/// under `<owner>_<sanitized name>` and recorded in the travel data
/// store for its region.
use crate::{
    api::middleware::require_session,
    context::AppContext,
    error::{TabiError, TabiResult},
    media::{self, MediaKind},
};
use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Build upload routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/upload/image", post(upload_image))
        .route("/api/upload/video", post(upload_video))
}

/// Successful upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub filenames: Vec<String>,
}

async fn upload_image(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    multipart: Multipart,
) -> TabiResult<impl IntoResponse> {
    handle_upload(ctx, headers, multipart, MediaKind::Image).await
}

async fn upload_video(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    multipart: Multipart,
) -> TabiResult<impl IntoResponse> {
    handle_upload(ctx, headers, multipart, MediaKind::Video).await
}

/// Shared upload pipeline for both media kinds.
///
/// Files failing the extension allow-list are rejected individually; the
/// batch succeeds with whatever passed. A disk write failure aborts the
/// whole batch, notifies the webhook, and reports a server error. An
/// entirely rejected batch is a validation error naming the offenders,
/// and the data store is left untouched.
async fn handle_upload(
    ctx: AppContext,
    headers: HeaderMap,
    mut multipart: Multipart,
    kind: MediaKind,
) -> TabiResult<Json<UploadResponse>> {
    let owner = require_session(&ctx, &headers).await?;

    let upload_dir = match kind {
        MediaKind::Image => &ctx.config.storage.photo_directory,
        MediaKind::Video => &ctx.config.storage.video_directory,
    };

    let mut prefecture: Option<String> = None;
    let mut stored: Vec<String> = Vec::new();
    let mut rejected: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| TabiError::Validation(format!("Malformed multipart request: {}", e)))?
    {
        let field_name = field.name().map(String::from);
        match field_name.as_deref() {
            Some("prefecture") => {
                let value = field.text().await.map_err(|e| {
                    TabiError::Validation(format!("Unreadable prefecture field: {}", e))
                })?;
                prefecture = Some(value);
            }
            Some(name) if name == kind.form_field() => {
                let Some(original) = field.file_name().map(String::from) else {
                    continue;
                };
                if original.is_empty() {
                    continue; // Empty file slot in the form
                }

                if !media::allowed_file(&original, kind) {
                    warn!("rejected {} upload \"{}\": extension not allowed", kind.noun(), original);
                    rejected.push(original);
                    continue;
                }

                let data = field.bytes().await.map_err(|e| {
                    TabiError::Validation(format!("Unreadable file \"{}\": {}", original, e))
                })?;
                if data.is_empty() {
                    warn!("rejected {} upload \"{}\": empty file", kind.noun(), original);
                    rejected.push(original);
                    continue;
                }

                let filename = media::stored_name(&owner, &original);
                let path = upload_dir.join(&filename);

                if let Err(e) = tokio::fs::write(&path, &data).await {
                    ctx.notifier.notify(format!(
                        "Error saving {} {} to {}: {}",
                        kind.noun(),
                        filename,
                        path.display(),
                        e
                    ));
                    return Err(TabiError::Io(e));
                }

                stored.push(filename);
            }
            _ => {}
        }
    }

    let Some(prefecture) = prefecture else {
        return Err(TabiError::Validation("No prefecture specified".to_string()));
    };

    if stored.is_empty() {
        return Err(TabiError::Validation(if rejected.is_empty() {
            format!("No valid {} files uploaded", kind.noun())
        } else {
            format!(
                "No valid {} files uploaded; rejected: {}",
                kind.noun(),
                rejected.join(", ")
            )
        }));
    }

    if let Err(e) = ctx
        .travel_store
        .append_media(&prefecture, kind, &stored)
        .await
    {
        // Unknown regions are the caller's mistake; anything else is a
        // store failure the webhook should hear about
        if !matches!(e, TabiError::NotFound(_)) {
            ctx.notifier
                .notify(format!("Error updating travel data for {}s: {}", kind.noun(), e));
        }
        return Err(e);
    }

    ctx.notifier.notify(format!(
        "{} {} uploaded {}s to {}: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        owner,
        kind.noun(),
        prefecture,
        stored.join(", ")
    ));

    Ok(Json(UploadResponse {
        message: format!("{} upload successful", kind.noun()),
        filenames: stored,
    }))
}
