/// Background task implementations
use crate::{
    context::AppContext,
    error::{TabiError, TabiResult},
    media::{lqip, thumbnail, SweepStats},
};

/// Run one full media compression cycle: the image pass over the photo
/// directory, then the video pass over the video directory. The two
/// passes are independent; a failure in one does not stop the other.
///
/// Exposed so tests can drive a single deterministic cycle without
/// waiting on the scheduler's wall-clock interval.
pub async fn run_compression_cycle(ctx: &AppContext) -> TabiResult<(SweepStats, SweepStats)> {
    let photo_dir = ctx.config.storage.photo_directory.clone();
    let media_config = ctx.config.media.clone();

    // Image decoding and encoding are CPU-bound; keep them off the
    // async workers
    let image_stats = tokio::task::spawn_blocking(move || {
        lqip::compress_directory(&photo_dir, &media_config)
    })
    .await
    .map_err(|e| TabiError::Internal(format!("image pass panicked: {}", e)))??;

    let video_stats =
        thumbnail::thumbnail_directory(&ctx.config.storage.video_directory, &ctx.config.media)
            .await?;

    Ok((image_stats, video_stats))
}
