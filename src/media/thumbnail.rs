/// First-frame video thumbnail generation
///
/// Decodes the first frame of each uploaded video via `ffmpeg`, downscales
/// it proportionally when wider than the configured maximum, and writes a
/// WebP thumbnail next to the LQIP previews.
use crate::{
    config::MediaConfig,
    error::{TabiError, TabiResult},
    media::{allowed_file, artifact_name, MediaKind, SweepStats},
};
use image::{imageops::FilterType, DynamicImage};
use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// WebP quality for video thumbnails
const THUMBNAIL_QUALITY: f32 = 80.0;

/// Decode the first frame of a video as an RGB image.
///
/// Shells out to `ffmpeg`, piping a single PNG frame through stdout.
async fn extract_first_frame(video_path: &Path) -> TabiResult<DynamicImage> {
    let output = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(video_path)
        .args(["-frames:v", "1", "-f", "image2pipe", "-c:v", "png", "-"])
        .output()
        .await
        .map_err(|e| TabiError::MediaProcessing(format!("ffmpeg not available: {}", e)))?;

    if !output.status.success() {
        return Err(TabiError::MediaProcessing(format!(
            "ffmpeg failed on {} (exit code {:?}): {}",
            video_path.display(),
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let frame = image::load_from_memory(&output.stdout).map_err(|e| {
        TabiError::MediaProcessing(format!("decode frame of {}: {}", video_path.display(), e))
    })?;

    Ok(DynamicImage::ImageRgb8(frame.to_rgb8()))
}

/// Extract the first frame of `video_path` and write it to `output_path`
/// as a WebP thumbnail, downscaling proportionally when the frame is wider
/// than `max_width`.
pub async fn generate_thumbnail(
    video_path: &Path,
    output_path: &Path,
    max_width: u32,
) -> TabiResult<()> {
    let frame = extract_first_frame(video_path).await?;

    let frame = if frame.width() > max_width {
        let height = (max_width as f64 / frame.width() as f64 * frame.height() as f64) as u32;
        frame.resize_exact(max_width, height.max(1), FilterType::Lanczos3)
    } else {
        frame
    };

    let encoder = webp::Encoder::from_image(&frame)
        .map_err(|e| TabiError::MediaProcessing(format!("webp encode: {}", e)))?;
    // WebPMemory holds a raw pointer and is not Send; copy the bytes out
    // before yielding so the future stays spawnable
    let encoded = encoder.encode(THUMBNAIL_QUALITY).to_vec();

    tokio::fs::write(output_path, &encoded).await?;

    Ok(())
}

/// Sweep a video directory, producing missing first-frame thumbnails in
/// its `lowres` subdirectory. Decode failures are logged and skipped so
/// one broken upload never stalls the sweep.
pub async fn thumbnail_directory(video_dir: &Path, config: &MediaConfig) -> TabiResult<SweepStats> {
    let lowres_dir = video_dir.join("lowres");
    tokio::fs::create_dir_all(&lowres_dir).await?;

    let mut stats = SweepStats::default();
    let mut entries = tokio::fs::read_dir(video_dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().to_string();
        if !allowed_file(&filename, MediaKind::Video) {
            continue;
        }

        let output_path = lowres_dir.join(artifact_name(&filename));
        if output_path.exists() {
            debug!("thumbnail exists, skipping {}", filename);
            stats.skipped += 1;
            continue;
        }

        match generate_thumbnail(&entry.path(), &output_path, config.thumbnail_max_width).await {
            Ok(()) => {
                info!("generated thumbnail {}", output_path.display());
                stats.generated += 1;
            }
            Err(e) => {
                warn!("failed to generate thumbnail for {}: {}", filename, e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
