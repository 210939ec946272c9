/// Low-quality image placeholder (LQIP) generation
///
/// Produces deliberately blurred, heavily downscaled WebP previews of
/// uploaded photos: downscale, upscale back, Gaussian blur, then an
/// iterative quality search against a size budget.
use crate::{
    config::MediaConfig,
    error::{TabiError, TabiResult},
    media::{allowed_file, artifact_name, MediaKind, SweepStats},
};
use image::{imageops::FilterType, metadata::Orientation, DynamicImage, ImageDecoder, ImageReader};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Starting quality for the WebP search
const QUALITY_START: i32 = 60;
/// Quality decrement per attempt
const QUALITY_STEP: i32 = 5;
/// Lowest quality attempted before giving up on the budget
const QUALITY_FLOOR: i32 = 10;
/// Blur radius applied to the upscaled preview
const BLUR_SIGMA: f32 = 2.0;

/// Result of a single LQIP encoding
#[derive(Debug, Clone, Copy)]
pub struct LqipOutcome {
    /// Quality the written encoding used
    pub quality: i32,
    /// Encoded size in bytes
    pub bytes: u64,
    /// Whether the encoding met the size budget
    pub hit_target: bool,
}

/// Load an image with its stored EXIF orientation applied, as 8-bit RGB
fn load_oriented_rgb(path: &Path) -> TabiResult<DynamicImage> {
    let mut decoder = ImageReader::open(path)?
        .with_guessed_format()?
        .into_decoder()
        .map_err(|e| TabiError::MediaProcessing(format!("decode {}: {}", path.display(), e)))?;

    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut img = DynamicImage::from_decoder(decoder)
        .map_err(|e| TabiError::MediaProcessing(format!("decode {}: {}", path.display(), e)))?;
    img.apply_orientation(orientation);

    Ok(DynamicImage::ImageRgb8(img.to_rgb8()))
}

/// Encode an image as lossy WebP at the given quality
fn encode_webp(img: &DynamicImage, quality: i32) -> TabiResult<Vec<u8>> {
    let encoder = webp::Encoder::from_image(img)
        .map_err(|e| TabiError::MediaProcessing(format!("webp encode: {}", e)))?;
    Ok(encoder.encode(quality as f32).to_vec())
}

/// Generate one LQIP preview from `src` and write it to `dst`.
///
/// The preview is downscaled by `scale` with a bilinear filter, upscaled
/// back to the original dimensions with the same filter, and blurred. The
/// quality search starts at 60 and steps down by 5; the first encoding at
/// or under `max_size_kb` KiB wins. If even the floor quality misses the
/// budget, the floor encoding is written anyway and the miss is reported.
pub fn generate_lqip(
    src: &Path,
    dst: &Path,
    scale: f32,
    max_size_kb: u64,
) -> TabiResult<LqipOutcome> {
    let img = load_oriented_rgb(src)?;
    let (width, height) = (img.width(), img.height());

    let small_w = ((width as f32 * scale) as u32).max(1);
    let small_h = ((height as f32 * scale) as u32).max(1);

    let small = img.resize_exact(small_w, small_h, FilterType::Triangle);
    let blurred = small
        .resize_exact(width, height, FilterType::Triangle)
        .blur(BLUR_SIGMA);

    let max_bytes = max_size_kb * 1024;
    let mut quality = QUALITY_START;
    let mut encoded = encode_webp(&blurred, quality)?;

    while encoded.len() as u64 > max_bytes && quality > QUALITY_FLOOR {
        quality -= QUALITY_STEP;
        encoded = encode_webp(&blurred, quality)?;
    }

    let hit_target = encoded.len() as u64 <= max_bytes;
    if !hit_target {
        warn!(
            "could not compress {} under {}KB (quality {}, {} bytes)",
            src.display(),
            max_size_kb,
            quality,
            encoded.len()
        );
    }

    fs::write(dst, &encoded)?;

    Ok(LqipOutcome {
        quality,
        bytes: encoded.len() as u64,
        hit_target,
    })
}

/// Sweep a photo directory, producing missing LQIP previews in its
/// `lowres` subdirectory. Per-file failures are logged and skipped; a
/// failed file is retried on the next sweep since its artifact was never
/// written.
pub fn compress_directory(photo_dir: &Path, config: &MediaConfig) -> TabiResult<SweepStats> {
    let lowres_dir = photo_dir.join("lowres");
    fs::create_dir_all(&lowres_dir)?;

    let mut stats = SweepStats::default();

    for entry in fs::read_dir(photo_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }

        let filename = entry.file_name().to_string_lossy().to_string();
        if !allowed_file(&filename, MediaKind::Image) {
            continue;
        }

        let output_path = lowres_dir.join(artifact_name(&filename));
        if output_path.exists() {
            debug!("preview exists, skipping {}", filename);
            stats.skipped += 1;
            continue;
        }

        match generate_lqip(
            &entry.path(),
            &output_path,
            config.lqip_scale,
            config.lqip_max_size_kb,
        ) {
            Ok(outcome) => {
                info!(
                    "generated preview {} ({} bytes, quality {})",
                    output_path.display(),
                    outcome.bytes,
                    outcome.quality
                );
                stats.generated += 1;
            }
            Err(e) => {
                warn!("failed to generate preview for {}: {}", filename, e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
