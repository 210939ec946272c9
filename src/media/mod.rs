/// Media kinds, extension allow-lists, and stored-name derivation
pub mod lqip;
pub mod thumbnail;

use serde::{Deserialize, Serialize};

/// Allowed image extensions (lowercase, without dot)
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "raw"];

/// Allowed video extensions (lowercase, without dot)
pub const ALLOWED_VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];

/// Kind of uploaded media
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Extensions accepted for this kind
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => ALLOWED_IMAGE_EXTENSIONS,
            MediaKind::Video => ALLOWED_VIDEO_EXTENSIONS,
        }
    }

    /// Multipart field name carrying files of this kind
    pub fn form_field(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }

    /// Human-readable noun for error messages
    pub fn noun(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// Check whether a filename carries an allowed extension for the kind.
/// Matching is case-insensitive; a file without any extension is rejected.
pub fn allowed_file(filename: &str, kind: MediaKind) -> bool {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            kind.allowed_extensions().iter().any(|a| *a == ext)
        }
        _ => false,
    }
}

/// Sanitize an untrusted filename into a safe, non-traversal path component.
///
/// Path separators and anything outside ASCII alphanumerics, `.`, `-` and
/// `_` are dropped; whitespace runs collapse to a single underscore; leading
/// dots are stripped so the result can never climb out of the upload
/// directory or hide as a dotfile.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_space = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push('_');
            }
            last_was_space = true;
            continue;
        }
        last_was_space = false;

        if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
            out.push(c);
        }
    }

    // A name like "..png" or "../../etc/passwd" must not survive as a
    // traversal component or dotfile
    let trimmed = out.trim_start_matches('.').trim_end_matches('_');
    trimmed.to_string()
}

/// Derive the on-disk filename for an upload: `<owner>_<sanitized original>`
pub fn stored_name(owner: &str, original: &str) -> String {
    format!("{}_{}", sanitize_filename(owner), sanitize_filename(original))
}

/// Lowres artifact name for a source file: same stem, `.webp` extension
pub fn artifact_name(source: &str) -> String {
    match source.rsplit_once('.') {
        Some((stem, _)) => format!("{}.webp", stem),
        None => format!("{}.webp", source),
    }
}

/// Outcome counters for one directory sweep of the background compressor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Artifacts written this sweep
    pub generated: u64,
    /// Sources skipped because their artifact already exists
    pub skipped: u64,
    /// Sources that failed to decode or encode; retried next sweep
    pub failed: u64,
}
