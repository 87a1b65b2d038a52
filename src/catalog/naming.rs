//! Key and prefix naming rules: display names, years, file names, and
//! extension-based classification.

use regex::Regex;
use std::sync::LazyLock;

/// Audio extensions that make an object playable.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "aac", "m4a", "ogg"];

/// Image extensions usable as album art.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

static SEPARATOR_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_-]+").unwrap());
static YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?:19|20)\d{2}").unwrap());

/// Broad category of an object, judged by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Image,
    Other,
}

/// Last path segment of `key`, ignoring trailing slashes.
pub fn file_name(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Lower-cased extension of the file name, without the dot.
///
/// Dot-files such as `.gitkeep` have no extension.
pub fn extension(key: &str) -> Option<String> {
    let name = file_name(key);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(name[idx + 1..].to_ascii_lowercase()),
        _ => None,
    }
}

/// Classify `key` by extension, case-insensitively.
pub fn classify(key: &str) -> MediaKind {
    match extension(key) {
        Some(ext) if AUDIO_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Audio,
        Some(ext) if IMAGE_EXTENSIONS.contains(&ext.as_str()) => MediaKind::Image,
        _ => MediaKind::Other,
    }
}

/// Human-readable name of a prefix.
///
/// Drops the trailing delimiter, keeps the last segment, percent-decodes it
/// (leaving it as-is when it is not valid UTF-8 after decoding), and turns
/// every run of `_` / `-` into one space.
pub fn display_name(prefix: &str) -> String {
    let segment = file_name(prefix);
    let decoded = percent_encoding::percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    SEPARATOR_RUN.replace_all(&decoded, " ").trim().to_string()
}

/// First `19xx` / `20xx` run found in `name`, or an empty string.
pub fn extract_year(name: &str) -> String {
    YEAR.find(name)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
