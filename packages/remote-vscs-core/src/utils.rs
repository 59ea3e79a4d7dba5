//! General utilities shared across the application.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::protocol_constants::HTTP_PERMITTED_EXTENSIONS;

// ─────────────────────────────────────────────────────────────────────────────
// Static Asset Paths
// ─────────────────────────────────────────────────────────────────────────────

/// Reasons a request path cannot be mapped to a static asset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetPathError {
    /// Nothing left after stripping the leading slash and query string.
    #[error("empty asset path")]
    Empty,
    /// Path escapes the asset directory (`..`, absolute or drive-prefixed).
    #[error("path escapes the asset directory")]
    Traversal,
    /// Extension missing or not on the allow-list.
    #[error("extension not permitted: {0:?}")]
    ForbiddenExtension(String),
}

/// A request path resolved against the asset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    /// Absolute (or asset-dir relative) location on disk.
    pub path: PathBuf,
    /// Lowercase extension without the dot.
    pub extension: String,
}

/// Maps a raw request target (e.g. `/css/panel.css?v=3`) onto the asset directory.
///
/// The query string is dropped, the leading `/` removed, and the remaining
/// path must consist of plain components only. The extension is compared
/// case-insensitively against [`HTTP_PERMITTED_EXTENSIONS`].
///
/// Existence is not checked here; the responder does that on every request.
pub fn resolve_asset_path(base_dir: &Path, target: &str) -> Result<AssetPath, AssetPathError> {
    let without_query = match target.find('?') {
        Some(idx) => &target[..idx],
        None => target,
    };
    let relative = without_query.trim_start_matches('/');
    if relative.is_empty() {
        return Err(AssetPathError::Empty);
    }
    if relative.contains('\\') {
        return Err(AssetPathError::Traversal);
    }

    let candidate = Path::new(relative);
    if !candidate
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return Err(AssetPathError::Traversal);
    }

    let extension = candidate
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !HTTP_PERMITTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AssetPathError::ForbiddenExtension(extension));
    }

    Ok(AssetPath {
        path: base_dir.join(candidate),
        extension,
    })
}

/// Returns the `Content-Type` for a permitted extension (lowercase, no dot).
///
/// Unknown extensions fall back to `text/plain`, matching the responder's
/// treatment of plain text assets.
#[must_use]
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "text/javascript",
        "json" => "application/json",
        "webmanifest" => "application/manifest+json",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "ico" => "image/x-icon",
        "ttf" => "font/ttf",
        _ => "text/plain",
    }
}
