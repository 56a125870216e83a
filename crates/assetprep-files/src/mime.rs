//! MIME type detection from content and from paths.

use std::path::Path;

/// Generic type used when nothing more specific is known.
pub const FALLBACK_MIME: &str = "application/octet-stream";
/// Type carried by gzip-derived files.
pub const GZIP_MIME: &str = "application/gzip";
/// Type assumed for names without an extension (`LICENSE`, `CNAME`).
pub const EXTENSIONLESS_MIME: &str = "text/plain";

/// Bytes read from the start of a file for magic-number sniffing.
pub const SNIFF_LEN: usize = 8 * 1024;

/// Whether `mime` names a concrete type rather than the generic fallback.
#[must_use]
pub fn is_concrete(mime: &str) -> bool {
    !mime.is_empty() && mime != FALLBACK_MIME
}

/// Identify content from its leading bytes. `None` when no binary signature
/// matches.
///
/// Text signatures (XML prologs, shebangs, HTML) are ignored: they cannot
/// tell `icon.svg` from `feed.rss` or `cli.js` from a shell script, so the
/// path decides for text content.
#[must_use]
pub fn sniff(head: &[u8]) -> Option<&'static str> {
    infer::get(head)
        .filter(|kind| !matches!(kind.matcher_type(), infer::MatcherType::Text))
        .map(|kind| kind.mime_type())
}

/// Guess a MIME type from a logical or local path.
///
/// A trailing `.gz` is ignored so `app.js.gz` guesses as JavaScript.
#[must_use]
pub fn guess_from_path(path: &str) -> &'static str {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let name = name.strip_suffix(".gz").unwrap_or(name);
    match Path::new(name).extension().and_then(|ext| ext.to_str()) {
        None => EXTENSIONLESS_MIME,
        Some(ext) => from_extension(&ext.to_ascii_lowercase()),
    }
}

fn from_extension(ext: &str) -> &'static str {
    match ext {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" | "map" => "application/json",
        "webmanifest" => "application/manifest+json",
        "xml" => "application/xml",
        "rss" => "application/rss+xml",
        "atom" => "application/atom+xml",
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "appcache" => "text/cache-manifest",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",
        "pdf" => "application/pdf",
        "wasm" => "application/wasm",
        "zip" => "application/zip",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => FALLBACK_MIME,
    }
}
