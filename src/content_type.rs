use crate::naming::extension;
use std::path::Path;

/// Content type used when the extension is unknown or missing.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type for `path`, looked up by its (case-insensitive) extension.
pub fn content_type(path: &Path) -> String {
    let ext = extension(path).to_lowercase();
    match ext.strip_prefix('.') {
        Some(ext) if !ext.is_empty() => mime_guess::from_ext(ext)
            .first()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| OCTET_STREAM.to_owned()),
        _ => OCTET_STREAM.to_owned(),
    }
}
