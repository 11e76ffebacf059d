use std::path::Path;

/// Bytes for a new person's uploaded photo, keyed by the filename it will be
/// stored under in the output archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoPayload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// A photo that supersedes an existing person's archive entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoReplacement {
    pub new_file: Vec<u8>,
    pub new_filename: String,
    /// The `ProfilePhoto` value the person had when loaded, if any.
    pub original_filename: Option<String>,
}

/// Identity key for photo files: the last path segment, lowercased.
///
/// Both archive lookup and export reconciliation compare names through this
/// function, so `photos/Jane.JPG` and `jane.jpg` are the same photo.
pub fn photo_key(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    base.to_lowercase()
}

pub fn same_photo(a: &str, b: &str) -> bool {
    photo_key(a) == photo_key(b)
}

/// `first-last` with every character outside `[A-Za-z0-9-]` replaced by `_`.
pub fn photo_slug(first: &str, last: &str) -> String {
    format!("{first}-{last}")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

const FALLBACK_EXTENSION: &str = "jpg";

/// Target filename for an uploaded photo: the person slug plus the uploaded
/// file's extension. Uploads without a plain alphanumeric extension are
/// stored as `.jpg`.
pub fn photo_filename(first: &str, last: &str, uploaded_name: &str) -> String {
    let ext = Path::new(uploaded_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or(FALLBACK_EXTENSION);
    format!("{}.{ext}", photo_slug(first, last))
}
