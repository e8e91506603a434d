//! Media object keys, CDN URLs and upload validation.
//!
//! Every uploaded file lives under `<prefix>/<owner>/<id>.<ext>` in the
//! bucket and is served from `<cdn base>/<key>`.

use serde::{Deserialize, Serialize};

use crate::{Error, ResourceId, Result};

/// Extensions accepted for uploaded images, after normalization.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "png", "webp", "gif", "avif", "svg"];

/// The content area a media object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Banner,
    Curriculum,
    News,
    Facility,
}

impl MediaKind {
    /// Key prefix in the bucket.
    pub fn prefix(&self) -> &'static str {
        match self {
            MediaKind::Banner => "banners",
            MediaKind::Curriculum => "curriculum",
            MediaKind::News => "news",
            MediaKind::Facility => "facilities",
        }
    }
}

/// Lowercased, normalized extension of a file name.
pub fn normalized_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    let ext = ext.to_ascii_lowercase();
    Some(if ext == "jpeg" { "jpg".to_string() } else { ext })
}

/// Build a fresh object key for an upload.
pub fn object_key(kind: MediaKind, owner: ResourceId, file_name: &str) -> Result<String> {
    let ext = normalized_extension(file_name)
        .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| Error::UnsupportedType(file_name.to_string()))?;
    Ok(format!(
        "{}/{}/{}.{}",
        kind.prefix(),
        owner,
        ResourceId::new(),
        ext
    ))
}

/// Public URL of an object key.
pub fn cdn_url(base: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}

/// Recover the object key from a public URL, if it was served from `base`.
pub fn key_from_cdn_url(base: &str, url: &str) -> Option<String> {
    let base = base.trim_end_matches('/');
    let rest = url.strip_prefix(base)?.strip_prefix('/')?;
    if rest.is_empty() {
        None
    } else {
        Some(rest.to_string())
    }
}

/// Check an upload before any bytes are sent to storage.
pub fn validate_upload(file_name: &str, content_type: &str, size: usize, max: usize) -> Result<()> {
    if size == 0 {
        return Err(Error::EmptyFile(file_name.to_string()));
    }
    if size > max {
        return Err(Error::TooLarge {
            file: file_name.to_string(),
            size,
            max,
        });
    }
    if !content_type.starts_with("image/") {
        return Err(Error::NotAnImage {
            file: file_name.to_string(),
            content_type: content_type.to_string(),
        });
    }
    match normalized_extension(file_name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(Error::UnsupportedType(file_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_layout() {
        let owner = ResourceId::new();
        let key = object_key(MediaKind::Facility, owner, "Quadra Coberta.JPEG").unwrap();
        let parts: Vec<&str> = key.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "facilities");
        assert_eq!(parts[1], owner.to_string());
        assert!(parts[2].ends_with(".jpg"));
    }

    #[test]
    fn test_object_key_rejects_unknown_extension() {
        let result = object_key(MediaKind::News, ResourceId::new(), "notes.exe");
        assert!(matches!(result, Err(Error::UnsupportedType(_))));
        assert!(object_key(MediaKind::News, ResourceId::new(), "noextension").is_err());
    }

    #[test]
    fn test_cdn_url_joins_with_single_slash() {
        assert_eq!(
            cdn_url("https://cdn.example.edu/", "/news/a/b.png"),
            "https://cdn.example.edu/news/a/b.png"
        );
        assert_eq!(
            cdn_url("https://cdn.example.edu", "news/a/b.png"),
            "https://cdn.example.edu/news/a/b.png"
        );
    }

    #[test]
    fn test_key_from_cdn_url() {
        let base = "https://cdn.example.edu";
        assert_eq!(
            key_from_cdn_url(base, "https://cdn.example.edu/banners/x/y.webp").as_deref(),
            Some("banners/x/y.webp")
        );
        assert_eq!(key_from_cdn_url(base, "https://other.example/banners/y.webp"), None);
        assert_eq!(key_from_cdn_url(base, "https://cdn.example.edu/"), None);
        // A host that merely starts with the base is not under it.
        assert_eq!(key_from_cdn_url(base, "https://cdn.example.edu.evil/x.png"), None);
    }

    #[test]
    fn test_validate_upload() {
        let max = 1024;
        assert!(validate_upload("a.png", "image/png", 10, max).is_ok());
        assert!(validate_upload("a.png", "image/png", 0, max).is_err());
        assert!(validate_upload("a.png", "image/png", 2048, max).is_err());
        assert!(validate_upload("a.png", "application/pdf", 10, max).is_err());
        assert!(validate_upload("a.bmp", "image/bmp", 10, max).is_err());
    }
}
