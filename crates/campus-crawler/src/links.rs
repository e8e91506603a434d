//! URL normalization and the follow policy.

use url::Url;

/// Extensions of resources that are never HTML pages.
const SKIPPED_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "webp", "avif", "svg", "ico", "bmp", "zip", "rar", "7z",
    "gz", "tar", "mp3", "mp4", "webm", "mov", "avi", "wav", "css", "js", "json", "xml", "txt",
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "woff", "woff2", "ttf",
];

/// Canonical form used for the visited set.
///
/// Drops the fragment and an empty query, and the trailing slash of any path
/// other than the root.
pub fn normalize(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    if url.query() == Some("") {
        url.set_query(None);
    }
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(if trimmed.is_empty() { "/" } else { &trimmed });
    }
    url
}

/// Whether a link should be crawled from a site rooted at `start`.
pub fn should_follow(url: &Url, start: &Url, exclude: &[String]) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    if url.host_str() != start.host_str()
        || url.port_or_known_default() != start.port_or_known_default()
    {
        return false;
    }

    let path = url.path();
    let excluded = exclude.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        !prefix.is_empty()
            && (path == prefix
                || path
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/')))
    });
    if excluded {
        return false;
    }

    match path.rsplit('/').next().and_then(|segment| segment.rsplit_once('.')) {
        Some((_, ext)) => !SKIPPED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => true,
    }
}
