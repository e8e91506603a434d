//! Regex-based HTML extraction and garbage heuristics.

use std::sync::LazyLock;

use campus_core::SearchDocument;
use regex::{Captures, Regex};
use url::Url;

/// Upper bound on indexed content per page, in characters.
pub const MAX_CONTENT_CHARS: usize = 5000;

static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());

static H1_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1\s*>").unwrap());

static COMMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());

// The regex crate has no backreferences, so each non-content block gets its own pattern.
static BLOCK_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["script", "style", "noscript", "nav", "footer", "header", "template", "svg"]
        .iter()
        .map(|tag| Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).unwrap())
        .collect()
});

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());

static ENTITY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").unwrap());

static HREF_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#).unwrap()
});

// Placeholder titles only count when they are the whole title, so real pages
// that merely mention "erro" or "loading" stay indexed.
static GARBAGE_TITLE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:erro|error)?\s*(?:404|not found|page not found|página não encontrada|error|erro|loading|carregando|untitled|sem título)(?:\s*[-:]\s*(?:not found|page not found|página não encontrada))?[\s.…!]*$",
    )
    .unwrap()
});

/// Page title: `<title>`, falling back to the first `<h1>`.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE_REGEX
        .captures(html)
        .map(|c| clean_text(&c[1]))
        .filter(|t| !t.is_empty())
        .or_else(|| {
            H1_REGEX
                .captures(html)
                .map(|c| clean_text(&c[1]))
                .filter(|t| !t.is_empty())
        })?;
    Some(strip_site_suffix(&raw))
}

/// Visible text of a page without navigation chrome, capped at
/// [`MAX_CONTENT_CHARS`].
pub fn extract_content(html: &str) -> String {
    let body = COMMENT_REGEX.replace_all(html, " ");
    let mut body = body.into_owned();
    for block in BLOCK_REGEXES.iter() {
        body = block.replace_all(&body, " ").into_owned();
    }
    // The title is indexed separately.
    let body = TITLE_REGEX.replace_all(&body, " ");
    let text = clean_text(&body);
    truncate_chars(&text, MAX_CONTENT_CHARS)
}

/// Every `href` of an anchor, resolved against `base`.
pub fn extract_links(base: &Url, html: &str) -> Vec<Url> {
    let html = COMMENT_REGEX.replace_all(html, " ");
    HREF_REGEX
        .captures_iter(&html)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| decode_entities(m.as_str().trim()))
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .filter_map(|href| base.join(&href).ok())
        .collect()
}

/// True when a title marks an error or placeholder page.
pub fn is_garbage_title(title: &str) -> bool {
    title.trim().is_empty() || GARBAGE_TITLE_REGEX.is_match(title)
}

/// Build the search document for a page, or `None` when it is not worth indexing.
pub fn page_document(url: &Url, html: &str, min_content_chars: usize) -> Option<SearchDocument> {
    let title = extract_title(html)?;
    if is_garbage_title(&title) {
        return None;
    }
    let content = extract_content(html);
    if content.chars().count() < min_content_chars {
        return None;
    }
    Some(SearchDocument {
        url: url.to_string(),
        title,
        content,
    })
}

fn clean_text(fragment: &str) -> String {
    let without_tags = TAG_REGEX.replace_all(fragment, " ");
    let decoded = decode_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_site_suffix(title: &str) -> String {
    for separator in [" | ", " - ", " – ", " — "] {
        if let Some((head, _)) = title.rsplit_once(separator) {
            let head = head.trim();
            if !head.is_empty() {
                return head.to_string();
            }
        }
    }
    title.to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// Decode numeric and the common named HTML entities.
pub fn decode_entities(text: &str) -> String {
    ENTITY_REGEX
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            decode_entity(entity).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let c = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "copy" => '©',
        "ndash" => '–',
        "mdash" => '—',
        "hellip" => '…',
        "aacute" => 'á',
        "agrave" => 'à',
        "acirc" => 'â',
        "atilde" => 'ã',
        "eacute" => 'é',
        "ecirc" => 'ê',
        "iacute" => 'í',
        "oacute" => 'ó',
        "ocirc" => 'ô',
        "otilde" => 'õ',
        "uacute" => 'ú',
        "ccedil" => 'ç',
        "Aacute" => 'Á',
        "Eacute" => 'É',
        "Iacute" => 'Í',
        "Oacute" => 'Ó',
        "Uacute" => 'Ú',
        "Ccedil" => 'Ç',
        _ => return None,
    };
    Some(c.to_string())
}
