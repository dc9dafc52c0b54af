//! File and folder name sanitization.
//!
//! Everything here is a pure function over Unicode scalar values so it can be
//! tested without touching the filesystem.

use url::Url;

/// Longest stem, in UTF-8 bytes, kept for a downloaded file.
pub const MAX_NAME_BYTES: usize = 50;

/// Stem used when sanitization leaves nothing behind.
pub const PLACEHOLDER_NAME: &str = "unknown_filename";

/// Extension used when neither the name nor the URL provide one.
pub const FALLBACK_EXTENSION: &str = ".bin";

/// Characters that cannot appear in a file name on common filesystems.
const FORBIDDEN_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Longest extension (without the dot) accepted from a name or URL.
const MAX_EXTENSION_LEN: usize = 10;

/// Cut `s` to at most `max_bytes` bytes without splitting a character.
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Split a name into stem and extension (including the dot).
///
/// The extension is taken from the last path component only, and a leading
/// dot (as in `.hidden`) does not start an extension.
pub fn split_extension(name: &str) -> (&str, &str) {
    let base_start = name
        .rfind(['/', '\\'])
        .map(|i| i + 1)
        .unwrap_or(0);
    let base = &name[base_start..];

    match base.rfind('.') {
        Some(dot) if base[..dot].chars().any(|c| c != '.') => {
            let split = base_start + dot;
            (&name[..split], &name[split..])
        }
        _ => (name, ""),
    }
}

/// Decode percent-encoded text, keeping the input when it is not valid UTF-8.
pub fn decode_name(name: &str) -> String {
    urlencoding::decode(name)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| name.to_string())
}

/// Replace forbidden and control characters, collapse runs of separators and
/// trim separators from both ends.
fn clean_component(value: &str) -> String {
    let mut cleaned = String::with_capacity(value.len());
    let mut last_was_separator = false;

    for c in value.chars() {
        let is_separator =
            c == '_' || c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(&c);
        if is_separator {
            if !last_was_separator {
                cleaned.push('_');
            }
            last_was_separator = true;
        } else {
            cleaned.push(c);
            last_was_separator = false;
        }
    }

    cleaned.trim_matches(|c: char| c == '_' || c == ' ').to_string()
}

/// Sanitize the stem of an original file name for use on disk.
///
/// Decodes URL encoding, drops the extension, replaces invalid characters,
/// collapses separators and limits the result to [`MAX_NAME_BYTES`] bytes.
pub fn adapt_file_name(name: &str) -> String {
    let decoded = decode_name(name);
    let (stem, _) = split_extension(&decoded);

    let cleaned = clean_component(stem);
    let truncated = truncate_utf8(&cleaned, MAX_NAME_BYTES);
    let truncated = truncated.trim_end_matches('_');

    if truncated.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        truncated.to_string()
    }
}

/// Accept an extension only if it is a short alphanumeric suffix.
fn clean_extension(ext: &str) -> Option<String> {
    let body = ext.strip_prefix('.')?;
    if body.is_empty()
        || body.len() > MAX_EXTENSION_LEN
        || !body.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }

    if body.eq_ignore_ascii_case("jpeg") {
        Some(".jpg".to_string())
    } else {
        Some(format!(".{}", body))
    }
}

/// Extension of the last segment of a URL path.
fn url_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?.to_string();
    let (_, ext) = split_extension(&last);
    clean_extension(ext)
}

/// Pick the extension for a download.
///
/// Order of preference: the original name, the URL path, then `.bin`.
/// `.jpeg` is normalized to `.jpg`.
pub fn file_extension(original_name: &str, url: &str) -> String {
    let decoded = decode_name(original_name.trim());
    let (_, ext) = split_extension(&decoded);

    clean_extension(ext)
        .or_else(|| url_extension(url))
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// Stable on-disk name of the `index`-th (1-based) file of a post.
pub fn numbered_file_name(index: usize, original_name: &str, url: &str) -> String {
    let stem = if original_name.trim().is_empty() {
        index.to_string()
    } else {
        adapt_file_name(original_name)
    };
    format!("{}-{}{}", index, stem, file_extension(original_name, url))
}

/// Sanitize a post title for use in a folder name.
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| {
            if FORBIDDEN_CHARS.contains(&c) || c == '.' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    replaced.trim().trim_end_matches('.').to_string()
}

/// Sanitize a creator name, service or id for use as a folder name.
pub fn sanitize_folder_name(value: &str) -> String {
    let replaced: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    // A bare "." or ".." would escape the parent folder.
    if replaced.chars().all(|c| c == '.') {
        replaced.replace('.', "_")
    } else {
        replaced
    }
}
