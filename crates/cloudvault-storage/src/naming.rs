//! Naming helpers: opaque blob ids, MIME guessing from file names, and
//! archive entry-name sanitizing.

use std::collections::HashSet;

use uuid::Uuid;

/// Longest archive entry name segment, in bytes.
pub const MAX_ENTRY_NAME_BYTES: usize = 255;

const FALLBACK_ENTRY_NAME: &str = "unnamed";

/// Generate a new opaque blob id. Never derived from the user's file name.
pub fn new_blob_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Guess a MIME type from a file name's extension.
pub fn mime_from_path(path: &str) -> Option<String> {
    let (_, ext) = path.rsplit_once('.')?;
    let mime = match ext.to_lowercase().as_str() {
        "txt" | "log" => "text/plain",
        "md" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" => "application/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "tar" => "application/x-tar",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => return None,
    };
    Some(mime.to_string())
}

/// Make a user-supplied name safe as a single archive path segment.
///
/// Path separators, characters reserved on common filesystems, and control
/// characters become `_`; runs of `_` collapse to one; surrounding
/// whitespace is trimmed; the result is cut to [`MAX_ENTRY_NAME_BYTES`] on a
/// character boundary. Names that end up empty or as `.`/`..` become
/// `unnamed`.
pub fn sanitize_entry_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        let ch = if matches!(ch, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || ch.is_control() {
            '_'
        } else {
            ch
        };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }

    let trimmed = truncate_bytes(out.trim(), MAX_ENTRY_NAME_BYTES).trim_end();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        FALLBACK_ENTRY_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Return `name`, or the first of `stem (1).ext`, `stem (2).ext`, … not yet
/// in `taken`, and record the choice in `taken`.
pub fn unique_entry_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let mut n = 1u64;
    loop {
        let suffix = match ext {
            Some(ext) => format!(" ({n}).{ext}"),
            None => format!(" ({n})"),
        };
        let room = MAX_ENTRY_NAME_BYTES.saturating_sub(suffix.len());
        let candidate = format!("{}{suffix}", truncate_bytes(stem, room));
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
