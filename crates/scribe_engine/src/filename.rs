use std::path::Path;

use sha2::{Digest, Sha256};

use crate::{BackendError, FailureKind};

/// Accepts only a bare file name: no separators, no parent references.
pub fn validate_document_filename(name: &str) -> Result<&str, BackendError> {
    let trimmed = name.trim();
    let rejected = trimmed.is_empty()
        || trimmed.contains("..")
        || trimmed.contains('/')
        || trimmed.contains('\\')
        || trimmed.chars().any(|c| c.is_control());
    if rejected {
        return Err(BackendError::new(
            FailureKind::InvalidFilename,
            format!("refusing document filename {name:?}"),
        ));
    }
    Ok(trimmed)
}

/// Windows-safe, deterministic transcript name: `{sanitized_stem}--{short_hash(handle)}.txt`
pub fn transcript_filename(original_filename: &str, server_handle: &str) -> String {
    let stem = Path::new(original_filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("page");
    let sanitized = sanitize_stem(stem);
    let hash = short_hash(server_handle);
    format!("{sanitized}--{hash}.txt")
}

fn sanitize_stem(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if cleaned.is_empty() {
        return "page".to_string();
    }
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }
    if compacted.len() > 80 {
        let mut cut = 80;
        while !compacted.is_char_boundary(cut) {
            cut -= 1;
        }
        compacted.truncate(cut);
    }
    if is_reserved_windows_name(&compacted) {
        compacted.push('_');
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    use std::fmt::Write;

    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
