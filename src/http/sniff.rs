//! Content-type sniffing for responses whose handler never declared one.
//!
//! This is a deliberately small fallback, not a full MIME detection engine:
//! a handful of HTML document prefixes, a binary-byte scan, and two generic
//! defaults. A declared `Content-Type` header always takes precedence; the
//! sink only sniffs when the handler stayed silent.

/// HTML prefixes checked case-insensitively against the start of the body.
const HTML_PREFIXES: &[&str] = &[
    "<!doctype html", "<html", "<head", "<body", "<script", "<!--",
];

/// Guesses a content type from the first chunk of body bytes.
///
/// Returns `text/html` for recognizable HTML document openings,
/// `text/plain` for textual data, and `application/octet-stream` otherwise.
pub fn detect_content_type(data: &[u8]) -> &'static str {
    let trimmed = skip_leading_whitespace(data);

    if let Ok(text) = std::str::from_utf8(trimmed) {
        for prefix in HTML_PREFIXES {
            if starts_with_ignore_case(text, prefix) {
                return "text/html; charset=utf-8";
            }
        }
    }

    if looks_binary(data) {
        return "application/octet-stream";
    }

    match std::str::from_utf8(data) {
        Ok(_) => "text/plain; charset=utf-8",
        Err(_) => "application/octet-stream",
    }
}

fn skip_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    &data[start..]
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len() && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// A byte sequence is considered binary if it contains control characters
/// outside the usual text set (tab, newline, form feed, carriage return, ESC).
fn looks_binary(data: &[u8]) -> bool {
    data.iter()
        .any(|&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | 0x0c | b'\r' | 0x1b) || b == 0x7f)
}
