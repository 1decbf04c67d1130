//! Built-in body transforms registered by the binary.
//!
//! These are collaborators of the rewrite layer, not part of it: the
//! interceptor only sees opaque `bytes -> bytes` functions. All three are
//! conservative whitespace collapsers; none attempts real minification.

use anyhow::Context;

const CSS_TIGHT: &[char] = &['{', '}', ';', ':', ',', '>'];

/// Collapses whitespace in an HTML body.
///
/// Runs of whitespace become a single space; whitespace touching a tag
/// bracket is dropped entirely, so `"<p>  hi  </p>"` becomes `"<p>hi</p>"`.
/// Errors on non-UTF-8 input.
pub fn collapse_html(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let text = std::str::from_utf8(input).context("HTML body is not valid UTF-8")?;

    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            pending_space = false;
            if !out.is_empty() && !out.ends_with('>') && ch != '<' {
                out.push(' ');
            }
        }
        out.push(ch);
    }

    Ok(out.into_bytes())
}

/// Strips `/* ... */` comments from a CSS body and collapses whitespace,
/// dropping spaces next to punctuation that never needs them.
pub fn collapse_css(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let text = std::str::from_utf8(input).context("CSS body is not valid UTF-8")?;

    let mut stripped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        stripped.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                // Unterminated comment swallows the remainder
                rest = "";
                break;
            }
        }
    }
    stripped.push_str(rest);

    let mut out = String::with_capacity(stripped.len());
    let mut pending_space = false;

    for ch in stripped.chars() {
        if ch.is_ascii_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            pending_space = false;
            let prev_tight = out.chars().last().is_none_or(|p| CSS_TIGHT.contains(&p));
            if !prev_tight && !CSS_TIGHT.contains(&ch) {
                out.push(' ');
            }
        }
        out.push(ch);
    }

    Ok(out.into_bytes())
}

/// Drops blank lines and trailing whitespace from a JavaScript body.
///
/// Deliberately timid: whitespace inside a line can be significant (strings,
/// regex literals), so lines are only trimmed at the end. Not safe for code
/// relying on multi-line template literals keeping their blank lines.
pub fn collapse_js(input: &[u8]) -> anyhow::Result<Vec<u8>> {
    let text = std::str::from_utf8(input).context("JS body is not valid UTF-8")?;

    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }

    Ok(out.into_bytes())
}
