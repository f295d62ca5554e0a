//! Extraction of the season payload streamed into a server-rendered page.
//!
//! The statistics page hydrates its client with streamed data: each
//! `<script>` pushes one JS string literal via
//! `self.__next_f.push([1,"..."])`. The season payload is the first such
//! literal mentioning both `seasonResult` and `raceResults`. Once unescaped,
//! it holds a `{"seasonResult": ...}` object embedded in unrelated framing,
//! which is cut out with a string-aware brace matcher and decoded.

use pitwall_core::error::AppError;
use pitwall_core::models::SeasonBlob;
use pitwall_core::traits::BlobExtractor;
use scraper::{Html, Selector};

const PUSH_CALL: &str = "self.__next_f.push([1,\"";
const SEASON_MARKER: &str = "seasonResult";
const RESULTS_MARKER: &str = "raceResults";
const OBJECT_START: &str = "{\"seasonResult\"";

/// [`BlobExtractor`] for pages that stream their data as flight fragments.
#[derive(Debug, Clone, Default)]
pub struct FlightBlobExtractor;

impl FlightBlobExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl BlobExtractor for FlightBlobExtractor {
    fn extract(&self, html: &str) -> Result<SeasonBlob, AppError> {
        let fragments = flight_fragments(html)?;
        tracing::debug!(fragments = fragments.len(), "Scanned streamed fragments");

        let literal = fragments
            .iter()
            .find(|f| f.contains(SEASON_MARKER) && f.contains(RESULTS_MARKER))
            .ok_or_else(|| {
                AppError::ExtractionError("Could not find embedded seasonResult blob".into())
            })?;

        let raw = unescape_js(literal)?;
        let start = raw.find(OBJECT_START).ok_or_else(|| {
            AppError::ExtractionError("Could not locate seasonResult object in blob".into())
        })?;
        let end = matching_brace(&raw, start).ok_or_else(|| {
            AppError::ExtractionError("Unbalanced braces in seasonResult object".into())
        })?;

        tracing::debug!(bytes = end + 1 - start, "Decoding seasonResult object");
        Ok(serde_json::from_str(&raw[start..=end])?)
    }
}

/// Escaped literals passed to `self.__next_f.push([1, ...])`, in page order.
pub fn flight_fragments(html: &str) -> Result<Vec<String>, AppError> {
    let document = Html::parse_document(html);
    let scripts = Selector::parse("script")
        .map_err(|e| AppError::ExtractionError(format!("Invalid selector: {e}")))?;

    let mut fragments = Vec::new();
    for script in document.select(&scripts) {
        let text: String = script.text().collect();
        let mut rest = text.as_str();
        while let Some(at) = rest.find(PUSH_CALL) {
            let body = &rest[at + PUSH_CALL.len()..];
            match literal_end(body) {
                Some(end) => {
                    fragments.push(body[..end].to_string());
                    rest = &body[end + 1..];
                }
                None => break,
            }
        }
    }
    Ok(fragments)
}

/// Byte offset of the closing `"` of a JS string literal whose opening quote
/// has already been consumed.
fn literal_end(body: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, b) in body.bytes().enumerate() {
        if escaped {
            escaped = false;
        } else if b == b'\\' {
            escaped = true;
        } else if b == b'"' {
            return Some(i);
        }
    }
    None
}

/// Reverse JS string-literal escaping.
pub fn unescape_js(literal: &str) -> Result<String, AppError> {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            return Err(AppError::ExtractionError("Dangling backslash in literal".into()));
        };
        match escape {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            // Line continuation.
            '\n' | '\u{2028}' | '\u{2029}' => {}
            '\r' => {
                let mut ahead = chars.clone();
                if ahead.next() == Some('\n') {
                    chars = ahead;
                }
            }
            'x' => {
                let code = read_hex(&mut chars, 2)?;
                out.push(char_from(code));
            }
            'u' => {
                let code = read_unicode_escape(&mut chars)?;
                if (0xD800..0xDC00).contains(&code) {
                    let mut ahead = chars.clone();
                    let low = match (ahead.next(), ahead.next()) {
                        (Some('\\'), Some('u')) => read_unicode_escape(&mut ahead).ok(),
                        _ => None,
                    };
                    match low {
                        Some(low) if (0xDC00..0xE000).contains(&low) => {
                            chars = ahead;
                            out.push(char_from(
                                0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00),
                            ));
                        }
                        _ => out.push(char::REPLACEMENT_CHARACTER),
                    }
                } else {
                    out.push(char_from(code));
                }
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

fn char_from(code: u32) -> char {
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

/// `XXXX` or `{X...}` after `\u`.
fn read_unicode_escape(chars: &mut std::str::Chars<'_>) -> Result<u32, AppError> {
    let mut ahead = chars.clone();
    if ahead.next() != Some('{') {
        return read_hex(chars, 4);
    }
    let mut code: u32 = 0;
    let mut digits = 0;
    loop {
        match ahead.next() {
            Some('}') if digits > 0 && code <= 0x10FFFF => {
                *chars = ahead;
                return Ok(code);
            }
            Some(c) => {
                let digit = c.to_digit(16).ok_or_else(bad_escape)?;
                code = code.saturating_mul(16).saturating_add(digit);
                digits += 1;
            }
            None => return Err(bad_escape()),
        }
    }
}

fn read_hex(chars: &mut std::str::Chars<'_>, len: usize) -> Result<u32, AppError> {
    let mut code = 0;
    for _ in 0..len {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(bad_escape)?;
        code = code * 16 + digit;
    }
    Ok(code)
}

fn bad_escape() -> AppError {
    AppError::ExtractionError("Malformed escape sequence in literal".into())
}

/// Index of the `}` closing the object that opens at `open`, skipping braces
/// inside JSON string literals.
pub fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
