//! Backslash escape evaluation for character and string literals.
//!
//! Recognized sequences: `\a \b \f \n \r \t \v \\ \' \" \?`, three-digit
//! octal `\ooo`, and two-digit hex `\xHH`.

use thiserror::Error;

/// An escape sequence error at a specific byte offset of the literal body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at byte {offset})")]
pub struct EscapeError {
    /// Byte offset of the backslash within the content string.
    pub offset: usize,
    /// Human-readable description of the error.
    pub message: String,
}

/// Check every escape sequence in `content` without building the output.
///
/// Returns one error per bad sequence; scanning continues after each one.
pub fn validate_escapes(content: &str) -> Vec<EscapeError> {
    let mut errors = Vec::new();
    let mut i = 0;
    while let Some(rel) = content[i..].find('\\') {
        let at = i + rel;
        match decode_one(content, at) {
            Ok((_, next)) => i = next,
            Err(e) => {
                errors.push(e);
                i = at + 1 + content[at + 1..].chars().next().map_or(0, char::len_utf8);
            }
        }
        if i >= content.len() {
            break;
        }
    }
    errors
}

/// Replace escape sequences in `content` with the characters they denote.
///
/// Stops at the first malformed sequence.
pub fn evaluate_escape_codes(content: &str) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(content.len());
    let mut i = 0;
    while let Some(rel) = content[i..].find('\\') {
        let at = i + rel;
        out.push_str(&content[i..at]);
        let (ch, next) = decode_one(content, at)?;
        out.push(ch);
        i = next;
    }
    out.push_str(&content[i..]);
    Ok(out)
}

/// Decode the sequence whose backslash sits at byte `at`; returns the
/// character and the offset just past the sequence.
fn decode_one(content: &str, at: usize) -> Result<(char, usize), EscapeError> {
    let bytes = content.as_bytes();
    let Some(&kind) = bytes.get(at + 1) else {
        return Err(EscapeError {
            offset: at,
            message: "escape sequence ended prematurely".into(),
        });
    };

    let simple = match kind {
        b'a' => Some('\u{07}'),
        b'b' => Some('\u{08}'),
        b'f' => Some('\u{0C}'),
        b'n' => Some('\n'),
        b'r' => Some('\r'),
        b't' => Some('\t'),
        b'v' => Some('\u{0B}'),
        b'\\' => Some('\\'),
        b'\'' => Some('\''),
        b'"' => Some('"'),
        b'?' => Some('?'),
        _ => None,
    };
    if let Some(ch) = simple {
        return Ok((ch, at + 2));
    }

    let (digits, radix, start) = match kind {
        b'0'..=b'7' => (3, 8, at + 1),
        b'x' => (2, 16, at + 2),
        other => {
            let shown = content[at + 1..].chars().next().unwrap_or(other as char);
            return Err(EscapeError {
                offset: at,
                message: format!("unknown escape sequence '\\{shown}'"),
            });
        }
    };

    let end = start + digits;
    let body = bytes.get(start..end).ok_or_else(|| EscapeError {
        offset: at,
        message: "escape sequence ended prematurely".into(),
    })?;
    let mut value = 0u32;
    for &b in body {
        let digit = (b as char).to_digit(radix).ok_or_else(|| EscapeError {
            offset: at,
            message: format!(
                "invalid digit '{}' in {} escape",
                b as char,
                if radix == 8 { "octal" } else { "hex" }
            ),
        })?;
        value = value * radix + digit;
    }
    let ch = char::from_u32(value).ok_or_else(|| EscapeError {
        offset: at,
        message: format!("escape value {value} is not a character"),
    })?;
    Ok((ch, end))
}
