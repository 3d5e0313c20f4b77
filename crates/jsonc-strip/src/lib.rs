//! JSONC to JSON conversion for grammar and catalogue files.
//!
//! Supports:
//! - `//` line comments
//! - `/* ... */` block comments (newlines inside are kept so that
//!   `serde_json` error positions still point at the original line)
//! - trailing commas before `]` or `}`
//! - string literal preservation (including escapes)

/// Strip `//` and `/* */` comments from JSONC input.
///
/// Comment text is removed but every newline it contained is kept, so line
/// numbers reported by a later JSON parse match the JSONC source.
#[must_use]
pub fn strip_jsonc(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut copied = 0usize;
    let mut i = 0usize;
    let mut in_str = false;

    while i < bytes.len() {
        let b = bytes[i];

        if in_str {
            match b {
                b'\\' => i += 2,
                b'"' => {
                    in_str = false;
                    i += 1;
                }
                _ => i += 1,
            }
            continue;
        }

        match (b, bytes.get(i + 1)) {
            (b'"', _) => {
                in_str = true;
                i += 1;
            }
            (b'/', Some(b'/')) => {
                out.push_str(&input[copied..i]);
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                copied = i;
            }
            (b'/', Some(b'*')) => {
                out.push_str(&input[copied..i]);
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    if bytes[i] == b'\n' {
                        out.push('\n');
                    }
                    i += 1;
                }
                i = (i + 2).min(bytes.len());
                copied = i;
            }
            _ => i += 1,
        }
    }

    out.push_str(&input[copied.min(input.len())..]);
    out
}

/// Remove commas that directly precede a closing `]` or `}` (ignoring
/// whitespace). Input must already be comment-free.
#[must_use]
pub fn strip_trailing_commas(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut copied = 0usize;
    let mut in_str = false;
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if in_str {
            match b {
                b'\\' => i += 2,
                b'"' => {
                    in_str = false;
                    i += 1;
                }
                _ => i += 1,
            }
            continue;
        }
        if b == b'"' {
            in_str = true;
        } else if b == b',' {
            let next = bytes[i + 1..]
                .iter()
                .position(|c| !c.is_ascii_whitespace())
                .map(|p| bytes[i + 1 + p]);
            if matches!(next, Some(b']' | b'}')) {
                out.push_str(&input[copied..i]);
                copied = i + 1;
            }
        }
        i += 1;
    }

    out.push_str(&input[copied.min(input.len())..]);
    out
}

/// Convert JSONC text into plain JSON: comments first, then trailing commas.
#[must_use]
pub fn to_json(input: &str) -> String {
    strip_trailing_commas(&strip_jsonc(input))
}
