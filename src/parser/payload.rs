//! Embedded array payloads inside findings and review-summary blocks.
//!
//! Arrays may span lines and contain colons, so their extent is found by
//! bracket balancing rather than by a delimiter. The balancing scan stops at
//! the first block marker outside a JSON string and at a line break inside
//! one. Neither can occur in a valid array.

use serde::de::DeserializeOwned;

use super::records::BlockKind;

/// Locate an array starting at `pos` (leading whitespace allowed).
/// Returns `(start, end)` where `end` is one past the closing bracket.
pub fn array_at(text: &str, pos: usize) -> Option<(usize, usize)> {
    let rest = text.get(pos..)?;
    let offset = rest.len() - rest.trim_start().len();
    let start = pos + offset;
    if text.as_bytes().get(start) != Some(&b'[') {
        return None;
    }
    array_end(text, start).map(|end| (start, end))
}

/// Index one past the bracket that closes the one at `start`.
/// `[`/`{` nesting is tracked together; brackets inside JSON strings are
/// ignored. `None` when the text ends, a block marker starts, or a string
/// runs past its line before the array closes.
pub fn array_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if b == b'\n' {
                return None;
            } else if escaped {
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
            b'C' | b'T' | b'L' | b'U' | b'R' if BlockKind::opening(&text[i..]).is_some() => {
                return None;
            }
            b'[' | b'{' => depth += 1,
            b']' | b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
    }
    None
}

pub fn decode_list<T: DeserializeOwned>(raw: &str) -> Result<Vec<T>, serde_json::Error> {
    serde_json::from_str(raw)
}
