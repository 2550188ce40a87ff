//! Best-effort recovery of a JSON array from free-form model output.
//!
//! Models often wrap the requested JSON in prose or markdown fences, so the
//! reply is scanned for balanced `[...]` spans and the first one that
//! deserializes into the requested element type wins. `None` means no
//! usable structure was found; callers treat that as a soft failure.

use serde::de::DeserializeOwned;

/// Balanced bracket spans in order of their opening bracket.
fn array_spans(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();

    for (start, &b) in bytes.iter().enumerate() {
        if b != b'[' {
            continue;
        }
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (offset, &c) in bytes[start..].iter().enumerate() {
            if in_string {
                match c {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match c {
                b'"' => in_string = true,
                b'[' => depth += 1,
                b']' => {
                    depth -= 1;
                    if depth == 0 {
                        spans.push(&text[start..=start + offset]);
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    spans
}

pub fn first_json_array<T: DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    array_spans(text)
        .into_iter()
        .find_map(|span| serde_json::from_str::<Vec<T>>(span).ok())
}
