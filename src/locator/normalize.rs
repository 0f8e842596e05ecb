//! Text normalization
//!
//! One policy for node text and queries alike: every run of whitespace
//! collapses to a single space, and leading/trailing whitespace is dropped.
//! No entity decoding, case folding or Unicode normalization is applied, so
//! offsets into the normalized text stay meaningful.

/// Characters treated as collapsible whitespace
fn is_collapsible(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r')
}

/// Collapse whitespace runs to a single space and trim both ends
pub fn normalize(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if is_collapsible(ch) {
            pending_space = !normalized.is_empty();
            continue;
        }
        if pending_space {
            normalized.push(' ');
            pending_space = false;
        }
        normalized.push(ch);
    }

    normalized
}
