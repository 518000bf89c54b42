//! Substitution engine: writes replacements into a fresh buffer

use crate::types::{PlaceholderMap, ResolvedSpans};

/// Replace every mapped span of `text`, working right to left
///
/// Offsets come from the immutable span list, and later spans are edited
/// first, so earlier offsets stay valid. Spans without a mapping are left
/// untouched, as is everything outside the replaced ranges.
pub fn substitute(text: &str, spans: &ResolvedSpans, placeholders: &PlaceholderMap) -> String {
    let mut result = text.to_string();
    for span in spans.iter().rev() {
        if let Some(replacement) = placeholders.get(&span.text) {
            result.replace_range(span.start..span.end, &replacement.rendered());
        }
    }
    result
}
