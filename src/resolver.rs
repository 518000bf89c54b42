//! Span resolver: validation and overlap resolution
//!
//! Greedy longest-first interval scheduling: candidates are sorted by
//! `(start asc, length desc)` and swept left to right, keeping a span only
//! when it starts at or after the end of the last kept span.

use crate::types::{Diagnostic, DiagnosticKind, ResolvedSpans, Span};

/// Result of resolving a candidate set
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub spans: ResolvedSpans,
    /// Malformed candidates that were dropped
    pub diagnostics: Vec<Diagnostic>,
    /// Valid candidates discarded because they overlapped a kept span
    pub overlapped: usize,
}

/// Check a candidate against the text it claims to come from
pub fn validate_span(text: &str, span: &Span) -> Result<(), String> {
    if span.start >= span.end {
        return Err(format!("empty or inverted range {}..{}", span.start, span.end));
    }
    if span.end > text.len() {
        return Err(format!(
            "range {}..{} exceeds text length {}",
            span.start,
            span.end,
            text.len()
        ));
    }
    if !text.is_char_boundary(span.start) || !text.is_char_boundary(span.end) {
        return Err(format!(
            "range {}..{} splits a character",
            span.start, span.end
        ));
    }
    if text[span.start..span.end] != span.text {
        return Err(format!(
            "surface '{}' does not match text at {}..{}",
            span.text, span.start, span.end
        ));
    }
    Ok(())
}

/// Resolve candidates into a non-overlapping, start-ordered sequence
///
/// Malformed spans are dropped with a diagnostic rather than failing the
/// call. The sort is stable, so for identical ranges the earlier candidate
/// wins.
pub fn resolve_spans(text: &str, candidates: Vec<Span>) -> Resolution {
    let mut diagnostics = Vec::new();
    let mut valid = Vec::with_capacity(candidates.len());

    for span in candidates {
        match validate_span(text, &span) {
            Ok(()) => valid.push(span),
            Err(reason) => {
                tracing::warn!(
                    source = %span.source,
                    start = span.start,
                    end = span.end,
                    reason = %reason,
                    "Dropping malformed span"
                );
                diagnostics.push(Diagnostic::new(DiagnosticKind::MalformedSpan, &span, reason));
            }
        }
    }

    valid.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.len().cmp(&a.len())));

    let total = valid.len();
    let mut accepted: Vec<Span> = Vec::with_capacity(total);
    let mut last_end = 0usize;
    for span in valid {
        if span.start >= last_end {
            last_end = span.end;
            accepted.push(span);
        }
    }

    let overlapped = total - accepted.len();
    tracing::debug!(
        accepted = accepted.len(),
        overlapped,
        malformed = diagnostics.len(),
        "Resolved spans"
    );

    Resolution {
        spans: ResolvedSpans::from_sorted(accepted),
        diagnostics,
        overlapped,
    }
}
