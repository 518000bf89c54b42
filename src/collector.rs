//! Span collector: runs every detector and merges their candidates
//!
//! Detectors are independent, so they are polled concurrently. Results are
//! concatenated in detector order, which keeps resolution deterministic: on
//! an exact tie the resolver keeps the span from the earlier detector.

use crate::config::ShieldConfig;
use crate::error::{Result, ShieldError};
use crate::provider::EntityDetector;
use crate::types::{Diagnostic, DiagnosticKind, Span};
use futures::future::try_join_all;
use std::sync::Arc;

/// Ordered set of detectors
#[derive(Clone, Default)]
pub struct SpanCollector {
    detectors: Vec<Arc<dyn EntityDetector>>,
}

impl SpanCollector {
    pub fn new(detectors: Vec<Arc<dyn EntityDetector>>) -> Self {
        Self { detectors }
    }

    /// Append a detector
    pub fn with_detector(mut self, detector: impl EntityDetector + 'static) -> Self {
        self.detectors.push(Arc::new(detector));
        self
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Detector names in evaluation order
    pub fn names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run all detectors over `text`
    ///
    /// Any detector failure fails the whole collection as a dependency error.
    pub async fn collect(&self, text: &str) -> Result<Vec<Span>> {
        let runs = self.detectors.iter().map(|detector| async move {
            let spans = detector.detect(text).await.map_err(|e| {
                tracing::warn!(detector = detector.name(), error = %e, "Detector failed");
                e.attribute(detector.name())
            })?;
            Ok::<_, ShieldError>(
                spans
                    .into_iter()
                    .map(|span| {
                        if span.source.is_empty() {
                            span.with_source(detector.name())
                        } else {
                            span
                        }
                    })
                    .collect::<Vec<_>>(),
            )
        });

        let per_detector = try_join_all(runs).await?;
        let spans: Vec<Span> = per_detector.into_iter().flatten().collect();
        tracing::debug!(
            detectors = self.detectors.len(),
            candidates = spans.len(),
            "Collected candidate spans"
        );
        Ok(spans)
    }
}

/// Drop spans whose text is on the configured stop list
pub fn filter_stop_terms(spans: Vec<Span>, config: &ShieldConfig) -> (Vec<Span>, Vec<Diagnostic>) {
    let mut kept = Vec::with_capacity(spans.len());
    let mut diagnostics = Vec::new();
    for span in spans {
        if config.is_stop_term(&span.text) {
            tracing::debug!(start = span.start, end = span.end, "Span dropped by stop list");
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::StopTerm,
                &span,
                format!("'{}' is a stop term", span.text),
            ));
        } else {
            kept.push(span);
        }
    }
    (kept, diagnostics)
}
