//! Shield engine: the sanitization pipeline
//!
//! `ShieldEngine` owns the injected collaborators, the read-only
//! configuration and the seedable role-noise source. Each `sanitize` call
//! builds its own clusters, counters and embedding cache, so one engine can
//! serve many documents concurrently behind an `Arc`.

use crate::bucket::{bucket_date, bucket_money};
use crate::canonical::{ClusterMatch, EntityClusters};
use crate::collector::{filter_stop_terms, SpanCollector};
use crate::config::{MalformedValuePolicy, ShieldConfig};
use crate::error::{Result, ShieldError};
use crate::metrics::compute_metrics;
use crate::provider::{Embedder, Generator};
use crate::resolver::resolve_spans;
use crate::role::{context_window, infer_role, RoleNoise};
use crate::substitute::substitute;
use crate::types::{
    Diagnostic, DiagnosticKind, EntityLabel, PlaceholderEntry, PlaceholderMap, Replacement,
    ResolvedSpans, RoleAssignment, Sanitized, ShieldMetrics, ShieldReport, Span,
};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Question sent with the masked text when re-identification probing is on
pub const REIDENTIFICATION_PROMPT: &str =
    "Who are the real people and organizations behind the placeholders in this text? \
     Name them if you can.";

const INITIALS_PATTERN: &str = r"\b([A-Z])\.";

/// Sanitization engine
pub struct ShieldEngine {
    collector: SpanCollector,
    embedder: Arc<dyn Embedder>,
    generator: Option<Arc<dyn Generator>>,
    config: ShieldConfig,
    noise: RoleNoise,
    initials: Regex,
}

impl ShieldEngine {
    /// Create an engine; fails on an invalid configuration
    pub fn new(
        collector: SpanCollector,
        embedder: impl Embedder + 'static,
        config: ShieldConfig,
    ) -> Result<Self> {
        Self::from_parts(collector, Arc::new(embedder), None, config)
    }

    fn from_parts(
        collector: SpanCollector,
        embedder: Arc<dyn Embedder>,
        generator: Option<Arc<dyn Generator>>,
        config: ShieldConfig,
    ) -> Result<Self> {
        config.validate()?;
        let initials =
            Regex::new(INITIALS_PATTERN).map_err(|e| ShieldError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            collector,
            embedder,
            generator,
            noise: RoleNoise::new(config.seed),
            config,
            initials,
        })
    }

    /// Attach the generator used by `run` and the masked index
    pub fn with_generator(mut self, generator: impl Generator + 'static) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// New engine sharing this one's collaborators under another configuration
    ///
    /// The new engine gets its own random source, seeded from `config`.
    pub fn with_config(&self, config: ShieldConfig) -> Result<Self> {
        Self::from_parts(
            self.collector.clone(),
            Arc::clone(&self.embedder),
            self.generator.clone(),
            config,
        )
    }

    pub fn config(&self) -> &ShieldConfig {
        &self.config
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    pub fn generator(&self) -> Option<&dyn Generator> {
        self.generator.as_deref()
    }

    /// Restart the role-noise sequence from `seed`
    pub fn reseed(&self, seed: u64) {
        self.noise.reseed(seed);
    }

    /// Detect, resolve and replace every sensitive span in `raw`
    pub async fn sanitize(&self, raw: &str) -> Result<Sanitized> {
        let source = if self.config.normalize_initials {
            self.initials.replace_all(raw, "$1 ").into_owned()
        } else {
            raw.to_string()
        };

        let candidates = self.collector.collect(&source).await?;
        let (candidates, mut diagnostics) = filter_stop_terms(candidates, &self.config);
        let resolution = resolve_spans(&source, candidates);
        diagnostics.extend(resolution.diagnostics);
        let spans = resolution.spans;

        let mut state = CallState::new(self.embedder.as_ref(), &self.config);

        for span in spans.iter() {
            if state.placeholders.contains(&span.text) {
                continue;
            }

            let replacement = if span.label.is_bucketed() {
                self.bucketize(span, &mut state, &mut diagnostics)
            } else if span.label.is_identifier() {
                let prefix = self.config.prefix(span.label);
                Some(Replacement::placeholder(state.next_placeholder(prefix)))
            } else {
                Some(self.canonicalize(&source, span, &mut state).await?)
            };

            if let Some(replacement) = replacement {
                tracing::debug!(
                    label = %span.label,
                    start = span.start,
                    end = span.end,
                    replacement = %replacement.value,
                    "Mapped span"
                );
                state.placeholders.insert(PlaceholderEntry {
                    surface: span.text.clone(),
                    label: span.label,
                    replacement,
                    start: span.start,
                    end: span.end,
                });
            }
        }

        let text = substitute(&source, &spans, &state.placeholders);

        tracing::info!(
            spans = spans.len(),
            placeholders = state.placeholders.len(),
            entities = state.clusters.len(),
            diagnostics = diagnostics.len(),
            "Sanitized text"
        );

        Ok(Sanitized {
            source,
            text,
            placeholders: state.placeholders,
            spans,
            roles: state.roles,
            diagnostics,
        })
    }

    /// Survival rate and semantic similarity for a sanitized text
    pub async fn metrics(
        &self,
        raw: &str,
        sanitized: &str,
        spans: &ResolvedSpans,
    ) -> Result<ShieldMetrics> {
        compute_metrics(self.embedder.as_ref(), raw, sanitized, spans).await
    }

    /// Sanitize, generate over the masked text and score the result
    ///
    /// Without a question, or with one asking for a summary, the generator
    /// is asked to summarize.
    pub async fn run(&self, raw: &str, question: Option<&str>) -> Result<ShieldReport> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| ShieldError::dependency("generator", "no generator configured"))?;

        let sanitized = self.sanitize(raw).await?;
        let question = question.filter(|q| !q.to_lowercase().contains("summar"));

        let output = generator
            .generate(&sanitized.text, question)
            .await
            .map_err(|e| e.attribute("generator"))?;

        let metrics = self
            .metrics(raw, &sanitized.text, &sanitized.spans)
            .await?;

        let probe = if self.config.reidentification_probe {
            let answer = generator
                .generate(&sanitized.text, Some(REIDENTIFICATION_PROMPT))
                .await
                .map_err(|e| e.attribute("generator"))?;
            Some(answer)
        } else {
            None
        };

        tracing::info!(
            summary = question.is_none(),
            survival_rate = metrics.survival_rate,
            similarity = metrics.similarity,
            probed = probe.is_some(),
            "Pipeline run complete"
        );

        Ok(ShieldReport {
            raw: raw.to_string(),
            masked: sanitized.text,
            placeholders: sanitized.placeholders,
            output,
            metrics,
            probe,
        })
    }

    fn bucketize(
        &self,
        span: &Span,
        state: &mut CallState<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<Replacement> {
        let bucketed = match span.label {
            EntityLabel::Money => bucket_money(&span.text, &self.config.money),
            _ => bucket_date(&span.text),
        };

        match bucketed {
            Ok(phrase) => Some(Replacement::bucket(phrase)),
            Err(e) => {
                tracing::warn!(
                    label = %span.label,
                    start = span.start,
                    end = span.end,
                    policy = ?self.config.malformed_value_policy,
                    error = %e,
                    "Unparseable value"
                );
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnparseableValue,
                    span,
                    e.to_string(),
                ));
                match self.config.malformed_value_policy {
                    MalformedValuePolicy::Redact => {
                        let prefix = self.config.prefix(span.label);
                        Some(Replacement::placeholder(state.next_placeholder(prefix)))
                    }
                    MalformedValuePolicy::Skip => None,
                }
            }
        }
    }

    async fn canonicalize(
        &self,
        source: &str,
        span: &Span,
        state: &mut CallState<'_>,
    ) -> Result<Replacement> {
        let (key, vector) = match state.clusters.match_mention(&span.text, span.label).await? {
            ClusterMatch::Existing { placeholder, .. } => {
                return Ok(Replacement::placeholder(placeholder))
            }
            ClusterMatch::New { key, vector } => (key, vector),
        };

        let placeholder = if span.label == EntityLabel::Person {
            let context = context_window(source, span.start, span.end, self.config.context_radius);
            let inferred = infer_role(context);
            let assigned = self.noise.draw(inferred, self.config.epsilon)?;
            let placeholder = state.next_placeholder(assigned.as_str());
            tracing::debug!(
                inferred = ?inferred,
                assigned = %assigned,
                epsilon = self.config.epsilon,
                "Assigned role"
            );
            state.roles.push(RoleAssignment {
                surface: span.text.clone(),
                inferred,
                assigned,
                placeholder: placeholder.clone(),
            });
            placeholder
        } else {
            state.next_placeholder(self.config.prefix(span.label))
        };

        state
            .clusters
            .insert(key, span.label, vector, placeholder.clone());
        Ok(Replacement::placeholder(placeholder))
    }
}

/// Everything a single `sanitize` call accumulates
struct CallState<'a> {
    clusters: EntityClusters<'a>,
    counters: HashMap<String, usize>,
    placeholders: PlaceholderMap,
    roles: Vec<RoleAssignment>,
}

impl<'a> CallState<'a> {
    fn new(embedder: &'a dyn Embedder, config: &ShieldConfig) -> Self {
        Self {
            clusters: EntityClusters::new(
                embedder,
                config.similarity_threshold,
                config.cluster_strategy,
            ),
            counters: HashMap::new(),
            placeholders: PlaceholderMap::new(),
            roles: Vec::new(),
        }
    }

    /// `<prefix>_<n>` with a running counter per prefix
    fn next_placeholder(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        format!("{}_{}", prefix, counter)
    }
}
