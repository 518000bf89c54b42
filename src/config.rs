//! Configuration for the shield engine
//!
//! Read-only for the lifetime of an engine. Every field has a default, so an
//! empty JSON object is a valid configuration.

use crate::error::{Result, ShieldError};
use crate::types::EntityLabel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldConfig {
    /// Cosine similarity a mention must exceed to join an existing cluster
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Probability of reporting the inferred role, in (0, 1]
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Characters of context taken on each side of a person mention
    #[serde(default = "default_context_radius")]
    pub context_radius: usize,

    #[serde(default)]
    pub cluster_strategy: ClusterStrategy,

    #[serde(default)]
    pub money: MoneyBuckets,

    #[serde(default)]
    pub malformed_value_policy: MalformedValuePolicy,

    /// Placeholder prefix overrides per label
    #[serde(default)]
    pub prefixes: HashMap<EntityLabel, String>,

    /// Span texts never treated as entities (case-insensitive)
    #[serde(default = "default_stop_terms")]
    pub stop_terms: Vec<String>,

    /// Rewrite single-letter initials ("J.") before detection
    #[serde(default)]
    pub normalize_initials: bool,

    /// Ask the generator to re-identify masked entities after each run
    #[serde(default)]
    pub reidentification_probe: bool,

    /// Seed for the role-noise random source; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            epsilon: default_epsilon(),
            context_radius: default_context_radius(),
            cluster_strategy: ClusterStrategy::default(),
            money: MoneyBuckets::default(),
            malformed_value_policy: MalformedValuePolicy::default(),
            prefixes: HashMap::new(),
            stop_terms: default_stop_terms(),
            normalize_initials: false,
            reidentification_probe: false,
            seed: None,
        }
    }
}

impl ShieldConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_cluster_strategy(mut self, strategy: ClusterStrategy) -> Self {
        self.cluster_strategy = strategy;
        self
    }

    pub fn with_malformed_value_policy(mut self, policy: MalformedValuePolicy) -> Self {
        self.malformed_value_policy = policy;
        self
    }

    /// Placeholder prefix for a label, honoring overrides
    pub fn prefix(&self, label: EntityLabel) -> &str {
        self.prefixes
            .get(&label)
            .map(String::as_str)
            .unwrap_or_else(|| label.default_prefix())
    }

    /// Whether a span text is on the stop list
    pub fn is_stop_term(&self, text: &str) -> bool {
        let needle = text.trim().to_lowercase();
        self.stop_terms.iter().any(|t| t.to_lowercase() == needle)
    }

    /// Check invariants the engine relies on
    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon > 0.0 && self.epsilon <= 1.0) {
            return Err(ShieldError::Config(format!(
                "epsilon must be in (0, 1], got {}",
                self.epsilon
            )));
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ShieldError::Config(format!(
                "similarityThreshold must be in [-1, 1], got {}",
                self.similarity_threshold
            )));
        }
        if self.context_radius == 0 {
            return Err(ShieldError::Config(
                "contextRadius must be greater than zero".to_string(),
            ));
        }
        if self.prefixes.values().any(|p| p.trim().is_empty()) {
            return Err(ShieldError::Config(
                "placeholder prefixes must not be empty".to_string(),
            ));
        }
        self.money.validate()
    }
}

/// How a mention is matched against existing clusters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClusterStrategy {
    /// First cluster in insertion order above the threshold
    #[default]
    FirstMatch,
    /// Most similar cluster above the threshold
    Nearest,
}

/// What to do with a money/date span whose value cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MalformedValuePolicy {
    /// Replace with a counter placeholder (`[Amount_1]`) and warn
    #[default]
    Redact,
    /// Leave the span unredacted and warn
    Skip,
}

/// Money bucket edges and their phrases
///
/// A value below `thresholds[i]` gets `labels[i]`; anything at or above the
/// last threshold gets the last label.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyBuckets {
    #[serde(default = "default_money_thresholds")]
    pub thresholds: Vec<f64>,
    #[serde(default = "default_money_labels")]
    pub labels: Vec<String>,
}

impl Default for MoneyBuckets {
    fn default() -> Self {
        Self {
            thresholds: default_money_thresholds(),
            labels: default_money_labels(),
        }
    }
}

impl MoneyBuckets {
    fn validate(&self) -> Result<()> {
        if self.labels.len() != self.thresholds.len() + 1 {
            return Err(ShieldError::Config(format!(
                "money buckets need {} labels for {} thresholds, got {}",
                self.thresholds.len() + 1,
                self.thresholds.len(),
                self.labels.len()
            )));
        }
        if self.thresholds.windows(2).any(|w| w[0] >= w[1]) {
            return Err(ShieldError::Config(
                "money thresholds must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_similarity_threshold() -> f32 {
    0.65
}

fn default_epsilon() -> f64 {
    0.7
}

fn default_context_radius() -> usize {
    40
}

fn default_money_thresholds() -> Vec<f64> {
    vec![1_000.0, 10_000.0]
}

fn default_money_labels() -> Vec<String> {
    vec![
        "a few hundred dollars".to_string(),
        "several thousand dollars".to_string(),
        "tens of thousands of dollars".to_string(),
    ]
}

fn default_stop_terms() -> Vec<String> {
    [
        "manager",
        "program manager",
        "team",
        "hello team",
        "thanks",
        "accounts team",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
