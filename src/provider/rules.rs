//! Regex rule detector
//!
//! Pattern-based detection for the structured parts of the taxonomy: email
//! addresses, phone numbers, money amounts, month-day dates and identifier
//! codes. An optional capitalized-name rule covers person names an NER model
//! misses.

use crate::error::{Result, ShieldError};
use crate::provider::EntityDetector;
use crate::types::{EntityLabel, Span};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A named detection pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRule {
    pub name: String,
    pub pattern: String,
    pub label: EntityLabel,
}

impl DetectionRule {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, label: EntityLabel) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            label,
        }
    }
}

/// Default rules for structured PII
///
/// Currency symbols and month names are English/Western only.
pub fn default_detection_rules() -> Vec<DetectionRule> {
    vec![
        DetectionRule::new(
            "email",
            r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}",
            EntityLabel::Email,
        ),
        DetectionRule::new(
            "phone",
            r"(?:\+\d{1,3}\s?)?(?:\(\d{3}\)|\b\d{3})[-.\s]?\d{3}[-.\s]?\d{4}\b",
            EntityLabel::Phone,
        ),
        DetectionRule::new(
            "money",
            r"[$₹€£]\s?\d+(?:,\d{3})*(?:\.\d+)?",
            EntityLabel::Money,
        ),
        DetectionRule::new(
            "date",
            r"\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2}(?:st|nd|rd|th)?\b",
            EntityLabel::Date,
        ),
        DetectionRule::new(
            "identifier_code",
            r"\b\d{4,}[A-Z]\d{3,}\b",
            EntityLabel::IdentifierCode,
        ),
    ]
}

/// Fallback rule for multi-word capitalized names ("Anita Rao", "K Venkat Raman")
pub fn name_fallback_rule() -> DetectionRule {
    DetectionRule::new(
        "capitalized_name",
        r"\b(?:[A-Z]\s)?[A-Z][a-z]+(?:\s[A-Z][a-z]+){1,3}\b",
        EntityLabel::Person,
    )
}

/// Detector backed by compiled regex rules
pub struct RegexDetector {
    rules: Vec<(String, Regex, EntityLabel)>,
}

impl RegexDetector {
    /// Compile the given rules
    pub fn new(rules: &[DetectionRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let regex = Regex::new(&rule.pattern)
                    .map_err(|e| ShieldError::InvalidPattern(format!("{}: {}", rule.name, e)))?;
                Ok((rule.name.clone(), regex, rule.label))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Detector with `default_detection_rules()`
    pub fn with_default_rules() -> Result<Self> {
        Self::new(&default_detection_rules())
    }

    /// Run every rule over `text`
    pub fn scan(&self, text: &str) -> Vec<Span> {
        let mut spans = Vec::new();
        for (rule_name, regex, label) in &self.rules {
            for mat in regex.find_iter(text) {
                tracing::trace!(rule = %rule_name, start = mat.start(), end = mat.end(), "Rule matched");
                spans.push(
                    Span::new(mat.as_str(), mat.start(), mat.end(), *label).with_source("regex"),
                );
            }
        }
        spans
    }

    /// Number of compiled rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[async_trait]
impl EntityDetector for RegexDetector {
    async fn detect(&self, text: &str) -> Result<Vec<Span>> {
        Ok(self.scan(text))
    }

    fn name(&self) -> &str {
        "regex"
    }
}
