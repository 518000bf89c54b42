//! Gazetteer detector: known names and organizations
//!
//! Matches a fixed list of terms on word boundaries. Useful when the set of
//! parties in a correspondence is already known (vendor lists, staff
//! directories) and as a deterministic stand-in for an NER model.

use crate::error::{Result, ShieldError};
use crate::provider::EntityDetector;
use crate::types::{EntityLabel, Span};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

/// Detector over a list of known terms
pub struct GazetteerDetector {
    terms: Vec<(String, Regex, EntityLabel)>,
    case_insensitive: bool,
}

impl GazetteerDetector {
    /// Create an empty gazetteer (case-sensitive)
    pub fn new() -> Self {
        Self {
            terms: Vec::new(),
            case_insensitive: false,
        }
    }

    /// Build from `(term, label)` pairs
    pub fn from_terms<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, EntityLabel)>,
        S: Into<String>,
    {
        let mut gazetteer = Self::new();
        for (term, label) in terms {
            gazetteer = gazetteer.with_term(term, label)?;
        }
        Ok(gazetteer)
    }

    /// Match terms regardless of case
    ///
    /// Applies to terms added after this call.
    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }

    /// Add a term
    pub fn with_term(mut self, term: impl Into<String>, label: EntityLabel) -> Result<Self> {
        let term = term.into();
        let trimmed = term.trim();
        if trimmed.is_empty() {
            return Err(ShieldError::InvalidPattern(
                "gazetteer terms must not be empty".to_string(),
            ));
        }
        let regex = RegexBuilder::new(&bounded_pattern(trimmed))
            .case_insensitive(self.case_insensitive)
            .build()
            .map_err(|e| ShieldError::InvalidPattern(format!("{}: {}", trimmed, e)))?;
        self.terms.push((trimmed.to_string(), regex, label));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Find every occurrence of every term
    pub fn scan(&self, text: &str) -> Vec<Span> {
        self.terms
            .iter()
            .flat_map(|(_, regex, label)| {
                regex.find_iter(text).map(move |m| {
                    Span::new(m.as_str(), m.start(), m.end(), *label).with_source("gazetteer")
                })
            })
            .collect()
    }
}

/// Escaped term, with `\b` only on edges that are word characters
///
/// A boundary next to punctuation ("Acme Inc.") would demand a word
/// character right after the term.
fn bounded_pattern(term: &str) -> String {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
    let lead = if is_word(term.chars().next()) { r"\b" } else { "" };
    let trail = if is_word(term.chars().last()) { r"\b" } else { "" };
    format!("{}{}{}", lead, regex::escape(term), trail)
}

impl Default for GazetteerDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityDetector for GazetteerDetector {
    async fn detect(&self, text: &str) -> Result<Vec<Span>> {
        Ok(self.scan(text))
    }

    fn name(&self) -> &str {
        "gazetteer"
    }
}
