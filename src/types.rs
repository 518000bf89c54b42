//! Core data types for the a3s-shield engine
//!
//! All serializable types use camelCase JSON for wire compatibility with the
//! rest of the A3S ecosystem.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;

/// Fixed entity taxonomy understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityLabel {
    Person,
    Organization,
    Email,
    Phone,
    Money,
    Date,
    IdentifierCode,
}

impl EntityLabel {
    /// Every label, in taxonomy order
    pub const ALL: [EntityLabel; 7] = [
        Self::Person,
        Self::Organization,
        Self::Email,
        Self::Phone,
        Self::Money,
        Self::Date,
        Self::IdentifierCode,
    ];

    /// Placeholder prefix used when no override is configured
    pub fn default_prefix(&self) -> &'static str {
        match self {
            Self::Person => "Person",
            Self::Organization => "Org",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Money => "Amount",
            Self::Date => "Date",
            Self::IdentifierCode => "Id",
        }
    }

    /// Labels clustered through the canonicalizer
    pub fn is_entity(&self) -> bool {
        matches!(self, Self::Person | Self::Organization)
    }

    /// Labels replaced by a counter tag without embedding
    pub fn is_identifier(&self) -> bool {
        matches!(self, Self::Email | Self::Phone | Self::IdentifierCode)
    }

    /// Labels replaced by a qualitative bucket phrase
    pub fn is_bucketed(&self) -> bool {
        matches!(self, Self::Money | Self::Date)
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Person => write!(f, "Person"),
            Self::Organization => write!(f, "Organization"),
            Self::Email => write!(f, "Email"),
            Self::Phone => write!(f, "Phone"),
            Self::Money => write!(f, "Money"),
            Self::Date => write!(f, "Date"),
            Self::IdentifierCode => write!(f, "IdentifierCode"),
        }
    }
}

/// A detected candidate span
///
/// `start` and `end` are half-open UTF-8 byte offsets into the text the
/// detector was given; `text` must equal that slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    /// Surface string as it appears in the source text
    pub text: String,

    /// Start byte offset (inclusive)
    pub start: usize,

    /// End byte offset (exclusive)
    pub end: usize,

    /// Taxonomy label
    pub label: EntityLabel,

    /// Name of the detector that produced this span
    #[serde(default)]
    pub source: String,
}

impl Span {
    /// Create a span with no detector attribution
    pub fn new(text: impl Into<String>, start: usize, end: usize, label: EntityLabel) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            label,
            source: String::new(),
        }
    }

    /// Attribute the span to a detector
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Length of the span in bytes (zero for malformed spans)
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two spans share at least one byte
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Ordered, non-overlapping spans sorted by start offset
///
/// Only the resolver constructs this type, so holders can rely on
/// `spans[i].end <= spans[i + 1].start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedSpans(Vec<Span>);

impl ResolvedSpans {
    pub(crate) fn from_sorted(spans: Vec<Span>) -> Self {
        debug_assert!(spans.windows(2).all(|w| w[0].end <= w[1].start));
        Self(spans)
    }

    pub fn as_slice(&self) -> &[Span] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Span> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<Span> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ResolvedSpans {
    type Item = &'a Span;
    type IntoIter = std::slice::Iter<'a, Span>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Contextual role of a person mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Vendor,
    Requester,
    Approver,
    Compliance,
    /// Generic fallback, only ever produced by the noise draw
    Person,
}

impl Role {
    /// Candidate roles for the randomized-response draw, in draw order
    pub const ALL: [Role; 5] = [
        Self::Vendor,
        Self::Requester,
        Self::Approver,
        Self::Compliance,
        Self::Person,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vendor => "Vendor",
            Self::Requester => "Requester",
            Self::Approver => "Approver",
            Self::Compliance => "Compliance",
            Self::Person => "Person",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role decision for a newly seen person entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    /// Surface string of the mention that created the entity
    pub surface: String,

    /// Role inferred from context (`None` means unknown)
    pub inferred: Option<Role>,

    /// Role after the randomized-response draw
    pub assigned: Role,

    /// Placeholder built from the assigned role
    pub placeholder: String,
}

/// How a replacement is rendered into the sanitized text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplacementKind {
    /// Redaction tag, rendered in brackets: `[Org_1]`
    Placeholder,
    /// Qualitative paraphrase, rendered as-is: `mid March`
    Bucket,
}

/// Replacement value for a surface string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replacement {
    pub kind: ReplacementKind,
    pub value: String,
}

impl Replacement {
    pub fn placeholder(value: impl Into<String>) -> Self {
        Self {
            kind: ReplacementKind::Placeholder,
            value: value.into(),
        }
    }

    pub fn bucket(value: impl Into<String>) -> Self {
        Self {
            kind: ReplacementKind::Bucket,
            value: value.into(),
        }
    }

    /// Text inserted into the sanitized output
    pub fn rendered(&self) -> String {
        match self.kind {
            ReplacementKind::Placeholder => format!("[{}]", self.value),
            ReplacementKind::Bucket => self.value.clone(),
        }
    }
}

/// One entry of the placeholder map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderEntry {
    pub surface: String,
    pub label: EntityLabel,
    pub replacement: Replacement,
    /// Offsets of the first occurrence in the source text
    pub start: usize,
    pub end: usize,
}

/// Reversible mapping from surface strings to their replacements
///
/// Keeps insertion order. Serializes as a JSON object of
/// `surface -> rendered replacement`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: Vec<PlaceholderEntry>,
    index: HashMap<String, usize>,
}

impl PlaceholderMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; an existing surface keeps its first mapping
    pub(crate) fn insert(&mut self, entry: PlaceholderEntry) -> bool {
        if self.index.contains_key(&entry.surface) {
            return false;
        }
        self.index.insert(entry.surface.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    pub fn get(&self, surface: &str) -> Option<&Replacement> {
        self.entry(surface).map(|e| &e.replacement)
    }

    pub fn entry(&self, surface: &str) -> Option<&PlaceholderEntry> {
        self.index.get(surface).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, surface: &str) -> bool {
        self.index.contains_key(surface)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlaceholderEntry> {
        self.entries.iter()
    }

    /// Surface strings in insertion order
    pub fn surfaces(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.surface.as_str())
    }

    /// Replace bracketed placeholders in `text` with their original surface.
    ///
    /// When several surfaces share a placeholder (clustered mentions), the
    /// first one seen wins. Bucket phrases are not reversed.
    pub fn restore(&self, text: &str) -> String {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        let mut ordered = Vec::new();
        for entry in &self.entries {
            if entry.replacement.kind != ReplacementKind::Placeholder {
                continue;
            }
            if !seen.contains_key(entry.replacement.value.as_str()) {
                seen.insert(&entry.replacement.value, &entry.surface);
                ordered.push((entry.replacement.rendered(), entry.surface.as_str()));
            }
        }

        let mut restored = text.to_string();
        for (tag, surface) in ordered {
            restored = restored.replace(&tag, surface);
        }
        restored
    }
}

impl Serialize for PlaceholderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.surface, &entry.replacement.rendered())?;
        }
        map.end()
    }
}

/// Category of a non-fatal problem recorded during sanitization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// Span with bad offsets or a surface that does not match the text
    MalformedSpan,
    /// Span dropped because its text is on the stop list
    StopTerm,
    /// Money or date token that could not be bucketed
    UnparseableValue,
}

/// Non-fatal note collected during a sanitization call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub start: usize,
    pub end: usize,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, span: &Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            start: span.start,
            end: span.end,
        }
    }
}

/// Output of one sanitization call
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sanitized {
    /// Text the span offsets refer to (the raw input, or its
    /// initials-normalized form when that preprocessing is enabled)
    pub source: String,

    /// Sanitized text
    pub text: String,

    /// Reversible surface -> replacement mapping
    pub placeholders: PlaceholderMap,

    /// Resolved spans, in source order
    pub spans: ResolvedSpans,

    /// Role decisions for newly created person entities
    pub roles: Vec<RoleAssignment>,

    /// Dropped spans and skipped values
    pub diagnostics: Vec<Diagnostic>,
}

/// Leakage and utility scores for one sanitized text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldMetrics {
    /// Fraction of resolved span surfaces still present in the output
    pub survival_rate: f64,

    /// Cosine similarity between raw and sanitized embeddings
    pub similarity: f32,
}

/// Full pipeline result: sanitization, model output and metrics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShieldReport {
    pub raw: String,
    pub masked: String,
    pub placeholders: PlaceholderMap,
    /// Answer or summary produced from the masked text
    pub output: String,
    pub metrics: ShieldMetrics,
    /// Re-identification probe output, when enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe: Option<String>,
}
