//! # a3s-shield
//!
//! Privacy-preserving text sanitization for the A3S ecosystem.
//!
//! ## Overview
//!
//! `a3s-shield` removes personally identifiable information from free-form
//! business text before it reaches a language model, while keeping enough
//! structure for the model to stay useful. Person mentions become noisy role
//! placeholders (`[Requester_1]`), organizations and identifiers become
//! counter placeholders (`[Org_1]`, `[Email_2]`), and money and dates become
//! coarse phrases ("tens of thousands of dollars", "mid March").
//!
//! ## Quick Start
//!
//! ```rust
//! use a3s_shield::{ShieldConfig, ShieldEngine, SpanCollector};
//! use a3s_shield::provider::gazetteer::GazetteerDetector;
//! use a3s_shield::provider::hash::HashEmbedder;
//! use a3s_shield::provider::rules::RegexDetector;
//! use a3s_shield::EntityLabel;
//!
//! # async fn example() -> a3s_shield::Result<()> {
//! let collector = SpanCollector::default()
//!     .with_detector(GazetteerDetector::from_terms([("SecureStack", EntityLabel::Organization)])?)
//!     .with_detector(RegexDetector::with_default_rules()?);
//!
//! let engine = ShieldEngine::new(collector, HashEmbedder::default(), ShieldConfig::default())?;
//! let out = engine.sanitize("SecureStack invoiced $68,200 on March 14").await?;
//!
//! println!("{}", out.text); // [Org_1] invoiced tens of thousands of dollars on mid March
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **EntityDetector / Embedder / Generator** traits — injected model seams
//! - **SpanCollector** — runs detectors and merges their candidates
//! - **Resolver** — drops malformed spans, keeps a non-overlapping set
//! - **Canonicalizer** — clusters mentions of the same entity
//! - **Role assigner** — randomized response over contextual roles
//! - **Bucketizer** — money and date phrases
//! - **ShieldEngine** — the pipeline, plus metrics and generation
//! - **MaskedIndex** / **eval** — retrieval and utility evaluation over masked text

pub mod bucket;
pub mod canonical;
pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod eval;
pub mod index;
pub mod metrics;
pub mod provider;
pub mod resolver;
pub mod role;
pub mod substitute;
pub mod types;

// Re-export core types
pub use collector::SpanCollector;
pub use config::{ClusterStrategy, MalformedValuePolicy, MoneyBuckets, ShieldConfig};
pub use engine::ShieldEngine;
pub use error::{Result, ShieldError};
pub use index::{MaskedIndex, SearchHit};
pub use provider::{EntityDetector, Embedder, Generator};
pub use types::{
    Diagnostic, DiagnosticKind, EntityLabel, PlaceholderEntry, PlaceholderMap, Replacement,
    ReplacementKind, ResolvedSpans, Role, RoleAssignment, Sanitized, ShieldMetrics, ShieldReport,
    Span,
};

// Re-export built-in providers for convenience
pub use provider::gazetteer::GazetteerDetector;
pub use provider::hash::HashEmbedder;
pub use provider::rules::{DetectionRule, RegexDetector};
