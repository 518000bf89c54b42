//! Collaborator traits: the seams to external models
//!
//! Entity detection, embedding and text generation are delegated to
//! implementations of these traits. The engine only relies on the calling
//! conventions below; model loading and transport live in the implementations.

use crate::error::Result;
use crate::types::Span;
use async_trait::async_trait;

pub mod gazetteer;
pub mod hash;
pub mod rules;

/// Source of candidate spans (NER model, regex rules, gazetteers, ...)
#[async_trait]
pub trait EntityDetector: Send + Sync {
    /// Detect candidate spans in `text`
    ///
    /// Offsets are byte offsets into `text`. Spans may overlap each other;
    /// the resolver sorts that out.
    async fn detect(&self, text: &str) -> Result<Vec<Span>>;

    /// Detector name, recorded on every span it produces
    fn name(&self) -> &str;
}

/// Text embedding model
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text; every call must return `dimension()` values
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Fixed dimensionality of the vectors this embedder returns
    fn dimension(&self) -> usize;

    /// Embed several texts
    ///
    /// Default implementation embeds one at a time. Embedders with a native
    /// batch endpoint should override this.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Generative model used for answers and summaries over masked text
#[async_trait]
pub trait Generator: Send + Sync {
    /// Answer `question` from `context`, or summarize it when `question` is `None`
    async fn generate(&self, context: &str, question: Option<&str>) -> Result<String>;
}
