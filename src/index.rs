//! Masked retrieval index
//!
//! Stores sanitized documents with their embeddings so that retrieval and
//! answering only ever see masked text.

use crate::engine::ShieldEngine;
use crate::error::{Result, ShieldError};
use crate::metrics::{cosine_similarity, embed_checked};
use crate::provider::{Embedder, Generator};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

struct IndexedDocument {
    id: String,
    text: String,
    vector: Vec<f32>,
}

/// One retrieval result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub id: String,
    /// Masked document text
    pub text: String,
    pub score: f32,
}

/// In-memory cosine-similarity index over masked documents
pub struct MaskedIndex {
    embedder: Arc<dyn Embedder>,
    documents: RwLock<Vec<IndexedDocument>>,
}

impl MaskedIndex {
    pub fn new(embedder: impl Embedder + 'static) -> Self {
        Self::with_embedder(Arc::new(embedder))
    }

    pub fn with_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Sanitize `raw` with `engine` and index the masked text
    pub async fn add(&self, engine: &ShieldEngine, raw: &str) -> Result<String> {
        let sanitized = engine.sanitize(raw).await?;
        self.add_masked(&sanitized.text).await
    }

    /// Index text that is already masked
    pub async fn add_masked(&self, text: &str) -> Result<String> {
        let vector = embed_checked(self.embedder.as_ref(), text).await?;
        let id = format!("doc-{}", uuid::Uuid::new_v4());

        let mut documents = self.documents.write().await;
        documents.push(IndexedDocument {
            id: id.clone(),
            text: text.to_string(),
            vector,
        });
        tracing::debug!(id = %id, documents = documents.len(), "Indexed masked document");
        Ok(id)
    }

    /// Sanitize and index several documents with one batch embedding call
    ///
    /// Nothing is indexed unless every document embeds successfully.
    pub async fn add_batch(&self, engine: &ShieldEngine, raws: &[&str]) -> Result<Vec<String>> {
        let mut masked = Vec::with_capacity(raws.len());
        for raw in raws {
            masked.push(engine.sanitize(raw).await?.text);
        }

        let vectors = self
            .embedder
            .embed_batch(&masked)
            .await
            .map_err(|e| e.attribute("embedder"))?;
        if vectors.len() != masked.len() {
            return Err(ShieldError::dependency(
                "embedder",
                format!("expected {} vectors, got {}", masked.len(), vectors.len()),
            ));
        }
        let dimension = self.embedder.dimension();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(ShieldError::dependency(
                "embedder",
                format!("expected {} dimensions, got {}", dimension, bad.len()),
            ));
        }

        let mut documents = self.documents.write().await;
        let mut ids = Vec::with_capacity(masked.len());
        for (text, vector) in masked.into_iter().zip(vectors) {
            let id = format!("doc-{}", uuid::Uuid::new_v4());
            documents.push(IndexedDocument {
                id: id.clone(),
                text,
                vector,
            });
            ids.push(id);
        }
        tracing::debug!(added = ids.len(), documents = documents.len(), "Indexed masked batch");
        Ok(ids)
    }

    /// Top `k` documents by cosine similarity to `query`
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let query_vec = embed_checked(self.embedder.as_ref(), query).await?;
        let documents = self.documents.read().await;

        let mut hits: Vec<SearchHit> = documents
            .iter()
            .map(|doc| SearchHit {
                id: doc.id.clone(),
                text: doc.text.clone(),
                score: cosine_similarity(&query_vec, &doc.vector),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Answer `question` from the top `k` masked documents
    pub async fn answer(&self, question: &str, k: usize, generator: &dyn Generator) -> Result<String> {
        let hits = self.search(question, k).await?;
        let context = hits
            .iter()
            .map(|h| h.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        tracing::debug!(retrieved = hits.len(), "Answering over masked context");
        generator
            .generate(&context, Some(question))
            .await
            .map_err(|e| e.attribute("generator"))
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}
