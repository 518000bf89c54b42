//! Leakage and utility metrics

use crate::error::{Result, ShieldError};
use crate::provider::Embedder;
use crate::types::{ShieldMetrics, Span};

/// Cosine similarity of two vectors; 0 when either has zero norm
///
/// Vectors of different lengths are compared over their common prefix;
/// callers that care check dimensions first.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Fraction of span surfaces still literally present in the sanitized text
///
/// Returns 0 for an empty span list.
pub fn pii_survival_rate<'a>(sanitized: &str, spans: impl IntoIterator<Item = &'a Span>) -> f64 {
    let mut total = 0usize;
    let mut survived = 0usize;
    for span in spans {
        total += 1;
        if sanitized.contains(span.text.as_str()) {
            survived += 1;
        }
    }
    survived as f64 / total.max(1) as f64
}

/// Embed `text` and check the vector has the embedder's dimensionality
pub(crate) async fn embed_checked(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    let vector = embedder
        .embed(text)
        .await
        .map_err(|e| e.attribute("embedder"))?;
    if vector.len() != embedder.dimension() {
        return Err(ShieldError::dependency(
            "embedder",
            format!(
                "expected {} dimensions, got {}",
                embedder.dimension(),
                vector.len()
            ),
        ));
    }
    Ok(vector)
}

/// Cosine similarity between the embeddings of the raw and sanitized text
pub async fn semantic_similarity(embedder: &dyn Embedder, raw: &str, sanitized: &str) -> Result<f32> {
    let raw_vec = embed_checked(embedder, raw).await?;
    let sanitized_vec = embed_checked(embedder, sanitized).await?;
    Ok(cosine_similarity(&raw_vec, &sanitized_vec))
}

/// Survival rate and semantic similarity in one call
pub async fn compute_metrics<'a>(
    embedder: &dyn Embedder,
    raw: &str,
    sanitized: &str,
    spans: impl IntoIterator<Item = &'a Span>,
) -> Result<ShieldMetrics> {
    let survival_rate = pii_survival_rate(sanitized, spans);
    let similarity = semantic_similarity(embedder, raw, sanitized).await?;
    tracing::debug!(survival_rate, similarity, "Computed shield metrics");
    Ok(ShieldMetrics {
        survival_rate,
        similarity,
    })
}
