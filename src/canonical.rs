//! Entity canonicalizer: similarity clustering of person and org mentions
//!
//! Each mention is normalized, embedded and compared against the clusters
//! created so far in the current call. A mention joins a cluster when cosine
//! similarity strictly exceeds the configured threshold; otherwise the caller
//! creates a new cluster with a fresh placeholder.
//!
//! Clusters are not scoped by label: a person and an organization whose
//! normalized forms embed close together share a placeholder.

use crate::config::ClusterStrategy;
use crate::error::Result;
use crate::metrics::{cosine_similarity, embed_checked};
use crate::provider::Embedder;
use crate::types::EntityLabel;
use std::collections::HashMap;

/// One cluster of mentions judged to refer to the same entity
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalEntity {
    /// Normalized form of the mention that created the cluster
    pub key: String,
    pub label: EntityLabel,
    pub vector: Vec<f32>,
    pub placeholder: String,
}

/// Outcome of matching a mention against existing clusters
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterMatch {
    /// Joined an existing cluster
    Existing { placeholder: String, similarity: f32 },
    /// No cluster was similar enough; carries what `insert` needs
    New { key: String, vector: Vec<f32> },
}

/// Lower-case and trim; persons reduce to their first token
///
/// "Priya Sharma" and "priya" both normalize to "priya", so a full name and
/// a later first-name reference land in the same cluster.
pub fn normalize(surface: &str, label: EntityLabel) -> String {
    let lower = surface.trim().to_lowercase();
    match label {
        EntityLabel::Person => lower
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string(),
        _ => lower,
    }
}

/// Per-call cluster state
pub struct EntityClusters<'a> {
    embedder: &'a dyn Embedder,
    threshold: f32,
    strategy: ClusterStrategy,
    clusters: Vec<CanonicalEntity>,
    cache: HashMap<String, Vec<f32>>,
}

impl<'a> EntityClusters<'a> {
    pub fn new(embedder: &'a dyn Embedder, threshold: f32, strategy: ClusterStrategy) -> Self {
        Self {
            embedder,
            threshold,
            strategy,
            clusters: Vec::new(),
            cache: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// Clusters in creation order
    pub fn clusters(&self) -> &[CanonicalEntity] {
        &self.clusters
    }

    /// Embedding of a normalized key, memoized for the lifetime of `self`
    async fn embed(&mut self, key: &str) -> Result<Vec<f32>> {
        if let Some(vector) = self.cache.get(key) {
            return Ok(vector.clone());
        }
        let vector = embed_checked(self.embedder, key).await?;
        self.cache.insert(key.to_string(), vector.clone());
        Ok(vector)
    }

    /// Index and similarity of the matching cluster, if any
    pub fn find(&self, vector: &[f32]) -> Option<(usize, f32)> {
        let mut scored = self
            .clusters
            .iter()
            .enumerate()
            .map(|(i, c)| (i, cosine_similarity(vector, &c.vector)))
            .filter(|(_, sim)| *sim > self.threshold);

        match self.strategy {
            ClusterStrategy::FirstMatch => scored.next(),
            ClusterStrategy::Nearest => scored.fold(None, |best, (i, sim)| match best {
                Some((_, best_sim)) if best_sim >= sim => best,
                _ => Some((i, sim)),
            }),
        }
    }

    /// Match a mention against the clusters seen so far
    pub async fn match_mention(&mut self, surface: &str, label: EntityLabel) -> Result<ClusterMatch> {
        let key = normalize(surface, label);
        let vector = self.embed(&key).await?;

        if let Some((idx, similarity)) = self.find(&vector) {
            let cluster = &self.clusters[idx];
            tracing::debug!(
                label = %label,
                cluster = %cluster.key,
                similarity,
                "Mention joined existing cluster"
            );
            return Ok(ClusterMatch::Existing {
                placeholder: cluster.placeholder.clone(),
                similarity,
            });
        }

        Ok(ClusterMatch::New { key, vector })
    }

    /// Record a new cluster
    pub fn insert(&mut self, key: String, label: EntityLabel, vector: Vec<f32>, placeholder: String) {
        tracing::debug!(label = %label, cluster = %key, placeholder = %placeholder, "Created cluster");
        self.clusters.push(CanonicalEntity {
            key,
            label,
            vector,
            placeholder,
        });
    }
}
