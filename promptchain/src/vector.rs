use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::{cmp::Ordering, collections::HashMap, sync::Arc};
use tracing::debug;

/// A piece of text plus whatever metadata should travel with it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A search hit. `score` is whatever the backend ranks by: a distance for
/// [`Distance::L2`] (lower is closer), a similarity for [`Distance::Cosine`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts, one vector per text, in order.
    ///
    /// # Errors
    ///
    /// Implementations return an error if the backing service fails.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embeds a search query.
    ///
    /// # Errors
    ///
    /// Implementations return an error if the backing service fails.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
impl<T: Embedder + ?Sized> Embedder for Arc<T> {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_documents(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed_query(text).await
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns the `k` documents closest to `query`, closest first.
    ///
    /// # Errors
    ///
    /// Implementations return an error if embedding the query or searching fails.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Distance {
    #[default]
    L2,
    Cosine,
}

impl Distance {
    fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => euclidean_distance(a, b),
            Self::Cosine => cosine_similarity(a, b),
        }
    }

    fn rank(self, a: f32, b: f32) -> Ordering {
        match self {
            Self::L2 => a.total_cmp(&b),
            Self::Cosine => b.total_cmp(&a),
        }
    }
}

#[must_use]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Exact nearest-neighbour search over vectors held in memory.
pub struct InMemoryIndex<E> {
    embedder: E,
    distance: Distance,
    entries: Vec<(Vec<f32>, Document)>,
}

impl<E: Embedder> InMemoryIndex<E> {
    pub const fn new(embedder: E) -> Self {
        Self {
            embedder,
            distance: Distance::L2,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }

    /// Embeds and indexes the documents in one go.
    ///
    /// # Errors
    ///
    /// Fails if embedding fails or the embedder returns vectors of inconsistent size.
    pub async fn from_documents(documents: Vec<Document>, embedder: E) -> Result<Self> {
        let mut index = Self::new(embedder);
        index.add_documents(documents).await?;

        Ok(index)
    }

    /// Embeds and indexes more documents.
    ///
    /// # Errors
    ///
    /// Fails if embedding fails or the embedder returns vectors of inconsistent size.
    pub async fn add_documents(&mut self, documents: Vec<Document>) -> Result<()> {
        let texts = documents
            .iter()
            .map(|document| document.page_content.clone())
            .collect::<Vec<_>>();
        let vectors = self.embedder.embed_documents(&texts).await?;

        if vectors.len() != documents.len() {
            bail!(
                "Embedder returned {} vectors for {} documents",
                vectors.len(),
                documents.len()
            );
        }

        let dims = self
            .entries
            .first()
            .map(|(vector, _)| vector.len())
            .or_else(|| vectors.first().map(Vec::len));
        if let Some(dims) = dims {
            if let Some(vector) = vectors.iter().find(|vector| vector.len() != dims) {
                bail!("Expected {dims}-dimensional vectors, got {}", vector.len());
            }
        }

        self.entries.extend(vectors.into_iter().zip(documents));
        debug!("Indexed {} documents", self.entries.len());

        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl<E: Embedder> VectorStore for InMemoryIndex<E> {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let query = self.embedder.embed_query(query).await?;

        if let Some((vector, _)) = self.entries.first() {
            if vector.len() != query.len() {
                bail!(
                    "Query has {} dimensions but the index has {}",
                    query.len(),
                    vector.len()
                );
            }
        }

        let mut hits = self
            .entries
            .iter()
            .map(|(vector, document)| ScoredDocument {
                document: document.clone(),
                score: self.distance.score(&query, vector),
            })
            .collect::<Vec<_>>();

        hits.sort_by(|a, b| self.distance.rank(a.score, b.score));
        hits.truncate(k);

        Ok(hits)
    }
}
