use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::QdrantConfig,
    vector::{Document, Embedder, ScoredDocument, VectorStore},
};

const UPSERT_CHUNK_SIZE: usize = 30;

pub struct Qdrant {
    client: Client,
    base_url: String,
}

impl Qdrant {
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: url.trim_end_matches('/').to_owned(),
        }
    }

    /// Creates a new Qdrant collection using cosine distance.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Qdrant API returns an error.
    pub async fn create_collection(&self, name: &str, size: usize) -> Result<()> {
        self.client
            .put(&format!("{}/collections/{name}", self.base_url))
            .json(&serde_json::json!({
                "name": name,
                "vectors": {
                    "distance": "Cosine",
                    "size": size,
                }
            }))
            .send()
            .await?
            .error_for_status()?;

        debug!("Created collection {name}");

        Ok(())
    }

    #[must_use]
    pub fn collection(self, name: &str) -> Collection {
        Collection::new(self.client, format!("{}/collections/{name}", self.base_url))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Payload {
    pub text: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl From<Document> for Payload {
    fn from(document: Document) -> Self {
        Self {
            text: document.page_content,
            metadata: document.metadata,
        }
    }
}

impl From<Payload> for Document {
    fn from(payload: Payload) -> Self {
        Self {
            page_content: payload.text,
            metadata: payload.metadata,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct PointStruct {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: Payload,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct PointResult {
    pub id: Value,
    pub score: f32,
    pub payload: Payload,
}

#[derive(Debug, serde::Deserialize)]
struct SearchResponse {
    result: Vec<PointResult>,
}

pub struct Collection {
    client: Client,
    base_url: String,
}

impl Collection {
    #[must_use]
    pub const fn new(client: Client, url: String) -> Self {
        Self {
            client,
            base_url: url,
        }
    }

    /// Inserts or replaces points, in chunks.
    ///
    /// # Errors
    ///
    /// This function will return an error if any chunk is rejected by the Qdrant API.
    pub async fn upsert(&self, points: &[PointStruct]) -> Result<()> {
        try_join_all(points.chunks(UPSERT_CHUNK_SIZE).map(|chunk| async move {
            self.client
                .put(&format!("{}/points?wait=true", self.base_url))
                .json(&serde_json::json!({ "points": chunk }))
                .send()
                .await?
                .error_for_status()?;

            Ok::<_, reqwest::Error>(())
        }))
        .await?;

        debug!("Upserted {} vectors", points.len());

        Ok(())
    }

    /// Returns the `count` points closest to `vector`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the Qdrant API returns an error or an unexpected body.
    pub async fn query(&self, vector: Vec<f32>, count: usize) -> Result<Vec<PointResult>> {
        let response: Value = self
            .client
            .post(&format!("{}/points/search", self.base_url))
            .json(&serde_json::json!({
                "limit": count,
                "vector": vector,
                "with_payload": true,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let response: SearchResponse = serde_json::from_value(response)
            .map_err(|err| anyhow!("Unexpected search response from Qdrant: {err}"))?;

        Ok(response.result)
    }
}

/// A [`VectorStore`] kept in a Qdrant collection.
pub struct QdrantIndex<E> {
    collection: Collection,
    embedder: E,
}

impl<E: Embedder> QdrantIndex<E> {
    #[must_use]
    pub fn new(config: &QdrantConfig, embedder: E) -> Self {
        Self {
            collection: Qdrant::new(&config.url).collection(&config.collection),
            embedder,
        }
    }

    /// Embeds the documents and stores them under fresh ids.
    ///
    /// # Errors
    ///
    /// This function will return an error if embedding or upserting fails, or if the embedder
    /// does not return one vector per document.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<()> {
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

        let points = vectors
            .into_iter()
            .zip(documents)
            .map(|(vector, document)| PointStruct {
                id: Uuid::new_v4().to_string(),
                vector,
                payload: document.into(),
            })
            .collect::<Vec<_>>();

        self.collection.upsert(&points).await
    }
}

#[async_trait]
impl<E: Embedder> VectorStore for QdrantIndex<E> {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let vector = self.embedder.embed_query(query).await?;

        Ok(self
            .collection
            .query(vector, k)
            .await?
            .into_iter()
            .map(|point| ScoredDocument {
                document: point.payload.into(),
                score: point.score,
            })
            .collect())
    }
}
