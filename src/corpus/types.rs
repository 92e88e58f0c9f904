//! Corpus record types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Embedding vector; all vectors in one run share the same dimension.
pub type EmbeddingVector = Vec<f32>;

/// An article prepared for clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: String,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub embedding: EmbeddingVector,
}

impl ArticleRecord {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        embedding: EmbeddingVector,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            abstract_text: abstract_text.into(),
            embedding,
        }
    }
}

/// An article of the citation neighbourhood, prepared for gap detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphArticle {
    pub id: String,
    /// DOI, PMID or any other identifier used by citation links.
    pub external_id: Option<String>,
    pub title: String,
    pub year: Option<i32>,
    pub embedding: EmbeddingVector,
    /// Identifiers of articles this one references.
    pub references: HashSet<String>,
    /// Identifiers of articles citing this one.
    pub cited_by: HashSet<String>,
}

impl GraphArticle {
    /// Identifiers under which other articles may refer to this one.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str()).chain(self.external_id.as_deref())
    }

    /// Whether a citation edge links the two articles in either direction.
    pub fn is_linked_to(&self, other: &GraphArticle) -> bool {
        let mentions = |article: &GraphArticle, target: &GraphArticle| {
            target
                .identifiers()
                .any(|key| article.references.contains(key) || article.cited_by.contains(key))
        };
        mentions(self, other) || mentions(other, self)
    }
}

/// Embedding as kept by the article store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "data", rename_all = "snake_case")]
pub enum StoredEmbedding {
    /// Already decoded vector.
    Vector(EmbeddingVector),
    /// JSON array text, e.g. `"[0.1, 0.2]"`.
    Json(String),
    /// Packed little-endian `f32` values.
    LeBytes(Vec<u8>),
}

impl StoredEmbedding {
    /// Decode into a vector; `None` when the payload is malformed or empty.
    pub fn decode(&self) -> Option<EmbeddingVector> {
        let vector = match self {
            StoredEmbedding::Vector(v) => v.clone(),
            StoredEmbedding::Json(text) => serde_json::from_str::<Vec<f32>>(text).ok()?,
            StoredEmbedding::LeBytes(bytes) => {
                if bytes.len() % 4 != 0 {
                    return None;
                }
                bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect()
            }
        };

        if vector.is_empty() || vector.iter().any(|v| !v.is_finite()) {
            None
        } else {
            Some(vector)
        }
    }
}

/// Article row returned by an [`ArticleSource`](super::ArticleSource).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: String,
    #[serde(default)]
    pub external_id: Option<String>,
    pub title: String,
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub embedding: Option<StoredEmbedding>,
}

/// Known citation relationships of one article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationSet {
    pub references: HashSet<String>,
    pub cited_by: HashSet<String>,
}
