//! Collaborator contracts for article and citation data.

use std::collections::HashMap;

use async_trait::async_trait;

use super::{CitationSet, StoredArticle};
use crate::error::Result;

/// Source of project articles and their stored embeddings.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Identifiers of the articles that belong to the project.
    async fn project_article_ids(&self, project_id: &str) -> Result<Vec<String>>;

    /// Identifiers of articles one citation hop away from the project
    /// (referenced by or citing a project article).
    async fn citation_neighbor_ids(&self, project_id: &str) -> Result<Vec<String>>;

    /// Fetch article rows by identifier.
    ///
    /// Fails with `SourceError::EmbeddingsUnavailable` when embeddings have not
    /// been computed for the project yet.
    async fn fetch_articles(&self, project_id: &str, ids: &[String]) -> Result<Vec<StoredArticle>>;
}

/// Source of citation edges.
#[async_trait]
pub trait CitationSource: Send + Sync {
    /// Reference and cited-by identifier sets, keyed by article id.
    async fn citation_sets(&self, ids: &[String]) -> Result<HashMap<String, CitationSet>>;
}
