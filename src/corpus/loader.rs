//! Turns stored article rows into in-memory corpora.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use super::{ArticleRecord, ArticleSource, CitationSource, GraphArticle, StoredArticle};
use crate::error::Result;

/// Loads the clustering corpus and the citation-neighbourhood corpus of a project.
#[derive(Clone)]
pub struct CorpusLoader {
    articles: Arc<dyn ArticleSource>,
    citations: Arc<dyn CitationSource>,
}

impl CorpusLoader {
    pub fn new(articles: Arc<dyn ArticleSource>, citations: Arc<dyn CitationSource>) -> Self {
        Self { articles, citations }
    }

    /// Project articles with a usable embedding.
    pub async fn load_project_corpus(&self, project_id: &str) -> Result<Vec<ArticleRecord>> {
        let ids = self.articles.project_article_ids(project_id).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.articles.fetch_articles(project_id, &ids).await?;
        let records: Vec<ArticleRecord> = rows
            .into_iter()
            .filter_map(|row| {
                let embedding = decode_row(&row)?;
                Some(ArticleRecord {
                    id: row.id,
                    title: row.title,
                    abstract_text: row.abstract_text,
                    embedding,
                })
            })
            .collect();

        debug!(project_id, articles = records.len(), "Loaded project corpus");
        Ok(records)
    }

    /// Project articles plus their one-hop citation neighbourhood, each tagged
    /// with its citation sets.
    pub async fn load_graph_corpus(&self, project_id: &str) -> Result<Vec<GraphArticle>> {
        let project_ids = self.articles.project_article_ids(project_id).await?;
        let neighbor_ids = self.articles.citation_neighbor_ids(project_id).await?;
        let ids = resolve_neighborhood(&project_ids, &neighbor_ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.articles.fetch_articles(project_id, &ids).await?;
        let rows: Vec<(StoredArticle, Vec<f32>)> = rows
            .into_iter()
            .filter_map(|row| decode_row(&row).map(|embedding| (row, embedding)))
            .collect();

        let loaded_ids: Vec<String> = rows.iter().map(|(row, _)| row.id.clone()).collect();
        let mut citation_sets = self.citations.citation_sets(&loaded_ids).await?;

        let corpus: Vec<GraphArticle> = rows
            .into_iter()
            .map(|(row, embedding)| {
                let citations = citation_sets.remove(&row.id).unwrap_or_default();
                GraphArticle {
                    id: row.id,
                    external_id: row.external_id,
                    title: row.title,
                    year: row.year,
                    embedding,
                    references: citations.references,
                    cited_by: citations.cited_by,
                }
            })
            .collect();

        debug!(
            project_id,
            project_articles = project_ids.len(),
            neighbors = neighbor_ids.len(),
            loaded = corpus.len(),
            "Loaded citation graph corpus"
        );
        Ok(corpus)
    }
}

fn decode_row(row: &StoredArticle) -> Option<Vec<f32>> {
    let decoded = row.embedding.as_ref().and_then(|e| e.decode());
    if decoded.is_none() {
        debug!(article_id = %row.id, "Skipping article without usable embedding");
    }
    decoded
}

/// Union of project and neighbour identifiers, first occurrence order, no duplicates.
pub fn resolve_neighborhood(project_ids: &[String], neighbor_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    project_ids
        .iter()
        .chain(neighbor_ids.iter())
        .filter(|id| seen.insert(*id))
        .cloned()
        .collect()
}
