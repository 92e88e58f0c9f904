//! Shared fixtures for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use litscope::corpus::{CitationLink, StoredArticle, StoredEmbedding};
use litscope::{ArticleSource, Config, MemoryLibrary, Result};

/// An embedded article.
pub fn article(id: &str, title: &str, year: Option<i32>, embedding: Vec<f32>) -> StoredArticle {
    StoredArticle {
        id: id.to_string(),
        external_id: None,
        title: title.to_string(),
        abstract_text: String::new(),
        year,
        embedding: Some(StoredEmbedding::Vector(embedding)),
    }
}

/// Config with a fixed clustering seed.
pub fn seeded_config(seed: u64) -> Config {
    let mut config = Config::default();
    config.clustering.seed = Some(seed);
    config
}

/// Project `p1` with two topical groups of three articles each.
///
/// Articles within a group point in the same direction; groups are
/// orthogonal. `gnn-1` cites `gnn-2`, and the project cites the external
/// article `ext-1`, which lies in the graph-learning direction.
pub fn two_topic_library() -> Arc<MemoryLibrary> {
    let library = Arc::new(MemoryLibrary::new());

    let articles = [
        ("gnn-1", "Graph neural networks for citation recommendation", 2019, vec![1.0, 0.0, 0.0]),
        ("gnn-2", "Scalable graph neural networks", 2020, vec![2.0, 0.0, 0.0]),
        ("gnn-3", "Graph attention for recommendation", 2023, vec![0.5, 0.0, 0.0]),
        ("prot-1", "Protein folding with deep learning", 2018, vec![0.0, 1.0, 0.0]),
        ("prot-2", "Protein structure prediction benchmarks", 2021, vec![0.0, 3.0, 0.0]),
        ("prot-3", "Folding dynamics of protein complexes", 2022, vec![0.0, 0.7, 0.0]),
    ];
    for (id, title, year, embedding) in articles {
        library.add_article(article(id, title, Some(year), embedding));
    }
    library.add_article(article(
        "ext-1",
        "Message passing on citation graphs",
        Some(2017),
        vec![4.0, 0.0, 0.0],
    ));

    library.add_project(
        "p1",
        &["gnn-1", "gnn-2", "gnn-3", "prot-1", "prot-2", "prot-3"],
    );
    library.add_citation(CitationLink::new("gnn-1", "gnn-2"));
    library.add_citation(CitationLink::new("prot-1", "ext-1"));
    library
}

/// Counts `fetch_articles` calls on the wrapped source.
pub struct CountingSource {
    inner: Arc<MemoryLibrary>,
    fetches: AtomicUsize,
}

impl CountingSource {
    pub fn new(inner: Arc<MemoryLibrary>) -> Self {
        Self {
            inner,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleSource for CountingSource {
    async fn project_article_ids(&self, project_id: &str) -> Result<Vec<String>> {
        self.inner.project_article_ids(project_id).await
    }

    async fn citation_neighbor_ids(&self, project_id: &str) -> Result<Vec<String>> {
        self.inner.citation_neighbor_ids(project_id).await
    }

    async fn fetch_articles(&self, project_id: &str, ids: &[String]) -> Result<Vec<StoredArticle>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_articles(project_id, ids).await
    }
}
