//! Tests for the SemanticCoordinator.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::{NamedTempFile, TempDir};
use tokio::sync::Semaphore;

use litscope::corpus::{CitationLink, LibrarySnapshot, ProjectEntry, StoredArticle, StoredEmbedding};
use litscope::storage::{ClusterMemberRow, NewClusterRow};
use litscope::{
    ArticleSource, ClusterStore, Config, MemoryLibrary, Result, SemanticCoordinatorBuilder,
    StoredCluster, TaskOutcome,
};

use crate::common::{article, two_topic_library};

/// Write a snapshot of `two_topic_library`'s content to a temp directory.
fn write_snapshot(dir: &TempDir) -> std::path::PathBuf {
    let vector = |v: &[f32]| Some(StoredEmbedding::Json(serde_json::to_string(v).unwrap()));
    let mut articles: Vec<StoredArticle> = vec![
        article("gnn-1", "Graph neural networks", Some(2019), vec![]),
        article("gnn-2", "Graph neural networks at scale", Some(2020), vec![]),
        article("gnn-3", "Graph attention networks", Some(2021), vec![]),
        article("prot-1", "Protein folding", Some(2018), vec![]),
        article("prot-2", "Protein structure prediction", Some(2021), vec![]),
        article("prot-3", "Folding dynamics of protein", Some(2022), vec![]),
    ];
    let embeddings: [&[f32]; 6] = [
        &[1.0, 0.0],
        &[2.0, 0.0],
        &[3.0, 0.0],
        &[0.0, 1.0],
        &[0.0, 2.0],
        &[0.0, 3.0],
    ];
    for (article, embedding) in articles.iter_mut().zip(embeddings) {
        article.embedding = vector(embedding);
    }

    let snapshot = LibrarySnapshot {
        projects: vec![ProjectEntry {
            id: "p1".to_string(),
            article_ids: articles.iter().map(|a| a.id.clone()).collect(),
        }],
        articles,
        citations: vec![CitationLink::new("gnn-1", "gnn-2")],
    };

    let path = dir.path().join("library.json");
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

/// Blocks `project_article_ids` until a permit is released.
struct GatedSource {
    inner: Arc<MemoryLibrary>,
    gate: Semaphore,
}

#[async_trait]
impl ArticleSource for GatedSource {
    async fn project_article_ids(&self, project_id: &str) -> Result<Vec<String>> {
        let _permit = self.gate.acquire().await.unwrap();
        self.inner.project_article_ids(project_id).await
    }

    async fn citation_neighbor_ids(&self, project_id: &str) -> Result<Vec<String>> {
        self.inner.citation_neighbor_ids(project_id).await
    }

    async fn fetch_articles(&self, project_id: &str, ids: &[String]) -> Result<Vec<StoredArticle>> {
        self.inner.fetch_articles(project_id, ids).await
    }
}

/// Store whose inserts always fail.
struct ReadOnlyStore;

#[async_trait]
impl ClusterStore for ReadOnlyStore {
    async fn delete_project_clusters(&self, _project_id: &str) -> Result<usize> {
        Ok(0)
    }

    async fn insert_cluster(&self, _row: NewClusterRow) -> Result<String> {
        Err(litscope::error::StorageError::Write("read-only replica".to_string()).into())
    }

    async fn upsert_member(&self, _row: ClusterMemberRow) -> Result<()> {
        Err(litscope::error::StorageError::Write("read-only replica".to_string()).into())
    }

    async fn list_clusters(&self, _project_id: &str) -> Result<Vec<StoredCluster>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_coordinator_from_config_and_snapshot() {
    let dir = TempDir::new().unwrap();
    let snapshot_path = write_snapshot(&dir);

    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(
        config_file,
        r##"
[clustering]
num_clusters = 4
seed = 99
palette = ["#aaaaaa", "#bbbbbb"]

[gaps]
threshold = 0.9
limit = 10

[library]
snapshot_path = "{}"
"##,
        snapshot_path.display()
    )
    .unwrap();

    let config = Config::from_file(config_file.path()).unwrap();
    assert_eq!(config.snapshot_path(), snapshot_path);

    let library = MemoryLibrary::from_file(config.snapshot_path()).unwrap();
    assert_eq!(library.article_count(), 6);

    let coordinator = SemanticCoordinatorBuilder::new()
        .config(config)
        .library(Arc::new(library))
        .build()
        .unwrap();

    let report = coordinator.run_auto_semantic_preparation("p1").await;
    assert_eq!(report.clusters, TaskOutcome::Success(2));
    assert_eq!(report.gaps, TaskOutcome::Success(5));

    let mut colors: Vec<String> = coordinator
        .list_clusters("p1")
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.color)
        .collect();
    colors.sort();
    assert_eq!(colors, vec!["#aaaaaa", "#bbbbbb"]);
}

#[tokio::test]
async fn test_concurrent_preparation_is_single_flight() {
    let source = Arc::new(GatedSource {
        inner: two_topic_library(),
        gate: Semaphore::new(0),
    });
    let coordinator = SemanticCoordinatorBuilder::new()
        .config(crate::common::seeded_config(2))
        .articles(source.clone())
        .citations(two_topic_library())
        .build()
        .unwrap();

    let (first, second, _) = tokio::join!(
        coordinator.run_auto_semantic_preparation("p1"),
        coordinator.run_auto_semantic_preparation("p1"),
        async {
            tokio::task::yield_now().await;
            source.gate.add_permits(8);
        }
    );

    assert_eq!(first.clusters, TaskOutcome::Success(2));
    assert_eq!(first.gaps, TaskOutcome::Success(8));
    assert_eq!(
        second.clusters,
        TaskOutcome::Failure("preparation already running".to_string())
    );
    assert_eq!(second.gaps_warmed(), 0);

    // The guard is released once the first run completes.
    let third = coordinator.run_auto_semantic_preparation("p1").await;
    assert!(third.clusters.is_success());
}

#[tokio::test]
async fn test_cancel_preparation_mid_run() {
    let source = Arc::new(GatedSource {
        inner: two_topic_library(),
        gate: Semaphore::new(0),
    });
    let coordinator = SemanticCoordinatorBuilder::new()
        .config(crate::common::seeded_config(2))
        .articles(source.clone())
        .citations(two_topic_library())
        .build()
        .unwrap();

    let (cancelled, _) = tokio::join!(
        coordinator.run_auto_semantic_preparation("p1"),
        async {
            tokio::task::yield_now().await;
            assert!(coordinator.cancel_preparation("p1"));
            assert!(!coordinator.cancel_preparation("p2"));
            source.gate.add_permits(8);
        }
    );
    assert!(!cancelled.clusters.is_success());
    assert!(!cancelled.gaps.is_success());

    // A fresh run is not affected by the earlier cancellation.
    let later = coordinator.run_auto_semantic_preparation("p1").await;
    assert_eq!(later.clusters, TaskOutcome::Success(2));
    assert_eq!(later.gaps, TaskOutcome::Success(8));
}

#[tokio::test]
async fn test_cluster_failure_leaves_gap_warmup_intact() {
    let coordinator = SemanticCoordinatorBuilder::new()
        .config(crate::common::seeded_config(4))
        .library(two_topic_library())
        .store(Arc::new(ReadOnlyStore))
        .build()
        .unwrap();

    let report = coordinator.run_auto_semantic_preparation("p1").await;
    assert!(matches!(report.clusters, TaskOutcome::Failure(ref reason) if reason.contains("read-only replica")));
    assert_eq!(report.clusters_created(), 0);
    assert_eq!(report.gaps, TaskOutcome::Success(8));
}

#[tokio::test]
async fn test_unknown_project_reports_failures() {
    let coordinator = SemanticCoordinatorBuilder::new()
        .library(Arc::new(MemoryLibrary::new()))
        .build()
        .unwrap();

    let report = coordinator.run_auto_semantic_preparation("missing").await;
    assert!(matches!(report.clusters, TaskOutcome::Failure(ref reason) if reason.contains("missing")));
    assert!(!report.gaps.is_success());
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config_file = NamedTempFile::new().unwrap();
    writeln!(config_file, "[gaps]\nlimit = 0").unwrap();
    assert!(Config::from_file(config_file.path()).is_err());
}
