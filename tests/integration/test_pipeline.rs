//! End-to-end pipeline tests.

use std::collections::HashSet;
use std::sync::Arc;

use litscope::config::default_palette;
use litscope::{
    build_gap_analysis_cache_key, CacheStore, MemoryClusterStore, MemoryLibrary, MokaCacheStore,
    SemanticCoordinatorBuilder, TaskOutcome,
};

use crate::common::{article, seeded_config, two_topic_library, CountingSource};

#[tokio::test]
async fn test_prepare_clusters_and_warms_gaps() {
    let library = two_topic_library();
    let store = Arc::new(MemoryClusterStore::new());
    let cache = Arc::new(MokaCacheStore::with_capacity(100));
    let coordinator = SemanticCoordinatorBuilder::new()
        .config(seeded_config(7))
        .library(library)
        .store(store.clone())
        .cache(cache.clone())
        .build()
        .unwrap();

    let report = coordinator.run_auto_semantic_preparation("p1").await;
    assert_eq!(report.clusters, TaskOutcome::Success(2));
    // gnn group + ext-1 minus the gnn-1 -> gnn-2 citation, plus the protein group
    assert_eq!(report.gaps, TaskOutcome::Success(8));

    let clusters = coordinator.list_clusters("p1").await.unwrap();
    assert_eq!(clusters.len(), 2);

    let palette = default_palette();
    let colors: HashSet<&str> = clusters.iter().map(|c| c.color.as_str()).collect();
    assert_eq!(colors, HashSet::from([palette[0].as_str(), palette[1].as_str()]));

    let mut member_sets: Vec<Vec<String>> = clusters
        .iter()
        .map(|c| {
            let mut ids: Vec<String> = c.members.iter().map(|m| m.article_id.clone()).collect();
            ids.sort();
            ids
        })
        .collect();
    member_sets.sort();
    assert_eq!(
        member_sets,
        vec![
            vec!["gnn-1", "gnn-2", "gnn-3"],
            vec!["prot-1", "prot-2", "prot-3"],
        ]
    );

    for cluster in &clusters {
        assert!(cluster.avg_internal_similarity > 0.99);
        assert!(cluster.name_en.starts_with("Cluster "));
        assert!(cluster.members.iter().all(|m| m.similarity_to_center > 0.99));
        let central = cluster.central_article_id.as_deref().unwrap();
        assert!(cluster.members.iter().any(|m| m.article_id == central));
    }

    let graph = clusters
        .iter()
        .find(|c| c.members.iter().any(|m| m.article_id == "gnn-1"))
        .unwrap();
    assert!(graph.keywords.contains(&"graph".to_string()));
    assert!(graph.name_local.contains("graph"));

    let key = build_gap_analysis_cache_key("p1", 0.7, 50, None, None);
    assert!(cache.get(&key).await.unwrap().is_some());
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_recompute_replaces_previous_clusters() {
    let store = Arc::new(MemoryClusterStore::new());
    let coordinator = SemanticCoordinatorBuilder::new()
        .config(seeded_config(3))
        .library(two_topic_library())
        .store(store.clone())
        .build()
        .unwrap();

    assert_eq!(coordinator.recompute_clusters("p1").await.unwrap(), 2);
    assert_eq!(coordinator.recompute_clusters("p1").await.unwrap(), 2);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_undersized_clusters_are_discarded() {
    let library = Arc::new(MemoryLibrary::new());
    let articles = [
        ("a1", vec![1.0, 0.0]),
        ("a2", vec![2.0, 0.0]),
        ("a3", vec![3.0, 0.0]),
        ("a4", vec![4.0, 0.0]),
        ("b1", vec![0.0, 1.0]),
        ("b2", vec![0.0, 2.0]),
    ];
    for (id, embedding) in articles {
        library.add_article(article(id, &format!("Article {id}"), None, embedding));
    }
    library.add_project("p1", &["a1", "a2", "a3", "a4", "b1", "b2"]);

    let coordinator = SemanticCoordinatorBuilder::new()
        .config(seeded_config(5))
        .library(library)
        .build()
        .unwrap();

    assert_eq!(coordinator.recompute_clusters("p1").await.unwrap(), 1);
    let clusters = coordinator.list_clusters("p1").await.unwrap();
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members.len(), 4);
    assert!(clusters
        .iter()
        .all(|c| c.members.len() >= coordinator.config().clustering.min_cluster_size));
}

#[tokio::test]
async fn test_small_corpus_creates_no_clusters() {
    let library = Arc::new(MemoryLibrary::new());
    for i in 0..5 {
        library.add_article(article(&format!("a{i}"), "Title", None, vec![1.0, i as f32]));
    }
    library.add_project("p1", &["a0", "a1", "a2", "a3", "a4"]);

    let coordinator = SemanticCoordinatorBuilder::new()
        .config(seeded_config(1))
        .library(library)
        .build()
        .unwrap();

    let report = coordinator.run_auto_semantic_preparation("p1").await;
    assert_eq!(report.clusters_created(), 0);
    assert!(report.clusters.is_success());
    assert!(coordinator.list_clusters("p1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gap_analysis_is_served_from_cache() {
    let source = Arc::new(CountingSource::new(two_topic_library()));
    let coordinator = SemanticCoordinatorBuilder::new()
        .articles(source.clone())
        .citations(two_topic_library())
        .build()
        .unwrap();

    let first = coordinator
        .warm_gap_analysis_cache("p1", 0.7, 50, None, None)
        .await
        .unwrap();
    let fetches = source.fetches();
    assert_eq!(fetches, 1);

    let second = coordinator
        .warm_gap_analysis_cache("p1", 0.7, 50, None, None)
        .await
        .unwrap();
    assert_eq!(source.fetches(), fetches);
    assert_eq!(first, second);

    coordinator
        .warm_gap_analysis_cache("p1", 0.7, 3, None, None)
        .await
        .unwrap();
    assert_eq!(source.fetches(), fetches + 1);
}

#[tokio::test]
async fn test_citation_edge_excludes_pair() {
    let library = Arc::new(MemoryLibrary::new());
    library.add_article(article("x", "Sparse attention", Some(2023), vec![1.0, 0.0]));
    library.add_article(article("y", "Sparse transformers", Some(2023), vec![0.85, 0.526_782_7]));
    library.add_project("p1", &["x", "y"]);

    let coordinator = SemanticCoordinatorBuilder::new()
        .library(library.clone())
        .build()
        .unwrap();
    let result = coordinator
        .warm_gap_analysis_cache("p1", 0.7, 50, None, None)
        .await
        .unwrap();
    assert_eq!(result.total_gaps, 1);
    assert_eq!(result.gaps[0].similarity_percent, 85);
    assert!(result.gaps[0].reason.contains("duplication of effort"));

    library.add_citation(litscope::corpus::CitationLink::new("y", "x"));
    let coordinator = SemanticCoordinatorBuilder::new()
        .library(library)
        .build()
        .unwrap();
    let result = coordinator
        .warm_gap_analysis_cache("p1", 0.7, 50, None, None)
        .await
        .unwrap();
    assert!(result.gaps.is_empty());
}

#[tokio::test]
async fn test_year_filter_and_limit() {
    let coordinator = SemanticCoordinatorBuilder::new()
        .library(two_topic_library())
        .build()
        .unwrap();

    let result = coordinator
        .warm_gap_analysis_cache("p1", 0.7, 50, Some(2020), None)
        .await
        .unwrap();
    let pairs: HashSet<(String, String)> = result
        .gaps
        .iter()
        .map(|g| (g.article1.id.clone(), g.article2.id.clone()))
        .collect();
    assert_eq!(
        pairs,
        HashSet::from([
            ("gnn-2".to_string(), "gnn-3".to_string()),
            ("prot-2".to_string(), "prot-3".to_string()),
        ])
    );

    let limited = coordinator
        .warm_gap_analysis_cache("p1", 0.7, 3, None, None)
        .await
        .unwrap();
    assert_eq!(limited.gaps.len(), 3);
    assert!(limited
        .gaps
        .windows(2)
        .all(|w| w[0].similarity >= w[1].similarity));
}

#[tokio::test]
async fn test_unavailable_embeddings_yield_cached_empty_result() {
    let library = Arc::new(MemoryLibrary::new());
    let mut pending = article("a", "Pending", None, vec![]);
    pending.embedding = None;
    library.add_article(pending);
    library.add_project("p1", &["a"]);

    let source = Arc::new(CountingSource::new(library.clone()));
    let coordinator = SemanticCoordinatorBuilder::new()
        .articles(source.clone())
        .citations(library)
        .build()
        .unwrap();

    let result = coordinator
        .warm_gap_analysis_cache("p1", 0.7, 50, None, None)
        .await
        .unwrap();
    assert!(result.gaps.is_empty());
    assert_eq!(result.total_gaps, 0);

    coordinator
        .warm_gap_analysis_cache("p1", 0.7, 50, None, None)
        .await
        .unwrap();
    assert_eq!(source.fetches(), 1);
}
