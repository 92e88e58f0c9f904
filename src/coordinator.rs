//! Semantic preparation coordinator.
//!
//! The coordinator runs the two per-project background tasks:
//! - Cluster recomputation: clear stored clusters, cluster the project corpus,
//!   drop undersized clusters, summarize and persist the rest
//! - Gap cache warmup: compute the default gap analysis into the cache
//!
//! The tasks are independent and best-effort. A failure in one is logged and
//! reported as [`TaskOutcome::Failure`]; it never prevents the other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::{
    ClusterPalette, ClusterSummarizer, GapAnalysisResult, GapDetector, GapQuery, KMeansClusterer,
    KMeansParams,
};
use crate::cache::{CacheStore, MokaCacheStore};
use crate::cancel::CancellationFlag;
use crate::config::Config;
use crate::corpus::{ArticleSource, CitationSource, CorpusLoader, MemoryLibrary};
use crate::error::{ConfigError, Result};
use crate::storage::{ClusterMemberRow, ClusterStore, MemoryClusterStore, NewClusterRow, StoredCluster};

/// Outcome of one best-effort task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum TaskOutcome<T> {
    Success(T),
    Failure(String),
}

impl<T> TaskOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Success(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            TaskOutcome::Success(value) => Some(value),
            TaskOutcome::Failure(_) => None,
        }
    }
}

/// Result of [`SemanticCoordinator::run_auto_semantic_preparation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparationReport {
    pub project_id: String,
    /// Number of clusters persisted.
    pub clusters: TaskOutcome<usize>,
    /// Number of gaps in the warmed analysis.
    pub gaps: TaskOutcome<usize>,
}

impl PreparationReport {
    pub fn clusters_created(&self) -> usize {
        self.clusters.value().copied().unwrap_or(0)
    }

    pub fn gaps_warmed(&self) -> usize {
        self.gaps.value().copied().unwrap_or(0)
    }
}

/// Removes the project from the in-flight map when dropped.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashMap<String, CancellationFlag>>,
    project_id: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.project_id);
    }
}

/// Runs clustering and gap warmup for projects.
pub struct SemanticCoordinator {
    config: Config,
    loader: CorpusLoader,
    store: Arc<dyn ClusterStore>,
    gap_detector: GapDetector,
    summarizer: ClusterSummarizer,
    /// Running preparations and their cancellation flags.
    in_flight: Mutex<HashMap<String, CancellationFlag>>,
}

impl SemanticCoordinator {
    pub fn new(
        config: Config,
        articles: Arc<dyn ArticleSource>,
        citations: Arc<dyn CitationSource>,
        store: Arc<dyn ClusterStore>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let loader = CorpusLoader::new(articles, citations);
        let gap_detector = GapDetector::new(loader.clone(), cache, config.gaps.clone());
        let summarizer = ClusterSummarizer::new(
            ClusterPalette::new(config.clustering.palette.clone()),
            config.clustering.max_keywords,
        );

        Self {
            config,
            loader,
            store,
            gap_detector,
            summarizer,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Cancel the running preparation of a project.
    ///
    /// Returns `false` when no preparation is running for it. Other projects
    /// and later runs are unaffected.
    pub fn cancel_preparation(&self, project_id: &str) -> bool {
        match self.in_flight.lock().get(project_id) {
            Some(flag) => {
                flag.cancel();
                info!(project_id, "Semantic preparation cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Recompute clusters and warm the default gap analysis for a project.
    ///
    /// Never fails: each task's outcome is reported separately.
    pub async fn run_auto_semantic_preparation(&self, project_id: &str) -> PreparationReport {
        self.run_auto_semantic_preparation_with(project_id, &CancellationFlag::new())
            .await
    }

    /// Like [`run_auto_semantic_preparation`](Self::run_auto_semantic_preparation),
    /// aborting both tasks once `cancel` is set.
    pub async fn run_auto_semantic_preparation_with(
        &self,
        project_id: &str,
        cancel: &CancellationFlag,
    ) -> PreparationReport {
        let Some(_guard) = self.try_begin(project_id, cancel) else {
            warn!(project_id, "Semantic preparation already running, skipping");
            let reason = "preparation already running".to_string();
            return PreparationReport {
                project_id: project_id.to_string(),
                clusters: TaskOutcome::Failure(reason.clone()),
                gaps: TaskOutcome::Failure(reason),
            };
        };

        let gaps_config = &self.config.gaps;
        let query = GapQuery::new(gaps_config.threshold, gaps_config.limit);
        let (clusters, gaps) = tokio::join!(
            self.recompute(project_id, cancel),
            self.gap_detector.detect_gaps(project_id, &query, cancel),
        );

        let report = PreparationReport {
            project_id: project_id.to_string(),
            clusters: task_outcome(project_id, "cluster recomputation", clusters),
            gaps: task_outcome(
                project_id,
                "gap cache warmup",
                gaps.map(|result| result.total_gaps),
            ),
        };

        info!(
            project_id,
            clusters_created = report.clusters_created(),
            gaps_warmed = report.gaps_warmed(),
            "Semantic preparation finished"
        );
        report
    }

    /// Compute (or fetch from cache) the gap analysis for the given parameters.
    pub async fn warm_gap_analysis_cache(
        &self,
        project_id: &str,
        threshold: f64,
        limit: usize,
        year_from: Option<i32>,
        year_to: Option<i32>,
    ) -> Result<GapAnalysisResult> {
        let query = GapQuery::new(threshold, limit).with_years(year_from, year_to);
        self.gap_detector
            .detect_gaps(project_id, &query, &CancellationFlag::new())
            .await
    }

    /// Replace the stored clusters of a project, returning how many were created.
    pub async fn recompute_clusters(&self, project_id: &str) -> Result<usize> {
        self.recompute(project_id, &CancellationFlag::new()).await
    }

    async fn recompute(&self, project_id: &str, cancel: &CancellationFlag) -> Result<usize> {
        let removed = self.store.delete_project_clusters(project_id).await?;
        debug!(project_id, removed, "Cleared stored clusters");

        let corpus = match self.loader.load_project_corpus(project_id).await {
            Ok(corpus) => corpus,
            Err(e) if e.is_embeddings_unavailable() => {
                info!(project_id, "Embeddings not ready, skipping clustering");
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let settings = &self.config.clustering;
        let k = corpus
            .len()
            .checked_div(settings.min_cluster_size)
            .map_or(0, |max_k| settings.num_clusters.min(max_k));
        if k < 2 {
            info!(
                project_id,
                articles = corpus.len(),
                min_cluster_size = settings.min_cluster_size,
                "Corpus too small for clustering"
            );
            return Ok(0);
        }

        let clusters = {
            let params = KMeansParams::new(k, settings.similarity_threshold)
                .with_max_iterations(settings.max_iterations);
            let mut rng = match settings.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            KMeansClusterer::new(params).cluster(&corpus, &mut rng, cancel)?
        };

        let found = clusters.len();
        let viable: Vec<_> = clusters
            .into_iter()
            .filter(|c| c.size() >= settings.min_cluster_size)
            .collect();

        for (index, cluster) in viable.iter().enumerate() {
            let summary = self.summarizer.summarize(index, cluster);
            let cluster_id = self
                .store
                .insert_cluster(NewClusterRow {
                    project_id: project_id.to_string(),
                    name_local: summary.name_local,
                    name_en: summary.name_en,
                    color: summary.color,
                    keywords: summary.keywords,
                    central_article_id: summary.central_article_id,
                    avg_internal_similarity: cluster.avg_internal_similarity,
                })
                .await?;

            for member in summary.member_similarities {
                self.store
                    .upsert_member(ClusterMemberRow {
                        cluster_id: cluster_id.clone(),
                        article_id: member.article_id,
                        similarity_to_center: member.similarity,
                    })
                    .await?;
            }
        }

        info!(
            project_id,
            articles = corpus.len(),
            k,
            found,
            created = viable.len(),
            "Clusters recomputed"
        );
        Ok(viable.len())
    }

    /// Stored clusters of a project.
    pub async fn list_clusters(&self, project_id: &str) -> Result<Vec<StoredCluster>> {
        self.store.list_clusters(project_id).await
    }

    fn try_begin(&self, project_id: &str, cancel: &CancellationFlag) -> Option<InFlightGuard<'_>> {
        let mut in_flight = self.in_flight.lock();
        if in_flight.contains_key(project_id) {
            return None;
        }
        in_flight.insert(project_id.to_string(), cancel.clone());
        Some(InFlightGuard {
            in_flight: &self.in_flight,
            project_id: project_id.to_string(),
        })
    }
}

fn task_outcome<T>(project_id: &str, task: &str, result: Result<T>) -> TaskOutcome<T> {
    match result {
        Ok(value) => TaskOutcome::Success(value),
        Err(e) => {
            warn!(project_id, task, error = %e, "Semantic task failed");
            TaskOutcome::Failure(e.to_string())
        }
    }
}

/// Builder for [`SemanticCoordinator`].
#[derive(Default)]
pub struct SemanticCoordinatorBuilder {
    config: Option<Config>,
    articles: Option<Arc<dyn ArticleSource>>,
    citations: Option<Arc<dyn CitationSource>>,
    store: Option<Arc<dyn ClusterStore>>,
    cache: Option<Arc<dyn CacheStore>>,
}

impl SemanticCoordinatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use one in-memory library as both article and citation source.
    pub fn library(mut self, library: Arc<MemoryLibrary>) -> Self {
        self.articles = Some(library.clone());
        self.citations = Some(library);
        self
    }

    pub fn articles(mut self, articles: Arc<dyn ArticleSource>) -> Self {
        self.articles = Some(articles);
        self
    }

    pub fn citations(mut self, citations: Arc<dyn CitationSource>) -> Self {
        self.citations = Some(citations);
        self
    }

    pub fn store(mut self, store: Arc<dyn ClusterStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the coordinator; store and cache default to in-memory ones.
    ///
    /// Fails with a configuration error when the config does not validate.
    pub fn build(self) -> Result<SemanticCoordinator> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let articles = self
            .articles
            .ok_or_else(|| ConfigError::MissingField("article source".to_string()))?;
        let citations = self
            .citations
            .ok_or_else(|| ConfigError::MissingField("citation source".to_string()))?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryClusterStore::new()));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(MokaCacheStore::new(&config.cache)));

        Ok(SemanticCoordinator::new(config, articles, citations, store, cache))
    }
}
