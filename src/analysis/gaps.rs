//! Citation gap detection.
//!
//! A gap is a pair of semantically similar articles with no citation edge
//! between them in either direction: likely missed related work. The pair
//! scan covers the project articles and their one-hop citation neighbourhood.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::similarity::cosine_similarity;
use crate::cache::CacheStore;
use crate::cancel::CancellationFlag;
use crate::config::GapConfig;
use crate::corpus::{CorpusLoader, GraphArticle};
use crate::error::{AnalysisError, Result};

/// Lightweight article reference carried by a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapArticleRef {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
}

impl From<&GraphArticle> for GapArticleRef {
    fn from(article: &GraphArticle) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            year: article.year,
        }
    }
}

/// Two similar articles without a citation relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapPair {
    pub article1: GapArticleRef,
    pub article2: GapArticleRef,
    /// Cosine similarity of the two embeddings.
    pub similarity: f64,
    /// Similarity as a rounded percentage.
    pub similarity_percent: u32,
    pub reason: String,
}

/// Outcome of a gap analysis, as cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysisResult {
    /// Gaps by descending similarity.
    pub gaps: Vec<GapPair>,
    pub threshold: f64,
    pub total_gaps: usize,
}

impl GapAnalysisResult {
    pub fn new(gaps: Vec<GapPair>, threshold: f64) -> Self {
        Self {
            total_gaps: gaps.len(),
            gaps,
            threshold,
        }
    }

    pub fn empty(threshold: f64) -> Self {
        Self::new(Vec::new(), threshold)
    }
}

/// Inclusive publication year filter; open bounds accept any year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl YearRange {
    pub fn new(from: Option<i32>, to: Option<i32>) -> Self {
        Self { from, to }
    }

    /// Unknown years always pass.
    pub fn admits(&self, year: Option<i32>) -> bool {
        let Some(year) = year else { return true };
        self.from.map_or(true, |from| year >= from) && self.to.map_or(true, |to| year <= to)
    }
}

/// Parameters of one gap analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GapQuery {
    pub threshold: f64,
    pub limit: usize,
    pub years: YearRange,
}

impl GapQuery {
    pub fn new(threshold: f64, limit: usize) -> Self {
        Self {
            threshold,
            limit,
            years: YearRange::default(),
        }
    }

    pub fn with_years(mut self, from: Option<i32>, to: Option<i32>) -> Self {
        self.years = YearRange::new(from, to);
        self
    }

    /// Reject thresholds that are non-finite or outside `[-1, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(-1.0..=1.0).contains(&self.threshold) {
            return Err(AnalysisError::InvalidParameter(format!(
                "gap threshold must be a finite value within [-1, 1], got {}",
                self.threshold
            ))
            .into());
        }
        Ok(())
    }

    pub fn cache_key(&self, project_id: &str) -> String {
        build_gap_analysis_cache_key(
            project_id,
            self.threshold,
            self.limit,
            self.years.from,
            self.years.to,
        )
    }
}

impl From<&GapConfig> for GapQuery {
    fn from(config: &GapConfig) -> Self {
        Self::new(config.threshold, config.limit)
    }
}

/// Cache key shared by the warmup writer and request-time readers.
///
/// `proj:{project}:graph:gaps:{threshold:.3}:{limit}:{from|any}:{to|any}`
pub fn build_gap_analysis_cache_key(
    project_id: &str,
    threshold: f64,
    limit: usize,
    year_from: Option<i32>,
    year_to: Option<i32>,
) -> String {
    let bound = |year: Option<i32>| year.map_or_else(|| "any".to_string(), |y| y.to_string());
    format!(
        "proj:{}:graph:gaps:{:.3}:{}:{}:{}",
        project_id,
        threshold,
        limit,
        bound(year_from),
        bound(year_to)
    )
}

/// Human-readable explanation of a gap.
pub fn gap_reason(similarity_percent: u32, year_gap: Option<i32>) -> String {
    match year_gap {
        Some(gap) if gap <= 2 => format!(
            "{}% semantic similarity, published within {} year(s) of each other: \
             might be independently-discovered duplication of effort",
            similarity_percent, gap
        ),
        Some(gap) if gap <= 5 => format!(
            "{}% semantic similarity, published {} years apart: \
             check citations, might be a missed reference",
            similarity_percent, gap
        ),
        _ => format!(
            "{}% semantic similarity: the articles address closely related topics \
             but neither cites the other",
            similarity_percent
        ),
    }
}

/// A qualifying pair by corpus position. Orders by similarity, then by scan
/// order (earlier pairs rank higher).
#[derive(Debug, Clone, Copy)]
struct Candidate {
    similarity: f64,
    first: usize,
    second: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.similarity
            .total_cmp(&other.similarity)
            .then_with(|| other.first.cmp(&self.first))
            .then_with(|| other.second.cmp(&self.second))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Scan all article pairs for gaps.
///
/// Keeps pairs at or above the threshold with no citation edge in either
/// direction and admitted by the year filter, ordered by descending
/// similarity and truncated to the limit. Only the best `limit` pairs are
/// held in memory. Cancellation is checked per row.
pub fn find_gaps(
    corpus: &[GraphArticle],
    query: &GapQuery,
    cancel: &CancellationFlag,
) -> Result<Vec<GapPair>> {
    query.validate()?;
    if query.limit == 0 {
        return Ok(Vec::new());
    }

    // Min-heap: the weakest retained pair sits on top.
    let mut best: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();

    for (i, first) in corpus.iter().enumerate() {
        cancel.check()?;
        if !query.years.admits(first.year) {
            continue;
        }

        for (j, second) in corpus.iter().enumerate().skip(i + 1) {
            if !query.years.admits(second.year) {
                continue;
            }

            let similarity = cosine_similarity(&first.embedding, &second.embedding);
            if similarity < query.threshold || first.is_linked_to(second) {
                continue;
            }

            best.push(Reverse(Candidate {
                similarity,
                first: i,
                second: j,
            }));
            if best.len() > query.limit {
                best.pop();
            }
        }
    }

    Ok(best
        .into_sorted_vec()
        .into_iter()
        .map(|Reverse(candidate)| {
            let (first, second) = (&corpus[candidate.first], &corpus[candidate.second]);
            let similarity = candidate.similarity;
            let similarity_percent = (similarity.clamp(0.0, 1.0) * 100.0).round() as u32;
            let year_gap = match (first.year, second.year) {
                (Some(a), Some(b)) => Some((a - b).abs()),
                _ => None,
            };

            GapPair {
                article1: first.into(),
                article2: second.into(),
                similarity,
                similarity_percent,
                reason: gap_reason(similarity_percent, year_gap),
            }
        })
        .collect())
}

/// Cached gap analysis over a project's citation neighbourhood.
#[derive(Clone)]
pub struct GapDetector {
    loader: CorpusLoader,
    cache: Arc<dyn CacheStore>,
    config: GapConfig,
}

impl GapDetector {
    pub fn new(loader: CorpusLoader, cache: Arc<dyn CacheStore>, config: GapConfig) -> Self {
        Self {
            loader,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    /// Return the cached analysis for `query`, computing and caching it on a miss.
    ///
    /// A project without embeddings yields an empty result, cached with the
    /// shorter not-ready TTL.
    pub async fn detect_gaps(
        &self,
        project_id: &str,
        query: &GapQuery,
        cancel: &CancellationFlag,
    ) -> Result<GapAnalysisResult> {
        query.validate()?;
        let key = query.cache_key(project_id);
        if let Some(cached) = self.cached(&key).await {
            debug!(project_id, key = %key, "Gap analysis served from cache");
            return Ok(cached);
        }

        let corpus = match self.loader.load_graph_corpus(project_id).await {
            Ok(corpus) => corpus,
            Err(e) if e.is_embeddings_unavailable() => {
                info!(project_id, "Embeddings not ready, caching empty gap analysis");
                let result = GapAnalysisResult::empty(query.threshold);
                self.store(&key, &result, Duration::from_secs(self.config.not_ready_ttl_secs))
                    .await;
                return Ok(result);
            }
            Err(e) => return Err(e),
        };

        let gaps = find_gaps(&corpus, query, cancel)?;
        let result = GapAnalysisResult::new(gaps, query.threshold);
        info!(
            project_id,
            articles = corpus.len(),
            threshold = query.threshold,
            gaps = result.total_gaps,
            "Gap analysis computed"
        );

        self.store(&key, &result, Duration::from_secs(self.config.cache_ttl_secs))
            .await;
        Ok(result)
    }

    async fn cached(&self, key: &str) -> Option<GapAnalysisResult> {
        match self.cache.get(key).await {
            Ok(Some(payload)) => match serde_json::from_str(&payload) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!(key, error = %e, "Discarding undecodable cached gap analysis");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Gap cache read failed");
                None
            }
        }
    }

    async fn store(&self, key: &str, result: &GapAnalysisResult, ttl: Duration) {
        let payload = match serde_json::to_string(result) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize gap analysis");
                return;
            }
        };

        if let Err(e) = self.cache.set(key, payload, ttl).await {
            warn!(key, error = %e, "Gap cache write failed");
        }
    }
}
