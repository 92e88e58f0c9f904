//! Semantic clustering of a project corpus.
//!
//! K-means over cosine similarity with k-means++ style seeding. Articles whose
//! best centroid similarity stays below the configured minimum are left
//! unassigned (noise) instead of being forced into a cluster.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::similarity::{cosine_similarity, mean_pairwise_similarity};
use crate::cancel::CancellationFlag;
use crate::corpus::{ArticleRecord, EmbeddingVector};
use crate::error::Result;

/// Default bound on assignment/update rounds.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Seeding distances below this are rounding noise of identical directions.
const SEED_DISTANCE_EPSILON: f64 = 1e-9;

/// A group of thematically close articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Mean embedding of the members.
    pub centroid: EmbeddingVector,
    /// Members in corpus order.
    pub members: Vec<ArticleRecord>,
    /// Mean cosine similarity over all member pairs (0.0 below two members).
    pub avg_internal_similarity: f64,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.id.as_str())
    }
}

/// Parameters of a k-means run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    /// Number of centroids to seed.
    pub k: usize,
    /// Minimum similarity for an article to join its best centroid.
    pub min_similarity: f64,
    pub max_iterations: usize,
}

impl KMeansParams {
    pub fn new(k: usize, min_similarity: f64) -> Self {
        Self {
            k,
            min_similarity,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// K-means clusterer over cosine similarity.
#[derive(Debug, Clone)]
pub struct KMeansClusterer {
    params: KMeansParams,
}

impl KMeansClusterer {
    pub fn new(params: KMeansParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &KMeansParams {
        &self.params
    }

    /// Partition the corpus.
    ///
    /// Empty corpora and `k == 0` yield no clusters. The only error is
    /// cancellation, checked once per iteration.
    pub fn cluster<R: Rng + ?Sized>(
        &self,
        corpus: &[ArticleRecord],
        rng: &mut R,
        cancel: &CancellationFlag,
    ) -> Result<Vec<Cluster>> {
        let params = &self.params;
        if corpus.is_empty() || params.k == 0 {
            return Ok(Vec::new());
        }

        let mut centroids = seed_centroids(corpus, params.k, rng);
        let mut labels: Vec<Option<usize>> = Vec::new();
        let mut iterations = 0;
        let mut converged = false;

        for _ in 0..params.max_iterations {
            cancel.check()?;
            iterations += 1;

            let next = assign_to_centroids(corpus, &centroids, params.min_similarity);
            if next == labels {
                converged = true;
                break;
            }
            labels = next;
            update_centroids(corpus, &labels, &mut centroids);
        }

        let clusters: Vec<Cluster> = centroids
            .into_iter()
            .enumerate()
            .filter_map(|(index, centroid)| {
                let members: Vec<ArticleRecord> = corpus
                    .iter()
                    .zip(labels.iter())
                    .filter(|(_, label)| **label == Some(index))
                    .map(|(article, _)| article.clone())
                    .collect();
                if members.is_empty() {
                    return None;
                }

                let embeddings: Vec<&[f32]> =
                    members.iter().map(|m| m.embedding.as_slice()).collect();
                let avg_internal_similarity = mean_pairwise_similarity(&embeddings);
                Some(Cluster {
                    centroid,
                    members,
                    avg_internal_similarity,
                })
            })
            .collect();

        debug!(
            articles = corpus.len(),
            k = params.k,
            iterations,
            converged,
            clusters = clusters.len(),
            noise = labels.iter().filter(|l| l.is_none()).count(),
            "K-means finished"
        );

        Ok(clusters)
    }
}

/// Run k-means without cancellation support.
pub fn cluster_corpus<R: Rng + ?Sized>(
    corpus: &[ArticleRecord],
    params: KMeansParams,
    rng: &mut R,
) -> Vec<Cluster> {
    KMeansClusterer::new(params)
        .cluster(corpus, rng, &CancellationFlag::new())
        .unwrap_or_default()
}

/// Pick up to `k` starting centroids.
///
/// The first is uniform; each next one is sampled with probability
/// proportional to `1 - max similarity` to the centroids chosen so far.
/// Seeding stops early once every remaining article coincides with a centroid.
fn seed_centroids<R: Rng + ?Sized>(
    corpus: &[ArticleRecord],
    k: usize,
    rng: &mut R,
) -> Vec<EmbeddingVector> {
    let n = corpus.len();
    let mut chosen = vec![false; n];
    let mut centroids: Vec<EmbeddingVector> = Vec::with_capacity(k.min(n));

    let first = rng.gen_range(0..n);
    chosen[first] = true;
    centroids.push(corpus[first].embedding.clone());

    while centroids.len() < k {
        let candidates: Vec<(usize, f64)> = (0..n)
            .filter(|&i| !chosen[i])
            .map(|i| {
                let nearest = centroids
                    .iter()
                    .map(|c| cosine_similarity(&corpus[i].embedding, c))
                    .fold(f64::NEG_INFINITY, f64::max);
                let distance = 1.0 - nearest;
                (i, if distance > SEED_DISTANCE_EPSILON { distance } else { 0.0 })
            })
            .collect();

        let total: f64 = candidates.iter().map(|(_, d)| d).sum();
        if candidates.is_empty() || total <= 0.0 {
            debug!(seeded = centroids.len(), k, "Stopping seeding early");
            break;
        }

        let mut target = rng.gen::<f64>() * total;
        let mut pick = None;
        for &(index, distance) in &candidates {
            if distance <= 0.0 {
                continue;
            }
            pick = Some(index);
            if target < distance {
                break;
            }
            target -= distance;
        }

        // A positive total guarantees at least one positive-weight candidate.
        let Some(index) = pick else { break };
        chosen[index] = true;
        centroids.push(corpus[index].embedding.clone());
    }

    centroids
}

/// Label each article with its most similar centroid, or `None` when that
/// similarity is below `min_similarity`. Ties go to the lower centroid index.
fn assign_to_centroids(
    corpus: &[ArticleRecord],
    centroids: &[EmbeddingVector],
    min_similarity: f64,
) -> Vec<Option<usize>> {
    corpus
        .iter()
        .map(|article| {
            let mut best: Option<(usize, f64)> = None;
            for (index, centroid) in centroids.iter().enumerate() {
                let sim = cosine_similarity(&article.embedding, centroid);
                if best.map_or(true, |(_, best_sim)| sim > best_sim) {
                    best = Some((index, sim));
                }
            }
            best.filter(|(_, sim)| *sim >= min_similarity)
                .map(|(index, _)| index)
        })
        .collect()
}

/// Move each centroid to the mean of its members; empty centroids stay put.
fn update_centroids(
    corpus: &[ArticleRecord],
    labels: &[Option<usize>],
    centroids: &mut [EmbeddingVector],
) {
    for (index, centroid) in centroids.iter_mut().enumerate() {
        let dim = centroid.len();
        let mut sum = vec![0.0f64; dim];
        let mut count = 0usize;

        for (article, label) in corpus.iter().zip(labels) {
            if *label != Some(index) || article.embedding.len() != dim {
                continue;
            }
            for (acc, value) in sum.iter_mut().zip(&article.embedding) {
                *acc += *value as f64;
            }
            count += 1;
        }

        if count > 0 {
            *centroid = sum.into_iter().map(|v| (v / count as f64) as f32).collect();
        }
    }
}
