//! Cluster summaries: representative article, keywords, colour and names.

use serde::{Deserialize, Serialize};

use super::clustering::Cluster;
use super::keywords::{extract_keywords, DEFAULT_MAX_KEYWORDS};
use super::similarity::cosine_similarity;
use crate::config::default_palette;
use crate::corpus::ArticleRecord;

/// Immutable list of cluster colours, assigned cyclically by cluster index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterPalette {
    colors: Vec<String>,
}

impl ClusterPalette {
    /// Build a palette; an empty list falls back to the default colours.
    pub fn new(colors: Vec<String>) -> Self {
        if colors.is_empty() {
            Self::default()
        } else {
            Self { colors }
        }
    }

    pub fn color_for(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

impl Default for ClusterPalette {
    fn default() -> Self {
        Self {
            colors: default_palette(),
        }
    }
}

/// Similarity of one member to its cluster centroid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSimilarity {
    pub article_id: String,
    pub similarity: f64,
}

/// Descriptive data derived from a [`Cluster`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub color: String,
    pub keywords: Vec<String>,
    pub central_article_id: Option<String>,
    /// Member similarities to the centroid, in member order.
    pub member_similarities: Vec<MemberSimilarity>,
    pub name_en: String,
    pub name_local: String,
}

/// Builds [`ClusterSummary`] values.
#[derive(Debug, Clone)]
pub struct ClusterSummarizer {
    palette: ClusterPalette,
    max_keywords: usize,
}

impl ClusterSummarizer {
    /// `max_keywords` is capped at [`DEFAULT_MAX_KEYWORDS`].
    pub fn new(palette: ClusterPalette, max_keywords: usize) -> Self {
        Self {
            palette,
            max_keywords: max_keywords.min(DEFAULT_MAX_KEYWORDS),
        }
    }

    /// Summarize the cluster at position `index` of a run.
    pub fn summarize(&self, index: usize, cluster: &Cluster) -> ClusterSummary {
        let titles: Vec<&str> = cluster.members.iter().map(|m| m.title.as_str()).collect();
        let keywords = extract_keywords(&titles, self.max_keywords);

        let member_similarities = cluster
            .members
            .iter()
            .map(|m| MemberSimilarity {
                article_id: m.id.clone(),
                similarity: cosine_similarity(&m.embedding, &cluster.centroid),
            })
            .collect();

        let (name_en, name_local) = cluster_names(index, &keywords);

        ClusterSummary {
            color: self.palette.color_for(index).to_string(),
            central_article_id: find_central_article(&cluster.members).map(|a| a.id.clone()),
            keywords,
            member_similarities,
            name_en,
            name_local,
        }
    }
}

impl Default for ClusterSummarizer {
    fn default() -> Self {
        Self::new(ClusterPalette::default(), DEFAULT_MAX_KEYWORDS)
    }
}

/// The member with the highest summed similarity to all other members.
///
/// Ties go to the member seen first; `None` for an empty cluster.
pub fn find_central_article(members: &[ArticleRecord]) -> Option<&ArticleRecord> {
    let mut best: Option<(&ArticleRecord, f64)> = None;

    for (i, candidate) in members.iter().enumerate() {
        let total: f64 = members
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, other)| cosine_similarity(&candidate.embedding, &other.embedding))
            .sum();

        if best.map_or(true, |(_, best_total)| total > best_total) {
            best = Some((candidate, total));
        }
    }

    best.map(|(article, _)| article)
}

/// English and local display names for a cluster.
fn cluster_names(index: usize, keywords: &[String]) -> (String, String) {
    let number = index + 1;
    if keywords.is_empty() {
        return (format!("Cluster {}", number), format!("Кластер {}", number));
    }

    let head = &keywords[..keywords.len().min(3)];
    (
        format!("Cluster {}: {}", number, head.join(", ")),
        head.join(" / "),
    )
}
