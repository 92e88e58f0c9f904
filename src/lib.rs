//! Litscope: semantic clustering and citation-gap detection
//!
//! Groups the articles of a research project by embedding similarity and
//! finds pairs of highly similar articles that do not cite each other.

pub mod analysis;
pub mod cache;
pub mod cancel;
pub mod config;
pub mod coordinator;
pub mod corpus;
pub mod error;
pub mod storage;

pub use analysis::{
    build_gap_analysis_cache_key, cosine_similarity, extract_keywords, find_central_article,
    find_gaps, Cluster, ClusterPalette, ClusterSummarizer, ClusterSummary, GapAnalysisResult,
    GapDetector, GapPair, GapQuery, KMeansClusterer, KMeansParams,
};
pub use cache::{CacheStats, CacheStore, MokaCacheStore};
pub use cancel::CancellationFlag;
pub use config::Config;
pub use coordinator::{
    PreparationReport, SemanticCoordinator, SemanticCoordinatorBuilder, TaskOutcome,
};
pub use corpus::{
    ArticleRecord, ArticleSource, CitationSource, CorpusLoader, GraphArticle, MemoryLibrary,
};
pub use error::{LitscopeError, Result};
pub use storage::{ClusterStore, MemoryClusterStore, StoredCluster};
