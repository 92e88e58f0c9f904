//! Semantic analysis over article embeddings.
//!
//! ```text
//! project corpus ──► KMeansClusterer ──► ClusterSummarizer ──► ClusterStore
//!
//! project + citation neighbourhood ──► find_gaps ──► CacheStore
//! ```
//!
//! - [`cosine_similarity`]: the similarity measure used throughout
//! - [`KMeansClusterer`]: k-means with k-means++ seeding and a noise threshold
//! - [`ClusterSummarizer`]: central article, title keywords, colour, names
//! - [`GapDetector`]: similar article pairs without a citation edge, cached

mod clustering;
mod gaps;
mod keywords;
mod similarity;
mod summary;

pub use clustering::*;
pub use gaps::*;
pub use keywords::*;
pub use similarity::*;
pub use summary::*;
