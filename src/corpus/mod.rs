//! Corpus loading for semantic analysis.
//!
//! Articles, embeddings and citation edges live in external stores. This
//! module defines the contracts those stores satisfy and adapts their rows
//! into the in-memory corpora consumed by clustering and gap detection:
//!
//! - [`CorpusLoader::load_project_corpus`]: the project's own embedded articles
//! - [`CorpusLoader::load_graph_corpus`]: project articles plus their one-hop
//!   citation neighbourhood, tagged with reference / cited-by sets
//!
//! [`MemoryLibrary`] implements both contracts over an in-memory snapshot.

mod loader;
mod memory;
mod traits;
mod types;

pub use loader::*;
pub use memory::*;
pub use traits::*;
pub use types::*;
