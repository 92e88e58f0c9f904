//! In-memory article library backing both corpus collaborator traits.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::{ArticleSource, CitationSet, CitationSource, StoredArticle};
use crate::error::{Result, SourceError};

/// A directed citation edge between two article identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationLink {
    /// Identifier of the citing article.
    pub citing: String,
    /// Identifier of the cited article.
    pub cited: String,
}

impl CitationLink {
    pub fn new(citing: impl Into<String>, cited: impl Into<String>) -> Self {
        Self {
            citing: citing.into(),
            cited: cited.into(),
        }
    }
}

/// Project membership entry of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub id: String,
    pub article_ids: Vec<String>,
}

/// Serialized form of a [`MemoryLibrary`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub articles: Vec<StoredArticle>,
    #[serde(default)]
    pub citations: Vec<CitationLink>,
}

#[derive(Default)]
struct LibraryState {
    projects: HashMap<String, Vec<String>>,
    articles: HashMap<String, StoredArticle>,
    /// External identifier to article id.
    external_index: HashMap<String, String>,
    citations: Vec<CitationLink>,
}

impl LibraryState {
    /// Article id for an article id or external identifier.
    fn resolve<'a>(&'a self, identifier: &'a str) -> Option<&'a str> {
        if self.articles.contains_key(identifier) {
            Some(identifier)
        } else {
            self.external_index.get(identifier).map(String::as_str)
        }
    }

    fn project(&self, project_id: &str) -> Result<&Vec<String>> {
        self.projects
            .get(project_id)
            .ok_or_else(|| SourceError::ProjectNotFound(project_id.to_string()).into())
    }
}

/// Thread-safe in-memory library of articles, projects and citation links.
pub struct MemoryLibrary {
    state: RwLock<LibraryState>,
}

impl MemoryLibrary {
    /// Create an empty library.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LibraryState::default()),
        }
    }

    /// Build a library from a snapshot.
    pub fn from_snapshot(snapshot: LibrarySnapshot) -> Self {
        let library = Self::new();
        for article in snapshot.articles {
            library.add_article(article);
        }
        for project in snapshot.projects {
            let ids: Vec<&str> = project.article_ids.iter().map(String::as_str).collect();
            library.add_project(&project.id, &ids);
        }
        for link in snapshot.citations {
            library.add_citation(link);
        }
        library
    }

    /// Load a library from a JSON snapshot file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let snapshot: LibrarySnapshot = serde_json::from_str(&content)
            .map_err(|e| SourceError::Snapshot(format!("{}: {}", path.as_ref().display(), e)))?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Insert or replace an article.
    pub fn add_article(&self, article: StoredArticle) {
        let mut state = self.state.write();
        if let Some(external_id) = &article.external_id {
            state
                .external_index
                .insert(external_id.clone(), article.id.clone());
        }
        state.articles.insert(article.id.clone(), article);
    }

    /// Define (or redefine) the articles of a project.
    pub fn add_project(&self, project_id: &str, article_ids: &[&str]) {
        let mut state = self.state.write();
        state.projects.insert(
            project_id.to_string(),
            article_ids.iter().map(|s| s.to_string()).collect(),
        );
    }

    pub fn add_citation(&self, link: CitationLink) {
        self.state.write().citations.push(link);
    }

    pub fn article_count(&self) -> usize {
        self.state.read().articles.len()
    }
}

impl Default for MemoryLibrary {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleSource for MemoryLibrary {
    async fn project_article_ids(&self, project_id: &str) -> Result<Vec<String>> {
        let state = self.state.read();
        Ok(state.project(project_id)?.clone())
    }

    async fn citation_neighbor_ids(&self, project_id: &str) -> Result<Vec<String>> {
        let state = self.state.read();
        let members: HashSet<&str> = state.project(project_id)?.iter().map(String::as_str).collect();

        let mut seen = HashSet::new();
        let mut neighbors = Vec::new();
        for link in &state.citations {
            let citing = state.resolve(&link.citing);
            let cited = state.resolve(&link.cited);
            let neighbor = match (citing, cited) {
                (Some(from), Some(to)) if members.contains(from) && !members.contains(to) => to,
                (Some(from), Some(to)) if members.contains(to) && !members.contains(from) => from,
                _ => continue,
            };
            if seen.insert(neighbor) {
                neighbors.push(neighbor.to_string());
            }
        }

        Ok(neighbors)
    }

    async fn fetch_articles(&self, project_id: &str, ids: &[String]) -> Result<Vec<StoredArticle>> {
        let state = self.state.read();
        let members = state.project(project_id)?;

        let embedded = members
            .iter()
            .filter_map(|id| state.articles.get(id))
            .any(|article| article.embedding.is_some());
        if !members.is_empty() && !embedded {
            return Err(SourceError::EmbeddingsUnavailable(project_id.to_string()).into());
        }

        Ok(ids
            .iter()
            .filter_map(|id| state.articles.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl CitationSource for MemoryLibrary {
    async fn citation_sets(&self, ids: &[String]) -> Result<HashMap<String, CitationSet>> {
        let state = self.state.read();
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();

        let mut sets: HashMap<String, CitationSet> = HashMap::new();
        for link in &state.citations {
            if let Some(from) = state.resolve(&link.citing) {
                if wanted.contains(from) {
                    sets.entry(from.to_string())
                        .or_default()
                        .references
                        .insert(link.cited.clone());
                }
            }
            if let Some(to) = state.resolve(&link.cited) {
                if wanted.contains(to) {
                    sets.entry(to.to_string())
                        .or_default()
                        .cited_by
                        .insert(link.citing.clone());
                }
            }
        }

        Ok(sets)
    }
}
