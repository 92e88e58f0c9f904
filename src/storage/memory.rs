//! In-memory cluster store.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::{ClusterMemberRow, ClusterStore, NewClusterRow, StoredCluster};
use crate::error::{Result, StorageError};

/// Thread-safe in-memory [`ClusterStore`].
pub struct MemoryClusterStore {
    clusters: RwLock<Vec<StoredCluster>>,
}

impl MemoryClusterStore {
    pub fn new() -> Self {
        Self {
            clusters: RwLock::new(Vec::new()),
        }
    }

    /// Number of clusters across all projects.
    pub fn len(&self) -> usize {
        self.clusters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.read().is_empty()
    }
}

impl Default for MemoryClusterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterStore for MemoryClusterStore {
    async fn delete_project_clusters(&self, project_id: &str) -> Result<usize> {
        let mut clusters = self.clusters.write();
        let before = clusters.len();
        clusters.retain(|c| c.project_id != project_id);
        Ok(before - clusters.len())
    }

    async fn insert_cluster(&self, row: NewClusterRow) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.clusters.write().push(StoredCluster {
            id: id.clone(),
            project_id: row.project_id,
            name_local: row.name_local,
            name_en: row.name_en,
            color: row.color,
            keywords: row.keywords,
            central_article_id: row.central_article_id,
            avg_internal_similarity: row.avg_internal_similarity,
            members: Vec::new(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn upsert_member(&self, row: ClusterMemberRow) -> Result<()> {
        let mut clusters = self.clusters.write();
        let cluster = clusters
            .iter_mut()
            .find(|c| c.id == row.cluster_id)
            .ok_or_else(|| StorageError::ClusterNotFound(row.cluster_id.clone()))?;

        match cluster
            .members
            .iter_mut()
            .find(|m| m.article_id == row.article_id)
        {
            Some(existing) => *existing = row,
            None => cluster.members.push(row),
        }
        Ok(())
    }

    async fn list_clusters(&self, project_id: &str) -> Result<Vec<StoredCluster>> {
        Ok(self
            .clusters
            .read()
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect())
    }
}
