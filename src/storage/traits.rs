//! Persistence contract for cluster results.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cluster row to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClusterRow {
    pub project_id: String,
    pub name_local: String,
    pub name_en: String,
    pub color: String,
    pub keywords: Vec<String>,
    pub central_article_id: Option<String>,
    pub avg_internal_similarity: f64,
}

/// Membership of an article in a stored cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMemberRow {
    pub cluster_id: String,
    pub article_id: String,
    pub similarity_to_center: f64,
}

/// A persisted cluster with its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCluster {
    pub id: String,
    pub project_id: String,
    pub name_local: String,
    pub name_en: String,
    pub color: String,
    pub keywords: Vec<String>,
    pub central_article_id: Option<String>,
    pub avg_internal_similarity: f64,
    pub members: Vec<ClusterMemberRow>,
    pub created_at: DateTime<Utc>,
}

/// Sink for computed clusters.
#[async_trait]
pub trait ClusterStore: Send + Sync {
    /// Delete every cluster of a project, returning how many were removed.
    async fn delete_project_clusters(&self, project_id: &str) -> crate::error::Result<usize>;

    /// Insert a cluster and return its id.
    async fn insert_cluster(&self, row: NewClusterRow) -> crate::error::Result<String>;

    /// Insert or replace a member, keyed by `(cluster_id, article_id)`.
    async fn upsert_member(&self, row: ClusterMemberRow) -> crate::error::Result<()>;

    /// Clusters of a project in insertion order.
    async fn list_clusters(&self, project_id: &str) -> crate::error::Result<Vec<StoredCluster>>;
}
