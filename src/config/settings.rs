//! Configuration settings for litscope.

use crate::analysis::DEFAULT_MAX_KEYWORDS;
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub clustering: ClusteringConfig,
    pub gaps: GapConfig,
    pub cache: CacheConfig,
    pub library: LibraryConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("litscope.toml"),
            dirs::config_dir()
                .map(|p| p.join("litscope/config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".litscope/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.is_file() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let clustering = &self.clustering;
        if clustering.num_clusters == 0 {
            return Err(ConfigError::Invalid("clustering.num_clusters must be > 0".to_string()).into());
        }
        if clustering.min_cluster_size == 0 {
            return Err(
                ConfigError::Invalid("clustering.min_cluster_size must be > 0".to_string()).into(),
            );
        }
        if clustering.max_iterations == 0 {
            return Err(
                ConfigError::Invalid("clustering.max_iterations must be > 0".to_string()).into(),
            );
        }
        if !(-1.0..=1.0).contains(&clustering.similarity_threshold) {
            return Err(ConfigError::Invalid(
                "clustering.similarity_threshold must be within [-1, 1]".to_string(),
            )
            .into());
        }
        if !(1..=DEFAULT_MAX_KEYWORDS).contains(&clustering.max_keywords) {
            return Err(ConfigError::Invalid(format!(
                "clustering.max_keywords must be within 1..={}",
                DEFAULT_MAX_KEYWORDS
            ))
            .into());
        }
        if clustering.palette.is_empty() {
            return Err(ConfigError::MissingField("clustering.palette".to_string()).into());
        }

        if !(-1.0..=1.0).contains(&self.gaps.threshold) {
            return Err(
                ConfigError::Invalid("gaps.threshold must be within [-1, 1]".to_string()).into(),
            );
        }
        if self.gaps.limit == 0 {
            return Err(ConfigError::Invalid("gaps.limit must be > 0".to_string()).into());
        }

        Ok(())
    }

    /// Expand the library snapshot path.
    pub fn snapshot_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.library.snapshot_path);
        PathBuf::from(expanded.as_ref())
    }
}

/// Semantic clustering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Requested number of clusters before corpus-size reduction
    pub num_clusters: usize,
    /// Clusters with fewer members are discarded
    pub min_cluster_size: usize,
    /// Minimum similarity to a centroid for an article to join it
    pub similarity_threshold: f64,
    /// Upper bound on assignment/update rounds
    pub max_iterations: usize,
    /// Maximum keywords per cluster
    pub max_keywords: usize,
    /// Fixed seed for reproducible runs (entropy when unset)
    pub seed: Option<u64>,
    /// Colours assigned to clusters in order, cycling
    pub palette: Vec<String>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            num_clusters: 5,
            min_cluster_size: 3,
            similarity_threshold: 0.6,
            max_iterations: 50,
            max_keywords: 5,
            seed: None,
            palette: default_palette(),
        }
    }
}

/// Colours used for cluster rendering.
pub fn default_palette() -> Vec<String> {
    [
        "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
        "#f97316", "#6366f1",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

/// Citation gap analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Default similarity threshold for cache warmup
    pub threshold: f64,
    /// Default maximum number of gaps
    pub limit: usize,
    /// TTL of a computed gap analysis
    pub cache_ttl_secs: u64,
    /// TTL of the empty result cached while embeddings are not ready
    pub not_ready_ttl_secs: u64,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            limit: 50,
            cache_ttl_secs: 86_400,
            not_ready_ttl_secs: 300,
        }
    }
}

/// In-process cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached entries
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_entries: 10_000 }
    }
}

/// Article library configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// JSON snapshot with articles, embeddings and citation links
    pub snapshot_path: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            snapshot_path: "~/.local/share/litscope/library.json".to_string(),
        }
    }
}
