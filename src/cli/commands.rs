//! CLI command handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use litscope::{
    build_gap_analysis_cache_key, Config, MemoryLibrary, SemanticCoordinator,
    SemanticCoordinatorBuilder,
};

use super::output;

/// Parameters of a gap analysis request, after config defaults are applied.
#[derive(Debug, Clone)]
pub struct GapRequest {
    pub threshold: f64,
    pub limit: usize,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

fn build_coordinator(config: Config, library_path: &Path) -> Result<SemanticCoordinator> {
    let library = MemoryLibrary::from_file(library_path)
        .with_context(|| format!("failed to load library {}", library_path.display()))?;

    Ok(SemanticCoordinatorBuilder::new()
        .config(config)
        .library(Arc::new(library))
        .build()?)
}

/// Run the prepare command.
pub async fn run_prepare(
    config: Config,
    library_path: &Path,
    project_id: &str,
    json_output: bool,
) -> Result<()> {
    let coordinator = build_coordinator(config, library_path)?;
    let report = coordinator.run_auto_semantic_preparation(project_id).await;
    let clusters = coordinator.list_clusters(project_id).await?;
    output::print_preparation(&report, &clusters, json_output)
}

/// Run the gaps command.
pub async fn run_gaps(
    config: Config,
    library_path: &Path,
    project_id: &str,
    request: GapRequest,
    json_output: bool,
) -> Result<()> {
    let coordinator = build_coordinator(config, library_path)?;
    let result = coordinator
        .warm_gap_analysis_cache(
            project_id,
            request.threshold,
            request.limit,
            request.year_from,
            request.year_to,
        )
        .await?;
    output::print_gaps(&result, json_output)
}

/// Run the cache-key command.
pub fn run_cache_key(project_id: &str, request: &GapRequest) {
    println!(
        "{}",
        build_gap_analysis_cache_key(
            project_id,
            request.threshold,
            request.limit,
            request.year_from,
            request.year_to,
        )
    );
}
