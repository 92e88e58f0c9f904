//! Output formatting for CLI commands.
//!
//! This module handles formatting output as either JSON or human-readable text.

use anyhow::Result;
use litscope::{GapAnalysisResult, PreparationReport, StoredCluster, TaskOutcome};
use serde::Serialize;

#[derive(Serialize)]
struct PreparationOutput<'a> {
    report: &'a PreparationReport,
    clusters: &'a [StoredCluster],
}

fn describe<T: std::fmt::Display>(outcome: &TaskOutcome<T>) -> String {
    match outcome {
        TaskOutcome::Success(value) => value.to_string(),
        TaskOutcome::Failure(reason) => format!("failed ({})", reason),
    }
}

/// Print a preparation report with the clusters it stored.
pub fn print_preparation(
    report: &PreparationReport,
    clusters: &[StoredCluster],
    json: bool,
) -> Result<()> {
    if json {
        let output = PreparationOutput { report, clusters };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Semantic Preparation: {}", report.project_id);
    println!("{}", "=".repeat(60));
    println!(
        "Clusters: {}  |  Gaps warmed: {}",
        describe(&report.clusters),
        describe(&report.gaps)
    );
    println!();

    if clusters.is_empty() {
        println!("No clusters stored.");
        return Ok(());
    }

    for cluster in clusters {
        println!(
            "{} [{}] ({} articles)",
            cluster.name_en,
            cluster.color,
            cluster.members.len()
        );
        println!("  Label: {}", cluster.name_local);
        if let Some(central) = &cluster.central_article_id {
            println!("  Central: {}", central);
        }
        println!("  Coherence: {:.3}", cluster.avg_internal_similarity);
        println!();
    }
    Ok(())
}

/// Print a gap analysis.
pub fn print_gaps(result: &GapAnalysisResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!(
        "Found {} gaps (threshold {:.2})\n",
        result.total_gaps, result.threshold
    );
    for (i, gap) in result.gaps.iter().enumerate() {
        let year = |y: Option<i32>| y.map_or_else(|| "n.d.".to_string(), |y| y.to_string());
        println!("{}. [{}%] {}", i + 1, gap.similarity_percent, gap.reason);
        println!("   {} ({})", gap.article1.title, year(gap.article1.year));
        println!("   {} ({})\n", gap.article2.title, year(gap.article2.year));
    }

    if result.gaps.is_empty() {
        println!("No citation gaps found.");
    }
    Ok(())
}
