// Pipeline driver: chain the four stages in strict sequence.
//
// Each stage's full output becomes the next stage's input; stage-3 output
// is additionally materialized into the broadcast neighbor table before
// stage 4 touches its first rating record. Any stage or write failure
// aborts the whole run — there is no partial-result recovery.
//
// `run` persists every stage under `<output>/step1..step3` and `/final`
// (one `part-r-00000` per stage, matching the layout downstream tooling
// expects) plus a JSON run summary at the output root. `recommend` is the
// same chain without the filesystem, for evaluation and tests.

use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use crate::engine::run_stage;
use crate::io::{ratings, records};
use crate::stages::{NeighborSelector, PairGenerator, RecommendationAggregator, SimilarityScorer};
use crate::types::{neighbor_table, Rating, RecommendationList};

/// Tuning knobs for one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineParams {
    /// Neighbors retained per user (K).
    pub neighbor_limit: usize,
    /// Recommendations retained per user (M).
    pub recommendation_limit: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            neighbor_limit: 10,
            recommendation_limit: 5,
        }
    }
}

/// Record counts per stage output, for the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct StageCounts {
    pub ratings: usize,
    pub co_rated_pairs: usize,
    pub similarities: usize,
    pub neighbor_lists: usize,
    pub recommendation_lists: usize,
}

/// What one `run` invocation did, serialized to `<output>/summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub input: PathBuf,
    pub output: PathBuf,
    pub neighbor_limit: usize,
    pub recommendation_limit: usize,
    pub counts: StageCounts,
    pub elapsed_ms: u64,
}

/// Run the full chain in memory and return the final recommendations.
pub fn recommend(ratings: &[Rating], params: &PipelineParams) -> Vec<RecommendationList> {
    let pairs = run_stage(&PairGenerator, ratings);
    let similarities = run_stage(&SimilarityScorer, &pairs);
    let neighbor_lists = run_stage(
        &NeighborSelector {
            limit: params.neighbor_limit,
        },
        &similarities,
    );

    // Hard barrier: the full neighbor table exists before stage 4 starts.
    let table = neighbor_table(&neighbor_lists);
    run_stage(
        &RecommendationAggregator {
            table: &table,
            limit: params.recommendation_limit,
        },
        ratings,
    )
}

/// Run the pipeline end to end, persisting every stage output.
pub fn run(input: &Path, output: &Path, params: &PipelineParams) -> Result<RunSummary> {
    let started = Instant::now();

    let ratings = ratings::load_ratings(input)?;
    if ratings.is_empty() {
        anyhow::bail!(
            "no parseable ratings in {} — expected comma-delimited userId,movieId,rating lines",
            input.display()
        );
    }

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Stages [{bar:30}] {pos}/{len} {msg}")
            .unwrap(),
    );

    pb.set_message("pairing");
    let pairs = run_stage(&PairGenerator, &ratings);
    info!(pairs = pairs.len(), "stage 1: co-rated pairs generated");
    write_records(
        &output.join("step1"),
        pairs.iter().map(|(key, r)| records::encode_pair(key, *r)),
    )?;
    pb.inc(1);

    pb.set_message("scoring");
    let similarities = run_stage(&SimilarityScorer, &pairs);
    info!(
        similarities = similarities.len(),
        "stage 2: similarities scored"
    );
    write_records(
        &output.join("step2"),
        similarities.iter().map(records::encode_similarity),
    )?;
    pb.inc(1);

    pb.set_message("selecting neighbors");
    let neighbor_lists = run_stage(
        &NeighborSelector {
            limit: params.neighbor_limit,
        },
        &similarities,
    );
    info!(
        users = neighbor_lists.len(),
        limit = params.neighbor_limit,
        "stage 3: neighbors selected"
    );
    write_records(
        &output.join("step3"),
        neighbor_lists.iter().map(records::encode_neighbor_list),
    )?;
    pb.inc(1);

    pb.set_message("aggregating");
    let table = neighbor_table(&neighbor_lists);
    let recommendations = run_stage(
        &RecommendationAggregator {
            table: &table,
            limit: params.recommendation_limit,
        },
        &ratings,
    );
    info!(
        users = recommendations.len(),
        limit = params.recommendation_limit,
        "stage 4: recommendations aggregated"
    );
    write_records(
        &output.join("final"),
        recommendations
            .iter()
            .map(records::encode_recommendation_list),
    )?;
    pb.inc(1);
    pb.finish_and_clear();

    let summary = RunSummary {
        generated_at: Utc::now(),
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        neighbor_limit: params.neighbor_limit,
        recommendation_limit: params.recommendation_limit,
        counts: StageCounts {
            ratings: ratings.len(),
            co_rated_pairs: pairs.len(),
            similarities: similarities.len(),
            neighbor_lists: neighbor_lists.len(),
            recommendation_lists: recommendations.len(),
        },
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    let summary_path = output.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;

    Ok(summary)
}

/// Write one stage's records under `dir/part-r-00000`, one per line.
fn write_records(dir: &Path, lines: impl Iterator<Item = String>) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join("part-r-00000");
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(path)
}
