use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use kindred::config::Config;
use kindred::eval::{self, EvalReport, SplitParams};
use kindred::io::{ratings, records};
use kindred::output::terminal;
use kindred::pipeline::{self, PipelineParams};
use kindred::types::RecommendationList;

/// Kindred: user-based collaborative filtering over sparse rating data.
///
/// Computes per-user recommendations from a (user, item, rating) table in
/// four batch stages: co-rated pair generation, Pearson similarity scoring,
/// top-K neighbor selection, and similarity-weighted aggregation.
#[derive(Parser)]
#[command(name = "kindred", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the four-stage recommendation pipeline
    Run {
        /// Ratings CSV (userId,movieId,rating[,timestamp])
        input: PathBuf,

        /// Output root; stages write to step1/, step2/, step3/, final/
        output: PathBuf,

        /// Neighbors kept per user (overrides KINDRED_NEIGHBORS, default 10)
        #[arg(long)]
        neighbors: Option<usize>,

        /// Recommendations kept per user (overrides KINDRED_TOP, default 5)
        #[arg(long)]
        top: Option<usize>,
    },

    /// Score recommendation quality against a held-out split
    Evaluate {
        /// Ratings CSV to split and evaluate on
        input: PathBuf,

        /// Use a precomputed final/part-r-00000 instead of rerunning the
        /// pipeline on the train slice (pair with --seed to reproduce the
        /// split the recommendations were built from)
        #[arg(long)]
        recommendations: Option<PathBuf>,

        /// Fraction of each user's ratings held out for testing
        #[arg(long, default_value = "0.2")]
        test_ratio: f64,

        /// Minimum rating that counts as "liked" in the test slice
        #[arg(long, default_value = "4.0")]
        liked_threshold: f64,

        /// RNG seed for a reproducible split (overrides KINDRED_SEED)
        #[arg(long)]
        seed: Option<u64>,

        /// Also write the train slice as a ratings CSV to this path
        #[arg(long)]
        train_out: Option<PathBuf>,

        /// Write the metrics as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Neighbors kept per user (overrides KINDRED_NEIGHBORS, default 10)
        #[arg(long)]
        neighbors: Option<usize>,

        /// Recommendations kept per user (overrides KINDRED_TOP, default 5)
        #[arg(long)]
        top: Option<usize>,
    },

    /// Write a uniform random sample of a ratings file
    Sample {
        /// Ratings CSV to sample from
        input: PathBuf,

        /// Where to write the sampled CSV
        output: PathBuf,

        /// Number of data rows to keep
        #[arg(long)]
        rows: usize,

        /// RNG seed for a reproducible sample (overrides KINDRED_SEED)
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kindred=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Run {
            input,
            output,
            neighbors,
            top,
        } => {
            let params = PipelineParams {
                neighbor_limit: neighbors.unwrap_or(config.neighbor_limit),
                recommendation_limit: top.unwrap_or(config.recommendation_limit),
            };

            println!(
                "Running collaborative filtering pipeline (K={}, M={})...",
                params.neighbor_limit, params.recommendation_limit
            );

            let summary = pipeline::run(&input, &output, &params)?;
            terminal::display_run_summary(&summary);
            println!("\n{}", "Collaborative filtering completed.".bold());
        }

        Commands::Evaluate {
            input,
            recommendations,
            test_ratio,
            liked_threshold,
            seed,
            train_out,
            report,
            neighbors,
            top,
        } => {
            let all_ratings = ratings::load_ratings(&input)?;
            if all_ratings.is_empty() {
                anyhow::bail!("no parseable ratings in {}", input.display());
            }

            let split = SplitParams {
                test_ratio,
                seed: seed.or(config.seed),
                ..SplitParams::default()
            };
            let (train, test) = eval::split_ratings(&all_ratings, &split);

            if let Some(path) = train_out {
                ratings::write_ratings(&path, &train)?;
                println!("Train slice written to: {}", path.display());
            }

            let recs: Vec<RecommendationList> = match recommendations {
                Some(path) => {
                    let text = fs::read_to_string(&path).with_context(|| {
                        format!("failed to read recommendations file {}", path.display())
                    })?;
                    let decoded: Vec<RecommendationList> = text
                        .lines()
                        .filter_map(records::decode_recommendation_list)
                        .collect();
                    info!(
                        lists = decoded.len(),
                        path = %path.display(),
                        "loaded precomputed recommendations"
                    );
                    decoded
                }
                None => {
                    let params = PipelineParams {
                        neighbor_limit: neighbors.unwrap_or(config.neighbor_limit),
                        recommendation_limit: top.unwrap_or(config.recommendation_limit),
                    };
                    println!(
                        "Building recommendations from the train slice (K={}, M={})...",
                        params.neighbor_limit, params.recommendation_limit
                    );
                    pipeline::recommend(&train, &params)
                }
            };

            let eval_report = EvalReport {
                generated_at: Utc::now(),
                liked_threshold,
                test_ratio,
                train_ratings: train.len(),
                test_ratings: test.len(),
                metrics: eval::score(&recs, &test, liked_threshold),
            };

            terminal::display_eval_report(&eval_report);

            if let Some(path) = report {
                fs::write(&path, serde_json::to_string_pretty(&eval_report)?)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!(
                    "\n{}",
                    format!("Evaluation report saved to: {}", path.display()).bold()
                );
            }
        }

        Commands::Sample {
            input,
            output,
            rows,
            seed,
        } => {
            let written =
                ratings::sample_ratings(&input, &output, rows, seed.or(config.seed))?;
            println!(
                "{}",
                format!("Wrote {written} sampled rows to {}", output.display()).bold()
            );
        }
    }

    Ok(())
}
