// Terminal rendering for the run summary and evaluation metrics.

use colored::Colorize;

use crate::eval::EvalReport;
use crate::pipeline::RunSummary;

/// Print the per-stage record counts after a pipeline run.
pub fn display_run_summary(summary: &RunSummary) {
    println!("\n{}", "=== Pipeline Summary ===".bold());
    println!("  {:<26} {:>10}", "Ratings read", summary.counts.ratings);
    println!(
        "  {:<26} {:>10}",
        "Co-rated pairs", summary.counts.co_rated_pairs
    );
    println!(
        "  {:<26} {:>10}",
        "Similarities", summary.counts.similarities
    );
    println!(
        "  {:<26} {:>10}",
        format!("Neighbor lists (K={})", summary.neighbor_limit),
        summary.counts.neighbor_lists
    );
    println!(
        "  {:<26} {:>10}",
        format!("Recommendations (M={})", summary.recommendation_limit),
        summary.counts.recommendation_lists
    );
    println!("  {:<26} {:>10}", "Elapsed (ms)", summary.elapsed_ms);
    println!(
        "\nStage outputs written under: {}",
        summary.output.display().to_string().bold()
    );
}

/// Print evaluation metrics with a one-line verdict.
pub fn display_eval_report(report: &EvalReport) {
    let m = &report.metrics;

    println!("\n{}", "=== Evaluation ===".bold());
    println!(
        "  Held out {:.0}% per user, liked threshold {:.1}",
        report.test_ratio * 100.0,
        report.liked_threshold
    );
    println!(
        "  Train ratings: {}   Test ratings: {}",
        report.train_ratings, report.test_ratings
    );
    println!();
    println!("  {:<28} {:>8}", "Users evaluated", m.users_evaluated);
    println!(
        "  {:<28} {:>8}",
        "  with recommendations", m.users_with_recommendations
    );
    println!(
        "  {:<28} {:>8}",
        "  with at least one hit", m.users_with_hits
    );
    println!("  {:<28} {:>8.3}", "Precision", m.precision);
    println!("  {:<28} {:>8.3}", "Recall", m.recall);
    println!("  {:<28} {:>8.3}", "Hit rate", m.hit_rate);
    println!("  {:<28} {:>8.3}", "Coverage", m.coverage);

    if m.users_evaluated == 0 {
        println!(
            "\n  {}",
            "No users had liked items in the test slice — try a lower threshold.".yellow()
        );
    } else if m.hit_rate >= 0.5 {
        println!(
            "\n  {}",
            "Recommendations hit for a majority of covered users.".green()
        );
    } else if m.coverage < 0.5 {
        println!(
            "\n  {}",
            "Coverage is low — many evaluated users received no recommendations.".yellow()
        );
        println!(
            "  {}",
            "Sparse co-rating overlap after the split is the usual cause.".dimmed()
        );
    }
}
