// Ratings input parsing and down-sampling.
//
// The reference encoding is comma-delimited text, one rating per line:
// `userId,movieId,rating[,timestamp...]`. Extra fields are ignored.
//
// Malformed records — a recognized header line, a blank line, fewer than
// three fields, a non-numeric rating — are dropped silently. This is a
// deliberate tolerance policy for dirty input, not an error path: nothing
// is counted as a defect or logged above debug level.

use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::types::Rating;

/// Parse one line into a rating, or `None` if the line is filtered.
pub fn parse_line(line: &str) -> Option<Rating> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("userId") {
        return None;
    }

    let mut fields = line.split(',');
    let user = fields.next()?.trim();
    let item = fields.next()?.trim();
    let value: f64 = fields.next()?.trim().parse().ok()?;

    Some(Rating {
        user: user.to_string(),
        item: item.to_string(),
        value,
    })
}

/// Parse a whole ratings document, silently dropping filtered lines.
pub fn parse_ratings(text: &str) -> Vec<Rating> {
    let mut ratings = Vec::new();
    let mut skipped = 0usize;
    for line in text.lines() {
        match parse_line(line) {
            Some(r) => ratings.push(r),
            None => skipped += 1,
        }
    }
    debug!(parsed = ratings.len(), skipped, "ratings parsed");
    ratings
}

/// Load ratings from a file.
pub fn load_ratings(path: &Path) -> Result<Vec<Rating>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read ratings file {}", path.display()))?;
    let ratings = parse_ratings(&text);
    info!(
        path = %path.display(),
        ratings = ratings.len(),
        "loaded ratings"
    );
    Ok(ratings)
}

/// Write ratings back out in the input encoding, header line included.
pub fn write_ratings(path: &Path, ratings: &[Rating]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "userId,movieId,rating")?;
    for r in ratings {
        writeln!(out, "{},{},{}", r.user, r.item, r.value)?;
    }
    out.flush()?;
    Ok(())
}

/// Write a uniform random sample of `rows` data lines from `input` to
/// `output`, preserving the header line and the original line order.
///
/// Returns the number of data rows written.
pub fn sample_ratings(
    input: &Path,
    output: &Path,
    rows: usize,
    seed: Option<u64>,
) -> Result<usize> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read ratings file {}", input.display()))?;
    let mut lines = text.lines();

    let header = lines
        .next()
        .context("ratings file is empty — nothing to sample")?;
    let data: Vec<&str> = lines.collect();

    if rows > data.len() {
        anyhow::bail!(
            "requested {} rows but {} only has {} data rows",
            rows,
            input.display(),
            data.len()
        );
    }

    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    let mut selected: Vec<usize> = rand::seq::index::sample(&mut rng, data.len(), rows).into_vec();
    selected.sort_unstable();

    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{header}")?;
    for idx in &selected {
        writeln!(out, "{}", data[*idx])?;
    }
    out.flush()?;

    info!(rows, total = data.len(), "wrote ratings sample");
    Ok(rows)
}
