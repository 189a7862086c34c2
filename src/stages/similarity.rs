// Stage 2: pairwise similarity scoring.
//
// Co-rated pair records group by their canonical pair key; the group holds
// one rating tuple per shared item. The reducer computes the Pearson
// correlation over the two aligned rating sequences and emits the score in
// both directions, turning the symmetric relation directly into
// "user -> neighbor candidate" records for stage 3.
//
// A pair needs at least 2 co-rated items to score; fewer produce no output.
// A zero-variance denominator is defined as correlation 0, and a non-finite
// result is dropped — neither ever propagates downstream.

use crate::engine::GroupStage;
use crate::types::{PairKey, UserSimilarity};

pub struct SimilarityScorer;

impl GroupStage for SimilarityScorer {
    type Input = (PairKey, (f64, f64));
    type Key = PairKey;
    type Value = (f64, f64);
    type Output = UserSimilarity;

    fn extract(&self, input: &(PairKey, (f64, f64))) -> Vec<(PairKey, (f64, f64))> {
        vec![(input.0.clone(), input.1)]
    }

    fn reduce(&self, key: &PairKey, values: Vec<(f64, f64)>) -> Vec<UserSimilarity> {
        if values.len() < 2 {
            return Vec::new();
        }

        let (xs, ys): (Vec<f64>, Vec<f64>) = values.into_iter().unzip();
        let score = pearson(&xs, &ys);
        if !score.is_finite() {
            return Vec::new();
        }

        // Both directions of the symmetric relation
        vec![
            UserSimilarity {
                user: key.first.clone(),
                neighbor: key.second.clone(),
                score,
            },
            UserSimilarity {
                user: key.second.clone(),
                neighbor: key.first.clone(),
                score,
            },
        ]
    }
}

/// Pearson correlation coefficient over two aligned sequences.
///
/// Returns 0 when the denominator (the product of the two variances) is
/// exactly zero, and NaN for empty or mismatched input — the caller drops
/// non-finite results.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len();
    if n == 0 || n != y.len() {
        return f64::NAN;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;

    for (&a, &b) in x.iter().zip(y) {
        sum_x += a;
        sum_y += b;
        sum_xy += a * b;
        sum_x2 += a * a;
        sum_y2 += b * b;
    }

    let n = n as f64;
    let numerator = n * sum_xy - sum_x * sum_y;
    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
