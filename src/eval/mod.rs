// Offline evaluation of recommendation quality.
//
// Splits each user's ratings into train and test slices, runs (or loads)
// recommendations built from the train slice, and scores them against the
// test items the user actually liked. "Liked" means rated at or above a
// threshold (default 4.0 on the 5-point scale).
//
// Only users with enough ratings are split at all; everyone else stays
// entirely in the train slice so the pipeline keeps their signal.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use crate::types::{Rating, RecommendationList};

/// Split configuration.
#[derive(Debug, Clone, Copy)]
pub struct SplitParams {
    /// Fraction of each split user's ratings held out for testing.
    pub test_ratio: f64,
    /// Users with fewer ratings than this are not split.
    pub min_ratings: usize,
    /// RNG seed; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            test_ratio: 0.2,
            min_ratings: 5,
            seed: None,
        }
    }
}

/// Quality metrics averaged over evaluated users.
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    /// Users with at least one liked item in the test slice.
    pub users_evaluated: usize,
    /// Of those, users the pipeline produced recommendations for.
    pub users_with_recommendations: usize,
    /// Of those, users with at least one recommended item they liked.
    pub users_with_hits: usize,
    /// Mean fraction of recommended items that were liked.
    pub precision: f64,
    /// Mean fraction of liked items that were recommended.
    pub recall: f64,
    /// users_with_hits / users_with_recommendations.
    pub hit_rate: f64,
    /// users_with_recommendations / users_evaluated.
    pub coverage: f64,
}

/// Full evaluation report, serializable to JSON with `--report`.
#[derive(Debug, Clone, Serialize)]
pub struct EvalReport {
    pub generated_at: DateTime<Utc>,
    pub liked_threshold: f64,
    pub test_ratio: f64,
    pub train_ratings: usize,
    pub test_ratings: usize,
    pub metrics: Metrics,
}

/// Split ratings into (train, test) per user.
///
/// Users are processed in first-seen order so that a fixed seed reproduces
/// the exact same split on the same input.
pub fn split_ratings(ratings: &[Rating], params: &SplitParams) -> (Vec<Rating>, Vec<Rating>) {
    let mut user_order: Vec<&str> = Vec::new();
    let mut by_user: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, r) in ratings.iter().enumerate() {
        by_user
            .entry(r.user.as_str())
            .or_insert_with(|| {
                user_order.push(r.user.as_str());
                Vec::new()
            })
            .push(idx);
    }

    let mut rng = match params.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };

    let mut train = Vec::new();
    let mut test = Vec::new();

    for user in user_order {
        let indices = &by_user[user];
        if indices.len() < params.min_ratings {
            train.extend(indices.iter().map(|&i| ratings[i].clone()));
            continue;
        }

        let mut shuffled = indices.clone();
        shuffled.shuffle(&mut rng);

        let held_out = (((indices.len() as f64) * params.test_ratio).ceil() as usize)
            .clamp(1, indices.len() - 1);

        for &i in &shuffled[..held_out] {
            test.push(ratings[i].clone());
        }
        for &i in &shuffled[held_out..] {
            train.push(ratings[i].clone());
        }
    }

    info!(
        train = train.len(),
        test = test.len(),
        "split ratings for evaluation"
    );
    (train, test)
}

/// Score recommendations against the held-out test ratings.
pub fn score(
    recommendations: &[RecommendationList],
    test: &[Rating],
    liked_threshold: f64,
) -> Metrics {
    // Liked items per user in the test slice
    let mut liked: HashMap<&str, HashSet<&str>> = HashMap::new();
    for r in test {
        if r.value >= liked_threshold {
            liked.entry(r.user.as_str()).or_default().insert(r.item.as_str());
        }
    }

    let rec_map: HashMap<&str, &RecommendationList> = recommendations
        .iter()
        .map(|l| (l.user.as_str(), l))
        .collect();

    let users_evaluated = liked.len();
    let mut users_with_recommendations = 0usize;
    let mut users_with_hits = 0usize;
    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;

    for (user, liked_items) in &liked {
        let Some(list) = rec_map.get(user) else {
            continue;
        };
        if list.items.is_empty() {
            continue;
        }
        users_with_recommendations += 1;

        let hits = list
            .items
            .iter()
            .filter(|r| liked_items.contains(r.item.as_str()))
            .count();
        if hits > 0 {
            users_with_hits += 1;
        }
        precision_sum += hits as f64 / list.items.len() as f64;
        recall_sum += hits as f64 / liked_items.len() as f64;
    }

    let mean = |sum: f64, n: usize| if n > 0 { sum / n as f64 } else { 0.0 };
    Metrics {
        users_evaluated,
        users_with_recommendations,
        users_with_hits,
        precision: mean(precision_sum, users_with_recommendations),
        recall: mean(recall_sum, users_with_recommendations),
        hit_rate: mean(users_with_hits as f64, users_with_recommendations),
        coverage: mean(users_with_recommendations as f64, users_evaluated),
    }
}
