// Stage 4: recommendation aggregation — a broadcast join followed by a
// group-aggregate.
//
// Step A (the extractor) joins every rating against the full neighbor
// table: a rating by user u is forwarded to each of u's neighbors, tagged
// with the neighbor's similarity to u. The table must be fully built from
// stage-3 output before the first rating is processed — a hard barrier, not
// a streaming join — and is shared read-only by all workers.
//
// Step B (the reducer) accumulates a similarity-weighted average per item.
// Only strictly positive similarities contribute to either the numerator or
// the denominator: negative or zero correlation is untrusted, not inverted.
// Accumulation is insertion-ordered so that equal predicted scores keep
// their first-seen order, which makes the final ranking deterministic.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::engine::GroupStage;
use crate::types::{NeighborTable, Rating, Recommendation, RecommendationList};

/// A rating forwarded to one neighbor, tagged with the similarity weight.
#[derive(Debug, Clone)]
pub struct WeightedRating {
    pub item: String,
    pub rating: f64,
    pub similarity: f64,
}

pub struct RecommendationAggregator<'a> {
    /// Broadcast lookup table: rater id -> that rater's neighbor list.
    pub table: &'a NeighborTable,
    /// How many recommendations to retain per user (M).
    pub limit: usize,
}

impl GroupStage for RecommendationAggregator<'_> {
    type Input = Rating;
    type Key = String;
    type Value = WeightedRating;
    type Output = RecommendationList;

    fn extract(&self, rating: &Rating) -> Vec<(String, WeightedRating)> {
        let Some(neighbors) = self.table.get(&rating.user) else {
            // A rater with no neighbor list contributes to nobody.
            return Vec::new();
        };

        neighbors
            .iter()
            .map(|n| {
                (
                    n.id.clone(),
                    WeightedRating {
                        item: rating.item.clone(),
                        rating: rating.value,
                        similarity: n.score,
                    },
                )
            })
            .collect()
    }

    fn reduce(&self, user: &String, values: Vec<WeightedRating>) -> Vec<RecommendationList> {
        // Per-group accumulators, discarded after this group emits.
        // (weighted sum, weight sum) per item, in first-seen order.
        let mut order: Vec<String> = Vec::new();
        let mut sums: HashMap<String, (f64, f64)> = HashMap::new();

        for v in values {
            if v.similarity > 0.0 {
                let entry = sums.entry(v.item.clone()).or_insert_with(|| {
                    order.push(v.item.clone());
                    (0.0, 0.0)
                });
                entry.0 += v.rating * v.similarity;
                entry.1 += v.similarity;
            }
        }

        let mut items: Vec<Recommendation> = order
            .into_iter()
            .filter_map(|item| {
                let (weighted, weight) = sums[&item];
                if weight > 0.0 {
                    Some(Recommendation {
                        item,
                        score: weighted / weight,
                    })
                } else {
                    None
                }
            })
            .collect();

        if items.is_empty() {
            return Vec::new();
        }

        items.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        items.truncate(self.limit);

        vec![RecommendationList {
            user: user.clone(),
            items,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_stage;
    use crate::types::{neighbor_table, Neighbor, NeighborList};

    fn lists(entries: &[(&str, &[(&str, f64)])]) -> Vec<NeighborList> {
        entries
            .iter()
            .map(|(user, neighbors)| NeighborList {
                user: user.to_string(),
                neighbors: neighbors
                    .iter()
                    .map(|(id, score)| Neighbor {
                        id: id.to_string(),
                        score: *score,
                    })
                    .collect(),
            })
            .collect()
    }

    #[test]
    fn weighted_average_over_positive_neighbors() {
        // u2 and u3 both rated m1; both count u1 as a neighbor.
        let table = neighbor_table(&lists(&[
            ("u2", &[("u1", 0.8)]),
            ("u3", &[("u1", 0.4)]),
        ]));
        let ratings = vec![Rating::new("u2", "m1", 5.0), Rating::new("u3", "m1", 2.0)];
        let out = run_stage(&RecommendationAggregator { table: &table, limit: 5 }, &ratings);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].user, "u1");
        // (5*0.8 + 2*0.4) / (0.8 + 0.4) = 4.8 / 1.2 = 4.0
        assert!((out[0].items[0].score - 4.0).abs() < 1e-12);
    }

    #[test]
    fn non_positive_similarity_never_contributes() {
        let table = neighbor_table(&lists(&[
            ("u2", &[("u1", -0.9)]),
            ("u3", &[("u1", 0.0)]),
        ]));
        let ratings = vec![Rating::new("u2", "m1", 5.0), Rating::new("u3", "m2", 5.0)];
        let out = run_stage(&RecommendationAggregator { table: &table, limit: 5 }, &ratings);
        // Only non-positive support: no output at all for u1.
        assert!(out.is_empty());
    }

    #[test]
    fn rater_without_neighbor_list_is_skipped() {
        let table = neighbor_table(&lists(&[("u2", &[("u1", 0.5)])]));
        let ratings = vec![
            Rating::new("u9", "m1", 5.0), // u9 has no neighbor list
            Rating::new("u2", "m2", 3.0),
        ];
        let out = run_stage(&RecommendationAggregator { table: &table, limit: 5 }, &ratings);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].items.len(), 1);
        assert_eq!(out[0].items[0].item, "m2");
    }

    #[test]
    fn respects_the_recommendation_bound() {
        let table = neighbor_table(&lists(&[("u2", &[("u1", 1.0)])]));
        let ratings: Vec<Rating> = (0..8)
            .map(|i| Rating::new("u2", &format!("m{i}"), f64::from(i)))
            .collect();
        let out = run_stage(&RecommendationAggregator { table: &table, limit: 5 }, &ratings);
        assert_eq!(out[0].items.len(), 5);
        assert_eq!(out[0].items[0].item, "m7");
    }

    #[test]
    fn equal_scores_keep_first_seen_order() {
        let table = neighbor_table(&lists(&[("u2", &[("u1", 1.0)])]));
        let ratings = vec![
            Rating::new("u2", "mB", 3.0),
            Rating::new("u2", "mA", 3.0),
        ];
        let out = run_stage(&RecommendationAggregator { table: &table, limit: 5 }, &ratings);
        let items: Vec<&str> = out[0].items.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(items, vec!["mB", "mA"]);
    }
}
