// Stage 1: co-rated pair generation.
//
// Ratings group by item; within each item group every unordered
// 2-combination of raters becomes one pair record carrying both ratings.
// The canonical key orientation (smaller user id first) is what makes the
// two emission orders of the same pair collide downstream.
//
// O(n²) per item group, where n is the number of raters of that item.
// Acceptable because real rating matrices are sparse per item. Duplicate
// (user, item) ratings are not deduplicated before pairing — repeated
// ratings inflate co-rated counts. Known limitation, kept as-is.

use crate::engine::GroupStage;
use crate::types::{PairKey, Rating};

pub struct PairGenerator;

impl GroupStage for PairGenerator {
    type Input = Rating;
    type Key = String;
    type Value = (String, f64);
    type Output = (PairKey, (f64, f64));

    fn extract(&self, rating: &Rating) -> Vec<(String, (String, f64))> {
        vec![(rating.item.clone(), (rating.user.clone(), rating.value))]
    }

    fn reduce(
        &self,
        _item: &String,
        raters: Vec<(String, f64)>,
    ) -> Vec<(PairKey, (f64, f64))> {
        let n = raters.len();
        let mut pairs = Vec::with_capacity(n.saturating_sub(1) * n / 2);

        for i in 0..n {
            for j in i + 1..n {
                let (user_a, rating_a) = &raters[i];
                let (user_b, rating_b) = &raters[j];

                // Canonical orientation: smaller user id first, ratings
                // travel with their users.
                if user_a < user_b {
                    pairs.push((
                        PairKey {
                            first: user_a.clone(),
                            second: user_b.clone(),
                        },
                        (*rating_a, *rating_b),
                    ));
                } else {
                    pairs.push((
                        PairKey {
                            first: user_b.clone(),
                            second: user_a.clone(),
                        },
                        (*rating_b, *rating_a),
                    ));
                }
            }
        }

        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_stage;

    fn pair(a: &str, b: &str) -> PairKey {
        PairKey {
            first: a.to_string(),
            second: b.to_string(),
        }
    }

    #[test]
    fn emits_all_two_combinations_per_item() {
        let ratings = vec![
            Rating::new("u1", "m1", 5.0),
            Rating::new("u2", "m1", 4.0),
            Rating::new("u3", "m1", 1.0),
        ];
        let out = run_stage(&PairGenerator, &ratings);
        // C(3,2) = 3 distinct canonical pairs, each exactly once
        assert_eq!(
            out,
            vec![
                (pair("u1", "u2"), (5.0, 4.0)),
                (pair("u1", "u3"), (5.0, 1.0)),
                (pair("u2", "u3"), (4.0, 1.0)),
            ]
        );
    }

    #[test]
    fn both_emission_orders_collapse_to_one_canonical_key() {
        // u2 appears before u1 in the input; the key must still be (u1, u2)
        // with the ratings swapped to match.
        let ratings = vec![
            Rating::new("u2", "m1", 4.0),
            Rating::new("u1", "m1", 5.0),
        ];
        let out = run_stage(&PairGenerator, &ratings);
        assert_eq!(out, vec![(pair("u1", "u2"), (5.0, 4.0))]);
    }

    #[test]
    fn one_pair_per_shared_item() {
        let ratings = vec![
            Rating::new("u1", "m1", 5.0),
            Rating::new("u2", "m1", 4.0),
            Rating::new("u1", "m2", 3.0),
            Rating::new("u2", "m2", 3.0),
        ];
        let out = run_stage(&PairGenerator, &ratings);
        assert_eq!(
            out,
            vec![
                (pair("u1", "u2"), (5.0, 4.0)),
                (pair("u1", "u2"), (3.0, 3.0)),
            ]
        );
    }

    #[test]
    fn single_rater_item_emits_nothing() {
        let ratings = vec![Rating::new("u1", "m1", 5.0)];
        assert!(run_stage(&PairGenerator, &ratings).is_empty());
    }

    #[test]
    fn duplicate_ratings_are_not_deduplicated() {
        // The same user rating the same item twice produces a self-pair.
        // Documented limitation carried over from the reference behavior.
        let ratings = vec![
            Rating::new("u1", "m1", 5.0),
            Rating::new("u1", "m1", 3.0),
        ];
        let out = run_stage(&PairGenerator, &ratings);
        assert_eq!(out, vec![(pair("u1", "u1"), (3.0, 5.0))]);
    }
}
