// Stage 3: top-K neighbor selection.
//
// Similarity records group by source user; the reducer keeps the K highest
// scored candidates. The sort is stable, so equal scores keep their
// encounter order — that order is part of the output contract (it is the
// rank) and must survive serialization.

use std::cmp::Ordering;

use crate::engine::GroupStage;
use crate::types::{Neighbor, NeighborList, UserSimilarity};

pub struct NeighborSelector {
    /// How many neighbors to retain per user (K).
    pub limit: usize,
}

impl GroupStage for NeighborSelector {
    type Input = UserSimilarity;
    type Key = String;
    type Value = Neighbor;
    type Output = NeighborList;

    fn extract(&self, sim: &UserSimilarity) -> Vec<(String, Neighbor)> {
        vec![(
            sim.user.clone(),
            Neighbor {
                id: sim.neighbor.clone(),
                score: sim.score,
            },
        )]
    }

    fn reduce(&self, user: &String, mut candidates: Vec<Neighbor>) -> Vec<NeighborList> {
        if candidates.is_empty() {
            return Vec::new();
        }

        // Scores are finite by construction (stage 2 drops non-finite
        // values); the Equal fallback keeps the sort total and stable.
        candidates.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
        });
        candidates.truncate(self.limit);

        vec![NeighborList {
            user: user.clone(),
            neighbors: candidates,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_stage;

    fn sim(user: &str, neighbor: &str, score: f64) -> UserSimilarity {
        UserSimilarity {
            user: user.to_string(),
            neighbor: neighbor.to_string(),
            score,
        }
    }

    #[test]
    fn sorts_descending_and_respects_the_bound() {
        let sims: Vec<UserSimilarity> = (0..15)
            .map(|i| sim("u1", &format!("n{i:02}"), f64::from(i) / 15.0))
            .collect();
        let out = run_stage(&NeighborSelector { limit: 10 }, &sims);
        assert_eq!(out.len(), 1);
        let list = &out[0];
        assert_eq!(list.neighbors.len(), 10);
        assert_eq!(list.neighbors[0].id, "n14");
        for w in list.neighbors.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
    }

    #[test]
    fn ties_keep_encounter_order() {
        let sims = vec![
            sim("u1", "b", 0.5),
            sim("u1", "a", 0.5),
            sim("u1", "c", 0.9),
        ];
        let out = run_stage(&NeighborSelector { limit: 10 }, &sims);
        let ids: Vec<&str> = out[0].neighbors.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn no_candidates_means_no_output() {
        let out = run_stage(&NeighborSelector { limit: 10 }, &[]);
        assert!(out.is_empty());
    }

    #[test]
    fn negative_scores_are_retained_here() {
        // Stage 3 ranks by score only; filtering out non-positive
        // similarities is stage 4's job.
        let sims = vec![sim("u1", "a", -0.8), sim("u1", "b", -0.2)];
        let out = run_stage(&NeighborSelector { limit: 10 }, &sims);
        let ids: Vec<&str> = out[0].neighbors.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
