// Core data types shared by the pipeline stages.
//
// Everything here is derived, stage-local data: each run recomputes all of
// it from the rating snapshot, nothing persists or mutates across runs.

use std::collections::HashMap;
use std::fmt;

/// A single observed rating fact. Immutable input to the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    pub user: String,
    pub item: String,
    pub value: f64,
}

impl Rating {
    pub fn new(user: &str, item: &str, value: f64) -> Self {
        Self {
            user: user.to_string(),
            item: item.to_string(),
            value,
        }
    }
}

/// Canonical key for an unordered user pair: the lexicographically smaller
/// id always sits first, so both emission orders of the same pair collide
/// into one group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    pub first: String,
    pub second: String,
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.first, self.second)
    }
}

/// One direction of a symmetric similarity relation. For every scored pair
/// (a, b) the pipeline materializes both (a -> b) and (b -> a) with the
/// identical score.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSimilarity {
    pub user: String,
    pub neighbor: String,
    pub score: f64,
}

/// A neighbor candidate with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: String,
    pub score: f64,
}

/// A user's retained neighbors, ordered by score descending. The order is
/// the rank and must survive serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborList {
    pub user: String,
    pub neighbors: Vec<Neighbor>,
}

/// A recommended item with its predicted score.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub item: String,
    pub score: f64,
}

/// A user's ranked recommendations, ordered by predicted score descending.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationList {
    pub user: String,
    pub items: Vec<Recommendation>,
}

/// Immutable lookup table for the stage-4 broadcast join: user id to that
/// user's retained neighbors. Built once from the full stage-3 output and
/// shared read-only across all stage-4 workers.
pub type NeighborTable = HashMap<String, Vec<Neighbor>>;

/// Build the broadcast lookup table from stage-3 output.
pub fn neighbor_table(lists: &[NeighborList]) -> NeighborTable {
    lists
        .iter()
        .map(|l| (l.user.clone(), l.neighbors.clone()))
        .collect()
}
