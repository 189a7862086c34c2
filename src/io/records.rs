// Tab-delimited inter-stage record encodings.
//
// Every stage output is a `key<TAB>value` line. Value fields are separated
// by commas, list items by semicolons, and a recommendation is rendered as
// `item:score` with the score rounded to two decimals for display:
//
//   step1: userA,userB<TAB>ratingA,ratingB
//   step2: user<TAB>neighbor,score
//   step3: user<TAB>n1,s1;n2,s2;...
//   final: user<TAB>item1:s1,item2:s2,...
//
// List order is meaningful — it is the rank — and round-trips unchanged.

use crate::types::{
    Neighbor, NeighborList, PairKey, Recommendation, RecommendationList, UserSimilarity,
};

pub fn encode_pair(key: &PairKey, ratings: (f64, f64)) -> String {
    format!("{key}\t{},{}", ratings.0, ratings.1)
}

pub fn encode_similarity(sim: &UserSimilarity) -> String {
    format!("{}\t{},{}", sim.user, sim.neighbor, sim.score)
}

pub fn encode_neighbor_list(list: &NeighborList) -> String {
    let entries: Vec<String> = list
        .neighbors
        .iter()
        .map(|n| format!("{},{}", n.id, n.score))
        .collect();
    format!("{}\t{}", list.user, entries.join(";"))
}

pub fn decode_neighbor_list(line: &str) -> Option<NeighborList> {
    let (user, value) = line.split_once('\t')?;
    let mut neighbors = Vec::new();
    for entry in value.split(';') {
        let (id, score) = entry.split_once(',')?;
        neighbors.push(Neighbor {
            id: id.to_string(),
            score: score.parse().ok()?,
        });
    }
    Some(NeighborList {
        user: user.to_string(),
        neighbors,
    })
}

pub fn encode_recommendation_list(list: &RecommendationList) -> String {
    let entries: Vec<String> = list
        .items
        .iter()
        .map(|r| format!("{}:{:.2}", r.item, r.score))
        .collect();
    format!("{}\t{}", list.user, entries.join(","))
}

pub fn decode_recommendation_list(line: &str) -> Option<RecommendationList> {
    let (user, value) = line.split_once('\t')?;
    let mut items = Vec::new();
    for entry in value.split(',') {
        let (item, score) = entry.rsplit_once(':')?;
        items.push(Recommendation {
            item: item.to_string(),
            score: score.parse().ok()?,
        });
    }
    Some(RecommendationList {
        user: user.to_string(),
        items,
    })
}
