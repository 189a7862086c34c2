// The group-by-and-reduce execution primitive shared by all four stages.
//
// A stage is a (key extractor, group reducer) pair. The engine partitions
// the input stream by extracted key, then hands each group — the key plus
// the materialized sequence of all values sharing it — to the reducer,
// once per distinct key in deterministic key order.
//
// Groups are independent and stateless, so reduction runs data-parallel
// across groups with rayon. Determinism does not depend on scheduling:
// grouping happens in a BTreeMap and rayon's collect preserves the key
// order regardless of which worker finishes first.

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// One pipeline stage: a pure key extractor plus a pure per-group reducer.
///
/// `extract` may fan out (several keyed records from one input) or filter
/// (an empty vec drops the input). `reduce` sees each group exactly once
/// and may emit zero, one, or several outputs.
pub trait GroupStage: Sync {
    type Input;
    type Key: Ord + Send;
    type Value: Send;
    type Output: Send;

    fn extract(&self, input: &Self::Input) -> Vec<(Self::Key, Self::Value)>;

    fn reduce(&self, key: &Self::Key, values: Vec<Self::Value>) -> Vec<Self::Output>;
}

/// Run one stage over an in-memory input slice.
///
/// Values within a group keep their input encounter order — reducers rely
/// on this for stable tie-breaking.
pub fn run_stage<S: GroupStage>(stage: &S, inputs: &[S::Input]) -> Vec<S::Output> {
    let mut groups: BTreeMap<S::Key, Vec<S::Value>> = BTreeMap::new();
    for input in inputs {
        for (key, value) in stage.extract(input) {
            groups.entry(key).or_default().push(value);
        }
    }

    debug!(inputs = inputs.len(), groups = groups.len(), "stage grouped");

    groups
        .into_iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .flat_map_iter(|(key, values)| stage.reduce(&key, values))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts occurrences per key — enough to exercise grouping semantics.
    struct CountByKey;

    impl GroupStage for CountByKey {
        type Input = (String, u32);
        type Key = String;
        type Value = u32;
        type Output = (String, usize, u32);

        fn extract(&self, input: &(String, u32)) -> Vec<(String, u32)> {
            vec![(input.0.clone(), input.1)]
        }

        fn reduce(&self, key: &String, values: Vec<u32>) -> Vec<(String, usize, u32)> {
            vec![(key.clone(), values.len(), values.iter().sum())]
        }
    }

    #[test]
    fn groups_by_key_in_deterministic_order() {
        let inputs = vec![
            ("b".to_string(), 1),
            ("a".to_string(), 2),
            ("b".to_string(), 3),
            ("c".to_string(), 4),
            ("a".to_string(), 5),
        ];
        let out = run_stage(&CountByKey, &inputs);
        assert_eq!(
            out,
            vec![
                ("a".to_string(), 2, 7),
                ("b".to_string(), 2, 4),
                ("c".to_string(), 1, 4),
            ]
        );
    }

    #[test]
    fn identical_runs_produce_identical_output() {
        let inputs: Vec<(String, u32)> = (0..500)
            .map(|i| (format!("k{}", i % 37), i))
            .collect();
        let first = run_stage(&CountByKey, &inputs);
        let second = run_stage(&CountByKey, &inputs);
        assert_eq!(first, second);
    }

    /// A stage whose extractor filters and fans out.
    struct FanOut;

    impl GroupStage for FanOut {
        type Input = u32;
        type Key = u32;
        type Value = u32;
        type Output = (u32, Vec<u32>);

        fn extract(&self, input: &u32) -> Vec<(u32, u32)> {
            if *input == 0 {
                return Vec::new(); // filtered
            }
            vec![(*input % 2, *input), (*input % 3, *input)]
        }

        fn reduce(&self, key: &u32, values: Vec<u32>) -> Vec<(u32, Vec<u32>)> {
            vec![(*key, values)]
        }
    }

    #[test]
    fn extractor_can_filter_and_fan_out() {
        let out = run_stage(&FanOut, &[0, 1, 2]);
        // 0 is dropped; 1 -> keys {1, 1}; 2 -> keys {0, 2}
        assert_eq!(
            out,
            vec![(0, vec![2]), (1, vec![1, 1]), (2, vec![2])]
        );
    }

    #[test]
    fn values_keep_encounter_order_within_a_group() {
        let inputs = vec![
            ("k".to_string(), 9),
            ("k".to_string(), 3),
            ("k".to_string(), 7),
        ];
        struct Echo;
        impl GroupStage for Echo {
            type Input = (String, u32);
            type Key = String;
            type Value = u32;
            type Output = Vec<u32>;
            fn extract(&self, input: &(String, u32)) -> Vec<(String, u32)> {
                vec![(input.0.clone(), input.1)]
            }
            fn reduce(&self, _key: &String, values: Vec<u32>) -> Vec<Vec<u32>> {
                vec![values]
            }
        }
        assert_eq!(run_stage(&Echo, &inputs), vec![vec![9, 3, 7]]);
    }
}
