// The four domain stages of the pipeline, in execution order.
//
// Each stage implements `engine::GroupStage`; the chaining contract is that
// a stage's output type is the next stage's input type. Stage 4 additionally
// needs the full stage-3 output as a broadcast lookup table before it can
// process its first record.

pub mod neighbors;
pub mod pairs;
pub mod recommend;
pub mod similarity;

pub use neighbors::NeighborSelector;
pub use pairs::PairGenerator;
pub use recommend::RecommendationAggregator;
pub use similarity::SimilarityScorer;
