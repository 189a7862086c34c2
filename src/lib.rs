// Kindred: user-based collaborative filtering over sparse rating data
//
// This is the library root. Each module corresponds to a major subsystem
// of the batch recommendation pipeline.

pub mod config;
pub mod engine;
pub mod eval;
pub mod io;
pub mod output;
pub mod pipeline;
pub mod stages;
pub mod types;
