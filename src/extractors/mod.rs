// src/extractors/mod.rs
pub mod contest;
pub mod problem;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use contest::ContestExtractor;
#[allow(unused_imports)]
pub use problem::{ProblemExtractor, SampleKind, SampleSink};
