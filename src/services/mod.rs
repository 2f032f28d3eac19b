pub mod enrichment;
pub mod generator;
pub mod metadata;
pub mod orchestrator;
pub mod resolver;
