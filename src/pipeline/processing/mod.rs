// Pipeline processing: normalization, filtering and scoring of leads

pub mod filter;
pub mod normalize;
pub mod scoring;
