// Base trait and utilities for source-specific normalizers
pub mod base;

// Individual normalizer implementations
pub mod godaddy;
pub mod opensea;
pub mod sedo;

// Re-export the main components
pub use base::{MetricsNormalizer, NormalizerUtils, SourceNormalizer};
pub use godaddy::GoDaddyNormalizer;
pub use opensea::OpenSeaNormalizer;
pub use sedo::SedoNormalizer;
