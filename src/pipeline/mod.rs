// Lead pipeline: per-stage processing plus the orchestrator that sequences it

pub mod orchestrator;
pub mod pipeline_config;
pub mod processing;

pub use orchestrator::{CancellationFlag, LeadGenerationPipeline, PipelineRunReport, SourceInput};
pub use pipeline_config::PipelineConfig;
