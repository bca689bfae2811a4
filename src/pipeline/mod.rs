// Enrichment pipeline: per-record processing and the document-level orchestrator

pub mod pipeline;
pub mod processing;

// Re-export key types from each stage
pub use pipeline::{EnrichedDocument, Pipeline, PipelineConfig};
pub use processing::enrich::{AuditBlock, EnrichedRecord};
pub use processing::identifier::IdScheme;
pub use processing::quality_gate::{QualityAssessment, QualityGateConfig};
pub use processing::summary::{CollectionSummary, DqSummary};
