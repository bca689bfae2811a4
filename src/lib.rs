pub mod config;
pub mod constants;
pub mod document_io;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod types;

pub use error::{EnrichError, RecordShapeError, Result};
pub use pipeline::{EnrichedDocument, Pipeline, PipelineConfig};
pub use types::{CollectionSpec, Record, RecordKind, RunContext};
