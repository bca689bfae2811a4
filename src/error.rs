use thiserror::Error;

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("Malformed input document: {0}")]
    MalformedInput(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Per-record failure to produce a canonical form. Never aborts a batch;
/// the orchestrator turns it into a DQ issue on the offending record.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordShapeError {
    #[error("record is not a JSON object (found {found})")]
    NotAnObject { found: &'static str },

    /// Produced when nesting exceeds the canonicalizer's depth limit
    #[error("record could not be serialized for hashing: {0}")]
    Unserializable(String),
}

impl RecordShapeError {
    /// Issue code listed in the record's `dq.issues`
    pub fn issue_code(&self) -> &'static str {
        match self {
            RecordShapeError::NotAnObject { .. } => "record_not_object",
            RecordShapeError::Unserializable(_) => "record_unserializable",
        }
    }
}

pub type Result<T> = std::result::Result<T, EnrichError>;
