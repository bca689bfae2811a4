use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::EnrichError;

/// Length of a hex-encoded SHA-256 digest
pub const DIGEST_HEX_LEN: usize = 64;

/// How `object_id` is derived from the canonical record hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    /// The hex digest itself
    #[default]
    Sha256,
    /// A v5 UUID in the URL namespace over the hex digest
    Uuid5,
}

impl fmt::Display for IdScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdScheme::Sha256 => f.write_str("sha256"),
            IdScheme::Uuid5 => f.write_str("uuid5"),
        }
    }
}

impl FromStr for IdScheme {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" => Ok(IdScheme::Sha256),
            "uuid5" | "uuid" => Ok(IdScheme::Uuid5),
            other => Err(EnrichError::Config(format!("Unknown id scheme '{}'", other))),
        }
    }
}

/// Lowercase hex SHA-256 of the canonical form
pub fn content_hash(canonical: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical);
    hex::encode(hasher.finalize())
}

/// Derives the record identifier from an already computed content hash
pub fn object_id(scheme: IdScheme, content_hash: &str) -> String {
    match scheme {
        IdScheme::Sha256 => content_hash.to_string(),
        IdScheme::Uuid5 => Uuid::new_v5(&Uuid::NAMESPACE_URL, content_hash.as_bytes()).to_string(),
    }
}
