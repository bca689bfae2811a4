use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants;
use crate::error::EnrichError;

/// A single input record: field name to JSON value, in input order.
pub type Record = Map<String, Value>;

/// The kinds of records the rule engine knows how to assess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    AirQuality,
    Account,
    Transaction,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::AirQuality => "air_quality",
            RecordKind::Account => "account",
            RecordKind::Transaction => "transaction",
        }
    }

    /// The top-level field this kind is read from when collections are auto-detected
    pub fn default_collection(&self) -> &'static str {
        match self {
            RecordKind::AirQuality => constants::AIR_QUALITY_COLLECTION,
            RecordKind::Account => constants::ACCOUNT_COLLECTION,
            RecordKind::Transaction => constants::TRANSACTION_COLLECTION,
        }
    }

    pub fn all() -> [RecordKind; 3] {
        [RecordKind::AirQuality, RecordKind::Account, RecordKind::Transaction]
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = EnrichError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "air_quality" | "aqi" => Ok(RecordKind::AirQuality),
            "account" | "accounts" => Ok(RecordKind::Account),
            "transaction" | "transactions" => Ok(RecordKind::Transaction),
            other => Err(EnrichError::Config(format!("Unknown record kind '{}'", other))),
        }
    }
}

/// Binds a top-level document field to the kind of records it holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSpec {
    pub field: String,
    pub kind: RecordKind,
}

impl CollectionSpec {
    pub fn new(field: impl Into<String>, kind: RecordKind) -> Self {
        Self { field: field.into(), kind }
    }

    /// The default binding for every known kind
    pub fn defaults() -> Vec<CollectionSpec> {
        RecordKind::all()
            .into_iter()
            .map(|kind| CollectionSpec::new(kind.default_collection(), kind))
            .collect()
    }
}

impl FromStr for CollectionSpec {
    type Err = EnrichError;

    /// Parses `FIELD=KIND`, e.g. `records=air_quality`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, kind) = s.split_once('=').ok_or_else(|| {
            EnrichError::Config(format!("Collection '{}' must look like FIELD=KIND", s))
        })?;
        let field = field.trim();
        if field.is_empty() {
            return Err(EnrichError::Config(format!("Collection '{}' has an empty field name", s)));
        }
        Ok(CollectionSpec::new(field, kind.parse()?))
    }
}

/// Run-level context shared by every record of one invocation. The clock is
/// read once by the caller and threaded through from here.
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub ingested_at: DateTime<Utc>,
    pub source: String,
}

impl RunContext {
    pub fn new(ingested_at: DateTime<Utc>, source: impl Into<String>) -> Self {
        Self { ingested_at, source: source.into() }
    }

    /// Reads the wall clock once for a fresh run
    pub fn starting_now(source: impl Into<String>) -> Self {
        Self::new(Utc::now(), source)
    }

    pub fn timestamp(&self) -> String {
        self.ingested_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_kind_parsing() {
        assert_eq!("air_quality".parse::<RecordKind>().unwrap(), RecordKind::AirQuality);
        assert_eq!("Air-Quality".parse::<RecordKind>().unwrap(), RecordKind::AirQuality);
        assert_eq!("accounts".parse::<RecordKind>().unwrap(), RecordKind::Account);
        assert_eq!("transaction".parse::<RecordKind>().unwrap(), RecordKind::Transaction);
        assert!("weather".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_collection_spec_parsing() {
        let spec: CollectionSpec = "readings=air_quality".parse().unwrap();
        assert_eq!(spec, CollectionSpec::new("readings", RecordKind::AirQuality));

        assert!("readings".parse::<CollectionSpec>().is_err());
        assert!("=account".parse::<CollectionSpec>().is_err());
        assert!("ledger=unknown".parse::<CollectionSpec>().is_err());
    }

    #[test]
    fn test_run_context_timestamp_is_utc_rfc3339() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let ctx = RunContext::new(at, "input.json");
        assert_eq!(ctx.timestamp(), "2024-03-01T12:30:00.000000Z");
    }
}
