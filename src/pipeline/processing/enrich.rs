use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{AUDIT_KEY, DQ_KEY, OBJECT_ID_KEY, RAW_KEY, RESERVED_KEYS};
use crate::pipeline::processing::quality_gate::QualityAssessment;
use crate::types::{Record, RecordKind, RunContext};

/// Ingestion metadata attached to each record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditBlock {
    /// Start of the run, identical for every record of one invocation
    pub ingested_at: String,
    /// Declared origin of the document, usually the input path
    pub source: String,
    /// SHA-256 of the record's canonical form
    pub hash: String,
}

impl AuditBlock {
    pub fn new(run: &RunContext, hash: impl Into<String>) -> Self {
        Self {
            ingested_at: run.timestamp(),
            source: run.source.clone(),
            hash: hash.into(),
        }
    }
}

/// A record with its identifier, audit block and DQ annotation. Built once by
/// the orchestrator and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    kind: RecordKind,
    fields: Record,
    object_id: String,
    audit: AuditBlock,
    dq: QualityAssessment,
}

impl EnrichedRecord {
    /// Attaches the blocks to a record. Any `object_id`/`audit`/`dq` carried
    /// over from an earlier run are replaced.
    pub fn new(kind: RecordKind, record: Record, object_id: String, audit: AuditBlock, dq: QualityAssessment) -> Self {
        Self {
            kind,
            fields: strip_reserved(record),
            object_id,
            audit,
            dq,
        }
    }

    /// Wraps an array element that is not an object under `raw`
    pub fn from_raw(kind: RecordKind, raw: Value, object_id: String, audit: AuditBlock, dq: QualityAssessment) -> Self {
        let mut fields = Map::new();
        fields.insert(RAW_KEY.to_string(), raw);
        Self { kind, fields, object_id, audit, dq }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// The record's own fields, without the attached blocks
    pub fn fields(&self) -> &Record {
        &self.fields
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn audit(&self) -> &AuditBlock {
        &self.audit
    }

    pub fn dq(&self) -> &QualityAssessment {
        &self.dq
    }

    pub fn passed(&self) -> bool {
        self.dq.passed
    }

    /// JSON form: original fields in order, then `object_id`, `audit`, `dq`
    pub fn to_value(&self) -> Value {
        let mut out = self.fields.clone();
        out.insert(OBJECT_ID_KEY.to_string(), Value::String(self.object_id.clone()));
        out.insert(AUDIT_KEY.to_string(), block_value(&self.audit));
        out.insert(DQ_KEY.to_string(), block_value(&self.dq));
        Value::Object(out)
    }
}

fn strip_reserved(record: Record) -> Record {
    record
        .into_iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .collect()
}

fn block_value<T: Serialize>(block: &T) -> Value {
    // Plain structs of strings, bools and string vectors always serialize
    serde_json::to_value(block).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn run() -> RunContext {
        RunContext::new(Utc.with_ymd_and_hms(2024, 1, 8, 11, 0, 0).unwrap(), "aqi.json")
    }

    #[test]
    fn test_audit_block_uses_run_context() {
        let audit = AuditBlock::new(&run(), "abc123");
        assert_eq!(audit.ingested_at, "2024-01-08T11:00:00.000000Z");
        assert_eq!(audit.source, "aqi.json");
        assert_eq!(audit.hash, "abc123");
    }

    #[test]
    fn test_enriched_value_layout() {
        let record = json!({"city": "Pune", "pollutant_avg": 40});
        let enriched = EnrichedRecord::new(
            RecordKind::AirQuality,
            record.as_object().unwrap().clone(),
            "id-1".to_string(),
            AuditBlock::new(&run(), "h"),
            QualityAssessment::from_issues(vec![]),
        );

        let value = enriched.to_value();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["city", "pollutant_avg", "object_id", "audit", "dq"]);
        assert_eq!(value["dq"], json!({"passed": true, "issues": []}));
        assert_eq!(value["audit"]["source"], json!("aqi.json"));
    }

    #[test]
    fn test_previous_blocks_are_replaced() {
        let record = json!({
            "object_id": "stale",
            "account_id": "A-1",
            "dq": {"passed": true, "issues": []},
            "audit": {"source": "old.json"}
        });
        let enriched = EnrichedRecord::new(
            RecordKind::Account,
            record.as_object().unwrap().clone(),
            "fresh".to_string(),
            AuditBlock::new(&run(), "h"),
            QualityAssessment::from_issues(vec!["balance_is_null".to_string()]),
        );

        assert_eq!(enriched.fields().len(), 1);
        let value = enriched.to_value();
        assert_eq!(value["object_id"], json!("fresh"));
        assert_eq!(value["audit"]["source"], json!("aqi.json"));
        assert_eq!(value["dq"]["passed"], json!(false));
    }

    #[test]
    fn test_raw_records_are_wrapped() {
        let enriched = EnrichedRecord::from_raw(
            RecordKind::Transaction,
            json!(42),
            "id".to_string(),
            AuditBlock::new(&run(), "h"),
            QualityAssessment::from_issues(vec!["record_not_object".to_string()]),
        );
        assert_eq!(enriched.to_value()["raw"], json!(42));
        assert!(!enriched.passed());
    }
}
