use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::constants::{ENRICHED_AT_KEY, ENRICHED_SUFFIX, SUMMARY_KEY};
use crate::error::{EnrichError, RecordShapeError, Result};
use crate::pipeline::processing::canonical;
use crate::pipeline::processing::enrich::{AuditBlock, EnrichedRecord};
use crate::pipeline::processing::identifier::{self, IdScheme};
use crate::pipeline::processing::quality_gate::{
    ActivityIndex, DefaultQualityGate, QualityAssessment, QualityGate, QualityGateConfig, RuleContext,
};
use crate::pipeline::processing::summary::{self, CollectionSummary, DqSummary};
use crate::types::{CollectionSpec, RecordKind, RunContext};

/// Settings for one enrichment run
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub id_scheme: IdScheme,
    /// Collections to process. Empty means look for the default field names.
    pub collections: Vec<CollectionSpec>,
    pub quality_gate: QualityGateConfig,
}

/// Result of enriching a whole document
#[derive(Debug, Clone)]
pub struct EnrichedDocument {
    pub document: Value,
    pub summary: DqSummary,
}

/// Document-level transform: canonicalize, derive ids, assess, attach
/// audit and DQ blocks, then summarize every collection.
pub struct Pipeline {
    config: PipelineConfig,
    gate: DefaultQualityGate,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let gate = DefaultQualityGate::with_config(config.quality_gate.clone());
        Self { config, gate }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Enriches `document` in memory. Fails only when the document shape is
    /// unusable; individual bad records are annotated and kept.
    pub fn enrich_document(&self, document: &Value, run: &RunContext) -> Result<EnrichedDocument> {
        let top = document.as_object().ok_or_else(|| {
            EnrichError::MalformedInput(format!(
                "top-level value must be an object, found {}",
                canonical::kind_name(document)
            ))
        })?;

        let collections = self.resolve_collections(top)?;

        let activity = ActivityIndex::from_transactions(
            collections
                .iter()
                .filter(|(spec, _)| spec.kind == RecordKind::Transaction)
                .flat_map(|(_, records)| records.iter()),
        );
        let ctx = self.gate.rule_context(run.ingested_at, &activity);
        debug!(accounts_indexed = activity.len(), "Built account activity index");

        let mut enriched_collections = Vec::with_capacity(collections.len());
        for (spec, records) in &collections {
            let enriched: Vec<EnrichedRecord> = records
                .iter()
                .enumerate()
                .map(|(position, value)| self.enrich_record(spec, position, value, run, &ctx))
                .collect();
            let collection_summary = summary::summarize(spec.kind, &enriched);
            info!(
                collection = %spec.field,
                kind = %spec.kind,
                total = collection_summary.total,
                passed = collection_summary.passed,
                failed = collection_summary.failed,
                "Enriched collection"
            );
            enriched_collections.push((spec, enriched, collection_summary));
        }

        let summary = DqSummary::from_collections(
            enriched_collections
                .iter()
                .map(|(spec, _, s)| (spec.field.clone(), s.clone())),
        );

        let document = assemble_output(top, &enriched_collections, &summary, run)?;
        Ok(EnrichedDocument { document, summary })
    }

    /// Picks the record arrays to process, in document order
    fn resolve_collections<'a>(&self, top: &'a Map<String, Value>) -> Result<Vec<(CollectionSpec, &'a Vec<Value>)>> {
        let explicit = !self.config.collections.is_empty();
        let specs = if explicit {
            self.config.collections.clone()
        } else {
            CollectionSpec::defaults()
        };

        let mut seen = BTreeSet::new();
        for spec in &specs {
            if !seen.insert(spec.field.as_str()) {
                return Err(EnrichError::Config(format!("Collection '{}' is listed more than once", spec.field)));
            }
        }

        let mut found = Vec::new();
        for spec in specs {
            match top.get(&spec.field) {
                Some(Value::Array(records)) => found.push((spec, records)),
                Some(other) => {
                    return Err(EnrichError::MalformedInput(format!(
                        "field '{}' must be an array of records, found {}",
                        spec.field,
                        canonical::kind_name(other)
                    )))
                }
                None if explicit => {
                    return Err(EnrichError::MalformedInput(format!(
                        "expected top-level array field '{}' is missing",
                        spec.field
                    )))
                }
                None => {}
            }
        }

        if found.is_empty() {
            let expected: Vec<&str> = RecordKind::all().iter().map(|k| k.default_collection()).collect();
            return Err(EnrichError::MalformedInput(format!(
                "no record array found; expected one of: {}",
                expected.join(", ")
            )));
        }

        // Keep document order so output and logs follow the input layout
        found.sort_by_key(|(spec, _)| top.keys().position(|k| k == &spec.field));
        Ok(found)
    }

    fn enrich_record(
        &self,
        spec: &CollectionSpec,
        position: usize,
        value: &Value,
        run: &RunContext,
        ctx: &RuleContext<'_>,
    ) -> EnrichedRecord {
        let enriched = match value {
            Value::Object(record) => match canonical::canonicalize_record(record) {
                Ok(canonical_form) => {
                    let hash = identifier::content_hash(canonical_form.as_bytes());
                    let object_id = identifier::object_id(self.config.id_scheme, &hash);
                    let dq = self.gate.assess(spec.kind, record, ctx);
                    EnrichedRecord::new(spec.kind, record.clone(), object_id, AuditBlock::new(run, hash), dq)
                }
                Err(err) => self.degraded_record(spec, position, value, err, run, ctx),
            },
            other => {
                let err = RecordShapeError::NotAnObject { found: canonical::kind_name(other) };
                self.degraded_record(spec, position, value, err, run, ctx)
            }
        };

        if !enriched.passed() {
            debug!(
                collection = %spec.field,
                position,
                object_id = enriched.object_id(),
                issues = ?enriched.dq().issues,
                "Record failed DQ checks"
            );
        }
        enriched
    }

    /// A record that could not be hashed as-is: best-effort id, shape issue
    /// first, then whatever the rules still find on an object.
    fn degraded_record(
        &self,
        spec: &CollectionSpec,
        position: usize,
        value: &Value,
        err: RecordShapeError,
        run: &RunContext,
        ctx: &RuleContext<'_>,
    ) -> EnrichedRecord {
        warn!(collection = %spec.field, position, error = %err, "Record shape error; keeping record with DQ issue");

        let hash = identifier::content_hash(best_effort_form(value).as_bytes());
        let object_id = identifier::object_id(self.config.id_scheme, &hash);
        let audit = AuditBlock::new(run, hash);

        match value {
            Value::Object(record) => {
                let mut issues = vec![err.issue_code().to_string()];
                issues.extend(self.gate.assess(spec.kind, record, ctx).issues);
                let dq = QualityAssessment::from_issues(issues);
                EnrichedRecord::new(spec.kind, record.clone(), object_id, audit, dq)
            }
            other => {
                let dq = QualityAssessment::shape_failure(&err);
                EnrichedRecord::from_raw(spec.kind, other.clone(), object_id, audit, dq)
            }
        }
    }
}

/// Hash input for values that could not be canonicalized as records
fn best_effort_form(value: &Value) -> String {
    canonical::canonicalize_any(value).unwrap_or_else(|_| value.to_string())
}

fn assemble_output(
    top: &Map<String, Value>,
    collections: &[(&CollectionSpec, Vec<EnrichedRecord>, CollectionSummary)],
    summary: &DqSummary,
    run: &RunContext,
) -> Result<Value> {
    let enriched_name = |field: &str| format!("{}{}", field, ENRICHED_SUFFIX);
    let replaced: BTreeSet<String> = collections
        .iter()
        .map(|(spec, _, _)| enriched_name(&spec.field))
        .chain([SUMMARY_KEY.to_string(), ENRICHED_AT_KEY.to_string()])
        .collect();

    let mut out = Map::new();
    for (key, value) in top {
        if let Some((spec, records, _)) = collections.iter().find(|(spec, _, _)| &spec.field == key) {
            let array = records.iter().map(EnrichedRecord::to_value).collect();
            out.insert(enriched_name(&spec.field), Value::Array(array));
        } else if replaced.contains(key) {
            warn!(key = %key, "Top-level field overwritten by enrichment output");
        } else {
            out.insert(key.clone(), value.clone());
        }
    }

    out.insert(SUMMARY_KEY.to_string(), serde_json::to_value(summary)?);
    out.insert(ENRICHED_AT_KEY.to_string(), Value::String(run.timestamp()));
    Ok(Value::Object(out))
}
