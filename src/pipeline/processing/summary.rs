use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN_GROUP;
use crate::pipeline::processing::enrich::EnrichedRecord;
use crate::pipeline::processing::quality_gate::checks::{as_number, text};
use crate::types::RecordKind;

/// A grouping reported per record kind: count records by `key`, and total
/// `sum_field` per group when one is declared.
#[derive(Debug, Clone, Copy)]
pub struct BreakdownSpec {
    pub key: &'static str,
    pub sum_field: Option<&'static str>,
}

const AIR_QUALITY_BREAKDOWNS: &[BreakdownSpec] = &[
    BreakdownSpec { key: "pollutant_id", sum_field: Some("pollutant_avg") },
    BreakdownSpec { key: "state", sum_field: None },
];

const ACCOUNT_BREAKDOWNS: &[BreakdownSpec] = &[
    BreakdownSpec { key: "currency", sum_field: Some("balance") },
    BreakdownSpec { key: "status", sum_field: None },
];

const TRANSACTION_BREAKDOWNS: &[BreakdownSpec] = &[
    BreakdownSpec { key: "status", sum_field: Some("amount") },
    BreakdownSpec { key: "currency", sum_field: Some("amount") },
];

pub fn breakdowns_for(kind: RecordKind) -> &'static [BreakdownSpec] {
    match kind {
        RecordKind::AirQuality => AIR_QUALITY_BREAKDOWNS,
        RecordKind::Account => ACCOUNT_BREAKDOWNS,
        RecordKind::Transaction => TRANSACTION_BREAKDOWNS,
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BreakdownGroup {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sum: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Breakdown {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sum_field: Option<String>,
    pub groups: BTreeMap<String, BreakdownGroup>,
}

/// Counts for one record collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub kind: RecordKind,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub issue_counts: BTreeMap<String, usize>,
    pub breakdowns: BTreeMap<String, Breakdown>,
}

impl CollectionSummary {
    pub fn empty(kind: RecordKind) -> Self {
        let breakdowns = breakdowns_for(kind)
            .iter()
            .map(|spec| {
                let breakdown = Breakdown {
                    sum_field: spec.sum_field.map(str::to_string),
                    groups: BTreeMap::new(),
                };
                (spec.key.to_string(), breakdown)
            })
            .collect();
        Self {
            kind,
            total: 0,
            passed: 0,
            failed: 0,
            issue_counts: BTreeMap::new(),
            breakdowns,
        }
    }
}

/// Document-level summary across all collections
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DqSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub collections: BTreeMap<String, CollectionSummary>,
}

impl DqSummary {
    pub fn from_collections(collections: impl IntoIterator<Item = (String, CollectionSummary)>) -> Self {
        let mut summary = DqSummary::default();
        for (name, collection) in collections {
            summary.total += collection.total;
            summary.passed += collection.passed;
            summary.failed += collection.failed;
            summary.collections.insert(name, collection);
        }
        summary
    }
}

/// Aggregates one collection of enriched records
pub fn summarize(kind: RecordKind, records: &[EnrichedRecord]) -> CollectionSummary {
    let specs = breakdowns_for(kind);
    let mut summary = CollectionSummary::empty(kind);

    for record in records {
        summary.total += 1;
        if record.passed() {
            summary.passed += 1;
        } else {
            summary.failed += 1;
        }
        for issue in &record.dq().issues {
            *summary.issue_counts.entry(issue.clone()).or_insert(0) += 1;
        }

        let fields = record.fields();
        for spec in specs {
            let group_key = text(fields.get(spec.key))
                .map(|t| t.into_owned())
                .unwrap_or_else(|| UNKNOWN_GROUP.to_string());
            let Some(breakdown) = summary.breakdowns.get_mut(spec.key) else { continue };
            let group = breakdown.groups.entry(group_key).or_insert_with(|| BreakdownGroup {
                count: 0,
                sum: spec.sum_field.map(|_| 0.0),
            });
            group.count += 1;
            if let (Some(sum), Some(field)) = (group.sum.as_mut(), spec.sum_field) {
                if let Some(value) = as_number(fields.get(field)) {
                    *sum += value;
                }
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::enrich::AuditBlock;
    use crate::pipeline::processing::quality_gate::QualityAssessment;
    use crate::types::RunContext;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    fn enriched(kind: RecordKind, value: Value, issues: &[&str]) -> EnrichedRecord {
        let run = RunContext::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), "test");
        EnrichedRecord::new(
            kind,
            value.as_object().unwrap().clone(),
            "id".to_string(),
            AuditBlock::new(&run, "h"),
            QualityAssessment::from_issues(issues.iter().map(|s| s.to_string()).collect()),
        )
    }

    #[test]
    fn test_empty_collection_is_all_zero() {
        let summary = summarize(RecordKind::Account, &[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.passed, 0);
        assert_eq!(summary.failed, 0);
        assert!(summary.issue_counts.is_empty());
        assert!(summary.breakdowns.values().all(|b| b.groups.is_empty()));
    }

    #[test]
    fn test_account_counts_and_balances() {
        let records = vec![
            enriched(RecordKind::Account, json!({"currency": "USD", "balance": 100.5, "status": "active"}), &[]),
            enriched(RecordKind::Account, json!({"currency": "USD", "balance": "20", "status": "inactive"}), &[
                "account_inactive_no_recent_transaction",
            ]),
            enriched(RecordKind::Account, json!({"currency": "EUR", "balance": null, "status": "active"}), &[
                "balance_is_null",
            ]),
            enriched(RecordKind::Account, json!({"balance": 5}), &["currency_missing", "status_missing"]),
        ];

        let summary = summarize(RecordKind::Account, &records);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 3);
        assert_eq!(summary.issue_counts["balance_is_null"], 1);
        assert_eq!(summary.issue_counts["status_missing"], 1);

        let by_currency = &summary.breakdowns["currency"];
        assert_eq!(by_currency.sum_field.as_deref(), Some("balance"));
        assert_eq!(by_currency.groups["USD"], BreakdownGroup { count: 2, sum: Some(120.5) });
        assert_eq!(by_currency.groups["EUR"], BreakdownGroup { count: 1, sum: Some(0.0) });
        assert_eq!(by_currency.groups["unknown"], BreakdownGroup { count: 1, sum: Some(5.0) });

        let by_status = &summary.breakdowns["status"];
        assert_eq!(by_status.groups["active"], BreakdownGroup { count: 2, sum: None });
        let keys: Vec<&String> = by_status.groups.keys().collect();
        assert_eq!(keys, vec!["active", "inactive", "unknown"]);
    }

    #[test]
    fn test_document_summary_adds_up() {
        let readings = vec![
            enriched(RecordKind::AirQuality, json!({"pollutant_id": "PM10", "pollutant_avg": "40"}), &[]),
            enriched(RecordKind::AirQuality, json!({"pollutant_id": "PM10", "pollutant_avg": "NA"}), &[
                "pollutant_avg_na",
            ]),
        ];
        let transactions = vec![enriched(
            RecordKind::Transaction,
            json!({"status": "pending", "currency": "USD", "amount": 12}),
            &["transaction_status_pending"],
        )];

        let summary = DqSummary::from_collections([
            ("records".to_string(), summarize(RecordKind::AirQuality, &readings)),
            ("transactions".to_string(), summarize(RecordKind::Transaction, &transactions)),
        ]);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.passed + summary.failed, summary.total);

        let pm10 = &summary.collections["records"].breakdowns["pollutant_id"].groups["PM10"];
        assert_eq!(pm10, &BreakdownGroup { count: 2, sum: Some(40.0) });
    }

    #[test]
    fn test_summary_serializes_sorted_keys() {
        let summary = summarize(RecordKind::Transaction, &[]);
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["kind"], json!("transaction"));
        assert_eq!(value["breakdowns"]["status"], json!({"sum_field": "amount", "groups": {}}));
    }
}
