pub mod checks;
pub mod rules;

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::DEFAULT_INACTIVE_WINDOW_DAYS;
use crate::error::RecordShapeError;
use crate::types::{Record, RecordKind};

/// Data-quality annotation attached to every enriched record.
/// `passed` is true exactly when `issues` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub passed: bool,
    pub issues: Vec<String>,
}

impl QualityAssessment {
    pub fn from_issues(issues: Vec<String>) -> Self {
        Self { passed: issues.is_empty(), issues }
    }

    /// Assessment for an array element that could not be treated as a record
    pub fn shape_failure(error: &RecordShapeError) -> Self {
        Self::from_issues(vec![error.issue_code().to_string()])
    }
}

/// Latest known transaction date per account, gathered from the transaction
/// collection of the same document before any rule runs.
#[derive(Debug, Clone, Default)]
pub struct ActivityIndex {
    latest: BTreeMap<String, NaiveDate>,
}

impl ActivityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every transaction that carries an account id and a parseable date
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut index = Self::new();
        for tx in transactions {
            let Some(tx) = tx.as_object() else { continue };
            let account = checks::text(tx.get("account_id"));
            let date = checks::date_field(tx.get("transaction_date"));
            if let (Some(account), Some(date)) = (account, date) {
                index.record(&account, date);
            }
        }
        index
    }

    pub fn record(&mut self, account_id: &str, date: NaiveDate) {
        self.latest
            .entry(account_id.to_string())
            .and_modify(|d| *d = (*d).max(date))
            .or_insert(date);
    }

    pub fn latest_for(&self, account_id: &str) -> Option<NaiveDate> {
        self.latest.get(account_id).copied()
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

/// Read-only inputs shared by every rule during one run
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    pub as_of: DateTime<Utc>,
    /// `None` when the configured day count does not fit a `Duration`
    pub inactive_window: Option<Duration>,
    pub activity: &'a ActivityIndex,
}

impl<'a> RuleContext<'a> {
    pub fn new(as_of: DateTime<Utc>, inactive_window_days: i64, activity: &'a ActivityIndex) -> Self {
        Self {
            as_of,
            inactive_window: Duration::try_days(inactive_window_days),
            activity,
        }
    }

    /// Activity on or after this date counts as recent. `None` means the
    /// window reaches past the earliest representable date, so any known
    /// activity is recent.
    pub fn recency_cutoff(&self) -> Option<NaiveDate> {
        let window = self.inactive_window?;
        self.as_of.checked_sub_signed(window).map(|cutoff| cutoff.date_naive())
    }
}

/// Trait for implementing record assessment logic
pub trait QualityGate {
    /// Run every rule for `kind` against the record
    fn assess(&self, kind: RecordKind, record: &Record, ctx: &RuleContext<'_>) -> QualityAssessment;
}

/// Configuration for quality assessment rules
#[derive(Debug, Clone)]
pub struct QualityGateConfig {
    /// Days without transactions after which an inactive account is flagged
    pub inactive_window_days: i64,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            inactive_window_days: DEFAULT_INACTIVE_WINDOW_DAYS,
        }
    }
}

/// Quality gate backed by the fixed rule tables in [`rules`]
#[derive(Debug, Clone, Default)]
pub struct DefaultQualityGate {
    pub config: QualityGateConfig,
}

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: QualityGateConfig) -> Self {
        Self { config }
    }

    pub fn rule_context<'a>(&self, as_of: DateTime<Utc>, activity: &'a ActivityIndex) -> RuleContext<'a> {
        RuleContext::new(as_of, self.config.inactive_window_days, activity)
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, kind: RecordKind, record: &Record, ctx: &RuleContext<'_>) -> QualityAssessment {
        let issues = rules::rules_for(kind)
            .iter()
            .filter(|rule| (rule.triggered)(record, ctx))
            .map(|rule| rule.code.to_string())
            .collect();
        QualityAssessment::from_issues(issues)
    }
}
