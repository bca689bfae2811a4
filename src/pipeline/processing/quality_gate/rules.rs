//! Declarative rule tables. Each rule is a pure predicate paired with the
//! issue code it reports; tables are evaluated top to bottom and every
//! triggered rule is reported.

use serde_json::Value;

use super::checks::{
    as_number, date_field, field, is_blank, is_currency_code, is_na, is_null, parse_reading_timestamp,
    text, text_eq,
};
use super::RuleContext;
use crate::types::{Record, RecordKind};

pub type Predicate = fn(&Record, &RuleContext<'_>) -> bool;

/// A single data-quality rule: report `code` when `triggered` holds
pub struct Rule {
    pub code: &'static str,
    pub triggered: Predicate,
}

const LATITUDE: &[&str] = &["latitude", "lat"];
const LONGITUDE: &[&str] = &["longitude", "lon", "lng"];

pub static AIR_QUALITY_RULES: &[Rule] = &[
    Rule { code: "country_missing", triggered: |r, _| is_blank(r.get("country")) },
    Rule { code: "state_missing", triggered: |r, _| is_blank(r.get("state")) },
    Rule { code: "city_missing", triggered: |r, _| is_blank(r.get("city")) },
    Rule { code: "station_missing", triggered: |r, _| is_blank(r.get("station")) },
    Rule { code: "pollutant_id_missing", triggered: |r, _| is_blank(r.get("pollutant_id")) },
    Rule { code: "last_update_missing", triggered: |r, _| is_blank(r.get("last_update")) },
    Rule { code: "last_update_unparseable", triggered: |r, _| last_update_unparseable(r) },
    Rule { code: "latitude_not_numeric", triggered: |r, _| as_number(field(r, LATITUDE)).is_none() },
    Rule {
        code: "latitude_out_of_range",
        triggered: |r, _| outside(as_number(field(r, LATITUDE)), -90.0, 90.0),
    },
    Rule { code: "longitude_not_numeric", triggered: |r, _| as_number(field(r, LONGITUDE)).is_none() },
    Rule {
        code: "longitude_out_of_range",
        triggered: |r, _| outside(as_number(field(r, LONGITUDE)), -180.0, 180.0),
    },
    Rule { code: "pollutant_avg_missing", triggered: |r, _| is_blank(r.get("pollutant_avg")) },
    Rule { code: "pollutant_avg_na", triggered: |r, _| is_na(r.get("pollutant_avg")) },
    Rule {
        code: "pollutant_avg_not_numeric",
        triggered: |r, _| {
            let v = r.get("pollutant_avg");
            !is_blank(v) && !is_na(v) && as_number(v).is_none()
        },
    },
];

pub static ACCOUNT_RULES: &[Rule] = &[
    Rule { code: "account_id_missing", triggered: |r, _| is_blank(r.get("account_id")) },
    Rule { code: "balance_is_null", triggered: |r, _| is_null(r.get("balance")) },
    Rule {
        code: "balance_not_numeric",
        triggered: |r, _| {
            let v = r.get("balance");
            !is_null(v) && as_number(v).is_none()
        },
    },
    Rule { code: "currency_missing", triggered: |r, _| is_blank(r.get("currency")) },
    Rule { code: "currency_invalid", triggered: |r, _| currency_invalid(r) },
    Rule { code: "status_missing", triggered: |r, _| is_blank(r.get("status")) },
    Rule {
        code: "last_transaction_date_unparseable",
        triggered: |r, _| {
            let v = r.get("last_transaction_date");
            !is_blank(v) && date_field(v).is_none()
        },
    },
    Rule { code: "account_inactive_no_recent_transaction", triggered: inactive_without_recent_activity },
];

pub static TRANSACTION_RULES: &[Rule] = &[
    Rule { code: "transaction_id_missing", triggered: |r, _| is_blank(r.get("transaction_id")) },
    Rule { code: "account_id_missing", triggered: |r, _| is_blank(r.get("account_id")) },
    Rule { code: "amount_is_empty", triggered: |r, _| is_blank(r.get("amount")) },
    Rule {
        code: "amount_not_numeric",
        triggered: |r, _| {
            let v = r.get("amount");
            !is_blank(v) && as_number(v).is_none()
        },
    },
    Rule { code: "currency_missing", triggered: |r, _| is_blank(r.get("currency")) },
    Rule { code: "currency_invalid", triggered: |r, _| currency_invalid(r) },
    Rule { code: "transaction_date_missing", triggered: |r, _| is_blank(r.get("transaction_date")) },
    Rule {
        code: "transaction_date_unparseable",
        triggered: |r, _| {
            let v = r.get("transaction_date");
            !is_blank(v) && date_field(v).is_none()
        },
    },
    Rule { code: "transaction_status_pending", triggered: |r, _| text_eq(r.get("status"), "pending") },
    Rule { code: "transaction_status_failed", triggered: |r, _| text_eq(r.get("status"), "failed") },
];

/// The fixed rule table for a record kind
pub fn rules_for(kind: RecordKind) -> &'static [Rule] {
    match kind {
        RecordKind::AirQuality => AIR_QUALITY_RULES,
        RecordKind::Account => ACCOUNT_RULES,
        RecordKind::Transaction => TRANSACTION_RULES,
    }
}

fn outside(value: Option<f64>, min: f64, max: f64) -> bool {
    value.is_some_and(|v| !(min..=max).contains(&v))
}

fn last_update_unparseable(record: &Record) -> bool {
    match record.get("last_update") {
        v if is_blank(v) => false,
        Some(Value::String(s)) => parse_reading_timestamp(s).is_none(),
        Some(_) => true,
        None => false,
    }
}

fn currency_invalid(record: &Record) -> bool {
    let v = record.get("currency");
    !is_blank(v) && !is_currency_code(v)
}

fn inactive_without_recent_activity(record: &Record, ctx: &RuleContext<'_>) -> bool {
    if !text_eq(record.get("status"), "inactive") {
        return false;
    }
    let own = date_field(record.get("last_transaction_date"));
    let indexed = text(record.get("account_id")).and_then(|id| ctx.activity.latest_for(&id));
    match (own.max(indexed), ctx.recency_cutoff()) {
        (None, _) => true,
        (Some(latest), Some(cutoff)) => latest < cutoff,
        (Some(_), None) => false,
    }
}
