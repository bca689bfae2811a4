// Record processing: canonical form, ids, quality rules, enrichment and aggregation

pub mod canonical;
pub mod enrich;
pub mod identifier;
pub mod quality_gate;
pub mod summary;
