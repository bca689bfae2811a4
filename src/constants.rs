/// Blocks attached by the enricher. Stripped from a record before hashing so
/// re-enriching an already enriched document yields the same ids.
pub const OBJECT_ID_KEY: &str = "object_id";
pub const AUDIT_KEY: &str = "audit";
pub const DQ_KEY: &str = "dq";
pub const RESERVED_KEYS: [&str; 3] = [OBJECT_ID_KEY, AUDIT_KEY, DQ_KEY];

/// Wrapper field for array elements that are not objects
pub const RAW_KEY: &str = "raw";

// Top-level output fields
pub const SUMMARY_KEY: &str = "dq_summary";
pub const ENRICHED_AT_KEY: &str = "enriched_at";
pub const ENRICHED_SUFFIX: &str = "_enriched";

// Default collection names looked up when none are configured
pub const AIR_QUALITY_COLLECTION: &str = "records";
pub const ACCOUNT_COLLECTION: &str = "accounts";
pub const TRANSACTION_COLLECTION: &str = "transactions";

/// Breakdown group used when a record has no usable grouping value
pub const UNKNOWN_GROUP: &str = "unknown";

pub const DEFAULT_INACTIVE_WINDOW_DAYS: i64 = 90;
pub const MAX_INACTIVE_WINDOW_DAYS: i64 = 36_500;
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_CONFIG_FILE: &str = "enrich.toml";

// Environment overrides
pub const ENV_CONFIG_PATH: &str = "ENRICH_CONFIG";
pub const ENV_ID_SCHEME: &str = "ENRICH_ID_SCHEME";
pub const ENV_INACTIVE_WINDOW_DAYS: &str = "ENRICH_INACTIVE_WINDOW_DAYS";
pub const ENV_LOG_DIR: &str = "ENRICH_LOG_DIR";

/// Formats accepted for the air-quality `last_update` field
pub const READING_TIMESTAMP_FORMATS: [&str; 3] =
    ["%d-%m-%Y %H:%M:%S", "%Y-%m-%dT%H:%M:%SZ", "%d/%m/%Y %H:%M:%S"];

/// Formats accepted for banking date fields (RFC 3339 is tried separately)
pub const BANKING_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];
