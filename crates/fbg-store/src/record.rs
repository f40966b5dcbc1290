//! Store row to [`AnnotationRecord`] normalization.
//!
//! Rows come back with camelCase or snake_case metadata names, versions as
//! numbers or strings, and timestamps in a few formats. Every column that is
//! not metadata is an annotated field.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use fbg_model::AnnotationRecord;
use serde_json::{Map, Value};

const DATASET_ALIASES: &[&str] = &["dataset_id", "datasetId", "app_id", "appId"];
const KEY_ALIASES: &[&str] = &["row_key", "rowKey", "key"];
const VERSION_ALIASES: &[&str] = &["version"];
const CREATED_BY_ALIASES: &[&str] = &["created_by", "createdBy"];
const CREATED_AT_ALIASES: &[&str] = &["created_at", "createdAt"];
const MODIFIED_BY_ALIASES: &[&str] = &["modified_by", "modifiedBy"];
const MODIFIED_AT_ALIASES: &[&str] = &["modified_at", "modifiedAt"];
const SESSION_ALIASES: &[&str] = &["session_id", "sessionId"];

/// Store-side columns that are neither metadata nor fields.
const IGNORED_COLUMNS: &[&str] = &["id", "_id"];

/// Records decoded from one response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedRecords {
    /// Records that decoded.
    pub records: Vec<AnnotationRecord>,
    /// Items dropped because they were not usable records.
    pub dropped: usize,
}

/// Normalize raw items, filling in `default_dataset` when a row omits it.
pub fn normalize_items(items: Vec<Value>, default_dataset: &str) -> NormalizedRecords {
    let mut out = NormalizedRecords::default();
    for item in items {
        match item {
            Value::Object(map) => match normalize_record(&map, default_dataset) {
                Some(record) => out.records.push(record),
                None => out.dropped += 1,
            },
            _ => out.dropped += 1,
        }
    }
    out
}

/// Normalize one row; `None` when the key or version is missing or invalid.
pub fn normalize_record(map: &Map<String, Value>, default_dataset: &str) -> Option<AnnotationRecord> {
    let key = lookup(map, KEY_ALIASES).and_then(value_text)?;
    if key.trim().is_empty() {
        return None;
    }
    let version = lookup(map, VERSION_ALIASES).and_then(value_version)?;

    let dataset_id = lookup(map, DATASET_ALIASES)
        .and_then(value_text)
        .unwrap_or_else(|| default_dataset.to_string());

    let created_at = lookup(map, CREATED_AT_ALIASES).and_then(value_timestamp);
    let modified_at = lookup(map, MODIFIED_AT_ALIASES).and_then(value_timestamp);
    let created_at = created_at.or(modified_at).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let modified_at = modified_at.unwrap_or(created_at);

    let created_by = lookup(map, CREATED_BY_ALIASES)
        .and_then(value_text)
        .unwrap_or_default();
    let modified_by = lookup(map, MODIFIED_BY_ALIASES)
        .and_then(value_text)
        .unwrap_or_else(|| created_by.clone());
    let session_id = lookup(map, SESSION_ALIASES)
        .and_then(value_text)
        .unwrap_or_default();

    let fields: BTreeMap<String, String> = map
        .iter()
        .filter(|(name, _)| !is_metadata(name))
        .filter_map(|(name, value)| value_text(value).map(|text| (name.clone(), text)))
        .collect();

    Some(AnnotationRecord {
        dataset_id,
        key,
        version,
        fields,
        created_by,
        created_at,
        modified_by,
        modified_at,
        session_id,
    })
}

fn is_metadata(name: &str) -> bool {
    [
        DATASET_ALIASES,
        KEY_ALIASES,
        VERSION_ALIASES,
        CREATED_BY_ALIASES,
        CREATED_AT_ALIASES,
        MODIFIED_BY_ALIASES,
        MODIFIED_AT_ALIASES,
        SESSION_ALIASES,
        IGNORED_COLUMNS,
    ]
    .iter()
    .any(|aliases| aliases.contains(&name))
}

fn lookup<'a>(map: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases
        .iter()
        .find_map(|alias| map.get(*alias))
        .filter(|value| !value.is_null())
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn value_version(value: &Value) -> Option<u32> {
    let version = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(version).ok().filter(|v| *v >= 1)
}

fn value_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Parse RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.f]` read as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_snake_case_row() {
        let map = object(json!({
            "id": 17,
            "dataset_id": "sales",
            "row_key": "Acme",
            "version": 2,
            "status": "Open",
            "comments": "call back",
            "created_by": "ann",
            "created_at": "2026-03-01T10:00:00Z",
            "modified_by": "bob",
            "modified_at": "2026-03-02 09:30:00",
            "session_id": "s-1"
        }));

        let record = normalize_record(&map, "ignored").unwrap();
        assert_eq!(record.dataset_id, "sales");
        assert_eq!(record.key, "Acme");
        assert_eq!(record.version, 2);
        assert_eq!(record.created_by, "ann");
        assert_eq!(record.modified_by, "bob");
        assert_eq!(record.modified_at.to_rfc3339(), "2026-03-02T09:30:00+00:00");
        assert_eq!(
            record.fields.keys().collect::<Vec<_>>(),
            vec!["comments", "status"]
        );
    }

    #[test]
    fn test_camel_case_and_string_version() {
        let map = object(json!({
            "rowKey": "Beta",
            "version": "3",
            "createdBy": "ann",
            "modifiedAt": 1_772_000_000_000_i64,
            "sessionId": "s-2",
            "revenue": 1200.5
        }));

        let record = normalize_record(&map, "sales").unwrap();
        assert_eq!(record.dataset_id, "sales");
        assert_eq!(record.version, 3);
        assert_eq!(record.modified_by, "ann");
        assert_eq!(record.created_at, record.modified_at);
        assert_eq!(record.field("revenue"), Some("1200.5"));
    }

    #[test]
    fn test_unusable_rows_are_dropped() {
        let items = vec![
            json!({"row_key": "Acme", "version": 1}),
            json!({"row_key": "", "version": 1}),
            json!({"row_key": "NoVersion"}),
            json!({"row_key": "Zero", "version": 0}),
            json!({"row_key": "Bad", "version": "two"}),
            json!("not an object"),
        ];

        let normalized = normalize_items(items, "sales");
        assert_eq!(normalized.records.len(), 1);
        assert_eq!(normalized.dropped, 5);
    }

    #[test]
    fn test_null_fields_are_skipped() {
        let map = object(json!({"row_key": "Acme", "version": 1, "comments": null}));
        let record = normalize_record(&map, "sales").unwrap();
        assert!(record.fields.is_empty());
        assert_eq!(record.created_at, DateTime::<Utc>::UNIX_EPOCH);
    }
}
