//! Normalizer: turns a loosely typed [`RawRecord`] into a [`LogEvent`].
//!
//! Fields are looked up in order: annotations → properties → body (when the
//! body decodes as a JSON object). Key matching ignores ASCII case and accepts
//! a small set of aliases per field, tried in listed order; null or blank
//! values are skipped. `timestamp`, `resourceId` and
//! `operationName` are required; `level` is optional.

use crate::error::NormalizationError;
use crate::types::{LogEvent, RawRecord};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

const TIMESTAMP_KEYS: &[&str] = &[
    "microsoft.azure.monitor.metricValueTimeUTC",
    "time",
    "timestamp",
    "eventTimestamp",
    "TimeGenerated",
];
const RESOURCE_ID_KEYS: &[&str] = &["resourceId"];
const OPERATION_NAME_KEYS: &[&str] = &["operationName"];
const LEVEL_KEYS: &[&str] = &["level"];

const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Normalise one raw record.
///
/// Never panics; every failure is reported as a [`NormalizationError`] so the
/// caller can count and skip the record.
pub fn normalize(record: &RawRecord) -> Result<LogEvent, NormalizationError> {
    let message = decode_body(&record.body);
    let body_fields = parse_body_object(&message);

    let mut layers = vec![&record.annotations, &record.properties];
    if let Some(body) = body_fields.as_ref() {
        layers.push(body);
    }
    let fields = Fields { layers };

    let timestamp = fields.timestamp()?;
    let resource_id = fields.required_string("resourceId", RESOURCE_ID_KEYS)?;
    let operation_name = fields.required_string("operationName", OPERATION_NAME_KEYS)?;
    let level = fields.lookup(LEVEL_KEYS).and_then(level_text);

    Ok(LogEvent {
        timestamp,
        resource_id,
        operation_name,
        level,
        message,
    })
}

struct Fields<'a> {
    layers: Vec<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    /// Usable values for a field, layer by layer and, within a layer, in
    /// alias order. Nulls and blank strings are skipped.
    fn candidates<'s>(
        &'s self,
        aliases: &'s [&'s str],
    ) -> impl Iterator<Item = &'a Value> + 's {
        self.layers.iter().copied().flat_map(move |layer| {
            aliases.iter().filter_map(move |alias| {
                layer
                    .iter()
                    .find(|(key, value)| key.eq_ignore_ascii_case(alias) && is_present(value))
                    .map(|(_, value)| value)
            })
        })
    }

    fn lookup(&self, aliases: &[&str]) -> Option<&'a Value> {
        self.candidates(aliases).next()
    }

    /// First candidate that parses; otherwise the first candidate's error.
    fn timestamp(&self) -> Result<DateTime<Utc>, NormalizationError> {
        let mut first_err = None;
        for value in self.candidates(TIMESTAMP_KEYS) {
            match parse_timestamp(value) {
                Ok(ts) => return Ok(ts),
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        Err(first_err.unwrap_or(NormalizationError::MissingField("timestamp")))
    }

    fn required_string(
        &self,
        field: &'static str,
        aliases: &[&str],
    ) -> Result<String, NormalizationError> {
        match self.lookup(aliases) {
            None => Err(NormalizationError::MissingField(field)),
            Some(Value::String(s)) => Ok(s.trim().to_string()),
            Some(other) => Err(NormalizationError::MalformedField {
                field,
                reason: format!("expected a string, got {}", json_kind(other)),
            }),
        }
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, NormalizationError> {
    let malformed = |reason: String| NormalizationError::MalformedField {
        field: "timestamp",
        reason,
    };

    match value {
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(NormalizationError::MissingField("timestamp"));
            }
            if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
                return Ok(ts.with_timezone(&Utc));
            }
            NAIVE_TIMESTAMP_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|naive| naive.and_utc())
                .ok_or_else(|| malformed(format!("unrecognised timestamp {s:?}")))
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| malformed(format!("epoch milliseconds out of range: {n}"))),
        other => Err(malformed(format!(
            "expected a string or number, got {}",
            json_kind(other)
        ))),
    }
}

fn level_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_body(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .trim_end_matches(|c: char| c == '\r' || c == '\n')
        .to_string()
}

fn parse_body_object(text: &str) -> Option<Map<String, Value>> {
    if !text.trim_start().starts_with('{') {
        return None;
    }
    match serde_json::from_str(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
