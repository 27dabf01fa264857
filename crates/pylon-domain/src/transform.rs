use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DomainError, DomainResult};

const DATUM_FIELD: &str = "datum";

/// How the raw datum timestamp is written into the outbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampMode {
    /// Copy the raw element verbatim.
    Raw,
    /// Interpret the raw element as epoch milliseconds and render it as an
    /// ISO 8601 UTC string.
    Iso8601,
}

/// Field names and timestamp rendering for datum normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizePolicy {
    pub timestamp_mode: TimestampMode,
    pub timestamp_field: String,
    pub value_field: String,
}

impl Default for NormalizePolicy {
    fn default() -> Self {
        Self {
            timestamp_mode: TimestampMode::Iso8601,
            timestamp_field: "timestamp_iso8601".to_string(),
            value_field: "sensor_value".to_string(),
        }
    }
}

/// Normalize a raw gateway payload before forwarding.
///
/// Payloads without a `datum` field pass through byte-for-byte. Payloads
/// with `datum = [timestamp, value]` gain the policy's timestamp and value
/// fields, appended after the existing keys. The transform refuses to
/// overwrite fields that already exist. Callers are expected to fall back
/// to the original bytes on error.
pub fn normalize_datum(payload: &[u8], policy: &NormalizePolicy) -> DomainResult<Vec<u8>> {
    let parsed: Value = serde_json::from_slice(payload)
        .map_err(|e| DomainError::MalformedPayload(e.to_string()))?;

    let mut object = match parsed {
        Value::Object(map) => map,
        other => {
            return Err(DomainError::MalformedPayload(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    let (timestamp, value) = {
        let datum = match object.get(DATUM_FIELD) {
            Some(datum) => datum,
            None => return Ok(payload.to_vec()),
        };

        if object.contains_key(&policy.timestamp_field) {
            return Err(DomainError::FieldCollision(policy.timestamp_field.clone()));
        }
        if object.contains_key(&policy.value_field) {
            return Err(DomainError::FieldCollision(policy.value_field.clone()));
        }

        let elements = datum.as_array().ok_or_else(|| {
            DomainError::MalformedPayload(format!(
                "datum must be an array, got {}",
                json_type_name(datum)
            ))
        })?;
        if elements.len() != 2 {
            return Err(DomainError::MalformedPayload(format!(
                "datum must hold [timestamp, value], got {} elements",
                elements.len()
            )));
        }

        let timestamp = match policy.timestamp_mode {
            TimestampMode::Raw => elements[0].clone(),
            TimestampMode::Iso8601 => Value::String(millis_to_iso8601(&elements[0])?),
        };

        (timestamp, elements[1].clone())
    };

    object.insert(policy.timestamp_field.clone(), timestamp);
    object.insert(policy.value_field.clone(), value);

    serde_json::to_vec(&object)
        .map_err(|e| DomainError::MalformedPayload(format!("failed to re-serialize: {e}")))
}

/// Split epoch milliseconds into whole seconds plus a nanosecond remainder
/// and render the result as an ISO 8601 UTC string.
fn millis_to_iso8601(raw: &Value) -> DomainResult<String> {
    let millis = raw.as_f64().ok_or_else(|| {
        DomainError::MalformedPayload(format!(
            "datum timestamp must be a number, got {}",
            json_type_name(raw)
        ))
    })?;

    let seconds = (millis / 1000.0).floor();
    let nanos = ((millis - seconds * 1000.0) * 1_000_000.0) as u32;

    let timestamp = DateTime::<Utc>::from_timestamp(seconds as i64, nanos).ok_or_else(|| {
        DomainError::MalformedPayload(format!("datum timestamp {millis} is out of range"))
    })?;

    Ok(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_policy() -> NormalizePolicy {
        NormalizePolicy {
            timestamp_mode: TimestampMode::Raw,
            timestamp_field: "timestamp".to_string(),
            value_field: "value".to_string(),
        }
    }

    #[test]
    fn payload_without_datum_passes_through_unchanged() {
        // Odd spacing on purpose: pass-through must not re-serialize.
        let payload = br#"{ "temperature": 21.5 , "unit": "C" }"#;

        let normalized = normalize_datum(payload, &raw_policy()).unwrap();

        assert_eq!(normalized, payload);
    }

    #[test]
    fn datum_is_expanded_verbatim_under_the_raw_policy() {
        let normalized = normalize_datum(br#"{"datum":[1000,42.5]}"#, &raw_policy()).unwrap();

        assert_eq!(
            normalized,
            br#"{"datum":[1000,42.5],"timestamp":1000,"value":42.5}"#
        );
    }

    #[test]
    fn datum_timestamp_is_rendered_iso8601_under_the_calendar_policy() {
        let normalized =
            normalize_datum(br#"{"datum":[1700000000123,7]}"#, &NormalizePolicy::default())
                .unwrap();

        let parsed: Value = serde_json::from_slice(&normalized).unwrap();
        assert_eq!(parsed["timestamp_iso8601"], "2023-11-14T22:13:20.123Z");
        assert_eq!(parsed["sensor_value"], 7);
        assert_eq!(parsed["datum"], json!([1700000000123i64, 7]));
    }

    #[test]
    fn sub_second_millis_become_nanoseconds() {
        let normalized =
            normalize_datum(br#"{"datum":[1500.5,1]}"#, &NormalizePolicy::default()).unwrap();

        let parsed: Value = serde_json::from_slice(&normalized).unwrap();
        assert_eq!(parsed["timestamp_iso8601"], "1970-01-01T00:00:01.500Z");
    }

    #[test]
    fn existing_timestamp_field_is_a_collision() {
        let payload = br#"{"datum":[1000,42.5],"timestamp":0}"#;

        let err = normalize_datum(payload, &raw_policy()).unwrap_err();

        assert!(matches!(err, DomainError::FieldCollision(field) if field == "timestamp"));
    }

    #[test]
    fn existing_value_field_is_a_collision() {
        let payload = br#"{"datum":[1000,42.5],"value":1}"#;

        let err = normalize_datum(payload, &raw_policy()).unwrap_err();

        assert!(matches!(err, DomainError::FieldCollision(field) if field == "value"));
    }

    #[test]
    fn collision_checks_use_the_configured_field_names() {
        let payload = br#"{"datum":[1000,42.5],"sensor_value":1}"#;

        let err = normalize_datum(payload, &NormalizePolicy::default()).unwrap_err();

        assert!(matches!(err, DomainError::FieldCollision(field) if field == "sensor_value"));
    }

    #[test]
    fn non_json_payload_is_malformed() {
        let err = normalize_datum(b"not json", &raw_policy()).unwrap_err();

        assert!(matches!(err, DomainError::MalformedPayload(_)));
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let err = normalize_datum(b"[1,2,3]", &raw_policy()).unwrap_err();

        assert!(matches!(err, DomainError::MalformedPayload(_)));
    }

    #[test]
    fn datum_with_wrong_arity_is_malformed() {
        let err = normalize_datum(br#"{"datum":[1000]}"#, &raw_policy()).unwrap_err();

        assert!(matches!(err, DomainError::MalformedPayload(_)));
    }

    #[test]
    fn non_array_datum_is_malformed() {
        let err = normalize_datum(br#"{"datum":5}"#, &raw_policy()).unwrap_err();

        assert!(matches!(err, DomainError::MalformedPayload(_)));
    }

    #[test]
    fn non_numeric_timestamp_is_malformed_under_the_calendar_policy() {
        let err = normalize_datum(br#"{"datum":["soon",1]}"#, &NormalizePolicy::default())
            .unwrap_err();

        assert!(matches!(err, DomainError::MalformedPayload(_)));
    }

    #[test]
    fn non_numeric_timestamp_is_kept_under_the_raw_policy() {
        let normalized = normalize_datum(br#"{"datum":["soon",1]}"#, &raw_policy()).unwrap();

        let parsed: Value = serde_json::from_slice(&normalized).unwrap();
        assert_eq!(parsed["timestamp"], "soon");
        assert_eq!(parsed["value"], 1);
    }
}
