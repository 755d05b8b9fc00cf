//! Turning response bodies into flat lists of records.

use {
    restmap_client::{ApiResponse, ClientError},
    serde_json::{Map, Value},
    std::fmt,
    tracing::trace,
};

/// One decoded resource: attribute name to raw JSON value, in wire order.
pub type Record = Map<String, Value>;

pub const DEFAULT_ACCEPTED_STATUS: &[u16] = &[200];

pub trait ResponseDecoder: Send + Sync + fmt::Debug {
    /// Decode `response` into records. A status outside `accepted` yields an
    /// empty list, not an error; only a body that is not JSON fails.
    fn decode(&self, response: &ApiResponse, accepted: &[u16]) -> Result<Vec<Record>, ClientError>;

    /// The first record, or an empty one.
    fn object(&self, records: &[Record]) -> Record {
        records.first().cloned().unwrap_or_default()
    }
}

/// Decoder for plain JSON bodies: a record, a list of records, or either of
/// those wrapped in a `data` envelope.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl ResponseDecoder for JsonDecoder {
    fn decode(&self, response: &ApiResponse, accepted: &[u16]) -> Result<Vec<Record>, ClientError> {
        if !response.has_status(accepted) {
            trace!(
                "ignoring body of status {} (accepted {:?})",
                response.status(),
                accepted
            );
            return Ok(Vec::new());
        }
        if response.is_empty() {
            return Ok(Vec::new());
        }
        Ok(flatten_records(response.json()?))
    }
}

/// Normalize decoded JSON into a list of records.
///
/// A `data` member holding an object or array is unwrapped first. A single
/// record becomes a one-element list, an empty object an empty list, and
/// anything that is not a record is dropped.
pub fn flatten_records(value: Value) -> Vec<Record> {
    let value = match value {
        Value::Object(mut map) if matches!(map.get("data"), Some(Value::Object(_) | Value::Array(_))) => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    };

    match value {
        Value::Object(map) if map.is_empty() => Vec::new(),
        Value::Object(map) => vec![map],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                other => {
                    trace!("skipping non-record list item: {}", other);
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn records(value: Value) -> Vec<Value> {
        flatten_records(value).into_iter().map(Value::Object).collect()
    }

    #[test]
    fn unwraps_data_envelope() {
        assert_eq!(
            records(json!({"data": [{"id": 1}, {"id": 2}], "meta": {"total": 2}})),
            vec![json!({"id": 1}), json!({"id": 2})]
        );
        assert_eq!(records(json!({"data": {"id": 1}})), vec![json!({"id": 1})]);
    }

    #[test]
    fn single_record_becomes_list() {
        assert_eq!(records(json!({"id": 1, "name": "x"})), vec![json!({"id": 1, "name": "x"})]);
    }

    #[test]
    fn scalar_data_member_is_an_attribute() {
        assert_eq!(records(json!({"id": 1, "data": "blob"})), vec![json!({"id": 1, "data": "blob"})]);
    }

    #[test]
    fn empty_shapes_yield_nothing() {
        assert!(records(json!({})).is_empty());
        assert!(records(json!({"data": []})).is_empty());
        assert!(records(json!({"data": {}})).is_empty());
        assert!(records(json!("text")).is_empty());
    }

    #[test]
    fn status_outside_accepted_set_is_empty() {
        let response = ApiResponse::new(404, r#"{"error": "missing"}"#);
        assert!(JsonDecoder.decode(&response, DEFAULT_ACCEPTED_STATUS).unwrap().is_empty());
    }

    #[test]
    fn object_takes_first_record() {
        let response = ApiResponse::new(200, r#"[{"id": 1}, {"id": 2}]"#);
        let decoded = JsonDecoder.decode(&response, &[200]).unwrap();
        assert_eq!(Value::Object(JsonDecoder.object(&decoded)), json!({"id": 1}));
        assert!(JsonDecoder.object(&[]).is_empty());
    }
}
