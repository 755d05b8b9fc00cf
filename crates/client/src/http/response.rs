//! Buffered HTTP responses and body parsing helpers

use {
    crate::ClientError,
    ::tracing::{instrument, trace},
    serde::de::DeserializeOwned,
    serde_json::Value,
    std::collections::HashMap,
    tap::TapFallible,
};

/// Some gateways leak raw header blocks in front of the body. The body then
/// starts after the first blank line, so look for `\n\n{` or `\n\n[`.
fn extract_json_from_malformed_response(text: &str) -> Option<&str> {
    for (needle, skip) in [("\n\n{", 2), ("\n\n[", 2), ("\r\n\r\n{", 4), ("\r\n\r\n[", 4)] {
        if let Some(pos) = text.find(needle) {
            return Some(&text[pos + skip..]);
        }
    }
    None
}

/// A fully buffered response: status, lower-cased headers and the raw body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Build a response whose body is the serialized JSON `value`.
    /// `Value::Null` produces an empty body.
    pub fn json_body(status: u16, value: &Value) -> Self {
        let body = match value {
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Self::new(status, body).with_header("content-type", "application/json")
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn has_status(&self, accepted: &[u16]) -> bool {
        accepted.contains(&self.status)
    }

    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Parse the body as JSON, falling back to the payload that follows a
    /// leaked header block when the body does not parse as-is.
    #[instrument(name = "restmap.response.json", skip(self), fields(status = self.status), err)]
    pub fn json(&self) -> Result<Value, ClientError> {
        match serde_json::from_str::<Value>(&self.body) {
            Ok(value) => Ok(value),
            Err(err) => match extract_json_from_malformed_response(&self.body) {
                Some(tail) => {
                    trace!("recovered JSON payload from malformed response body");
                    Ok(serde_json::from_str(tail)?)
                }
                None => Err(err.into()),
            },
        }
        .tap_err(|e| {
            tracing::error!(
                "failed to parse response body as JSON ({}): {}",
                e,
                truncate(&self.body, 200)
            )
        })
    }

    /// Parse the body into `T`.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_value(self.json()?)?)
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_plain_json_body() {
        let response = ApiResponse::new(200, r#"{"id": 1}"#);
        assert_eq!(response.json().unwrap(), json!({"id": 1}));
    }

    #[test]
    fn recovers_json_after_leaked_headers() {
        let body = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n[{\"id\": 1}]";
        let response = ApiResponse::new(200, body);
        assert_eq!(response.json().unwrap(), json!([{"id": 1}]));
    }

    #[test]
    fn reports_undecodable_body() {
        let response = ApiResponse::new(200, "<html>oops</html>");
        assert!(matches!(response.json(), Err(ClientError::Serde(_))));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = ApiResponse::new(204, "").with_header("X-Request-Id", "abc");
        assert_eq!(response.header("x-request-id"), Some("abc"));
        assert!(response.is_empty());
        assert!(response.has_status(&[204]));
    }

    #[test]
    fn null_json_body_is_empty() {
        let response = ApiResponse::json_body(204, &Value::Null);
        assert!(response.is_empty());
        assert_eq!(response.header("content-type"), Some("application/json"));
    }
}
