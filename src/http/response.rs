use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::http::error::ExecutorError;

/// A successful response, returned to the caller uninterpreted.
///
/// `body` holds the parsed JSON document, or the raw text as a JSON string
/// when the payload was not JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Value) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub(crate) fn body_from_bytes(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ExecutorError> {
        serde_json::from_value(self.body.clone())
            .map_err(|err| ExecutorError::Decode(err.to_string()))
    }

    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.body.pointer(pointer).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use reqwest::header::HeaderMap;
    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::HttpResponse;
    use crate::http::error::ExecutorError;

    #[test]
    fn body_from_bytes_parses_json_or_keeps_text() {
        assert_eq!(
            HttpResponse::body_from_bytes(br#"{"text":"hi"}"#),
            json!({ "text": "hi" })
        );
        assert_eq!(
            HttpResponse::body_from_bytes(b"plain words"),
            Value::String("plain words".to_string())
        );
    }

    #[test]
    fn str_at_follows_json_pointer() {
        let response = HttpResponse::new(
            StatusCode::OK,
            HeaderMap::new(),
            json!({ "choices": [{ "text": " ok " }] }),
        );
        assert_eq!(response.str_at("/choices/0/text"), Some(" ok "));
        assert_eq!(response.str_at("/choices/1/text"), None);
    }

    #[test]
    fn json_reports_decode_errors() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Fact {
            text: String,
        }

        let response = HttpResponse::new(StatusCode::OK, HeaderMap::new(), json!({ "id": 1 }));
        let err = response.json::<Fact>().expect_err("missing field should fail");
        assert!(matches!(err, ExecutorError::Decode(_)));
    }
}
