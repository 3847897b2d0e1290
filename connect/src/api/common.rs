//! Common types and utilities for the Connect API

use serde::Deserialize;

/// Error body returned by the Connect control plane
///
/// Services disagree on the casing of `message`, so both spellings are read.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(rename = "__type")]
    pub error_type: Option<String>,
    #[serde(alias = "Message")]
    pub message: Option<String>,
}

#[derive(Debug, thiserror::Error)]
#[error("API error details: code={code:?}, message={message:?}")]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ApiErrorDetails {
    /// Builds details from the `x-amzn-ErrorType` header and the response body.
    /// The header wins over `__type`; both may carry a `:`-suffixed URL that is
    /// not part of the code.
    pub fn from_response(header_code: Option<&str>, body: &str) -> Option<Self> {
        let parsed = serde_json::from_str::<ApiErrorResponse>(body).ok();

        let code = header_code
            .map(str::to_string)
            .or_else(|| parsed.as_ref().and_then(|p| p.error_type.clone()))
            .map(|code| normalize_error_code(&code));
        let message = parsed.and_then(|p| p.message);

        if code.is_none() && message.is_none() {
            return None;
        }

        Some(Self { code, message })
    }
}

/// `aws.protocol#ResourceNotFoundException:http://...` -> `ResourceNotFoundException`
fn normalize_error_code(raw: &str) -> String {
    let code = raw.split(':').next().unwrap_or(raw);
    code.rsplit('#').next().unwrap_or(code).to_string()
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}
