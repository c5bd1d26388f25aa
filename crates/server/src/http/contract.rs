//! Request and response bodies of the HTTP API.
//!
//! Validation errors use the `{"detail": [{"loc", "msg", "type"}]}` shape so
//! existing clients keep parsing them.

use assist_knowledge::AnswerResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /assist`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistRequest {
    pub query: String,
}

/// Successful answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistResponse {
    pub text: String,
    pub links: Vec<String>,
}

impl From<AnswerResult> for AssistResponse {
    fn from(answer: AnswerResult) -> Self {
        Self {
            text: answer.text,
            links: answer.links,
        }
    }
}

/// One validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationErrorDetail {
    /// Path to the offending value, starting at `"body"`
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub error_type: String,
}

impl ValidationErrorDetail {
    fn new(loc: &[&str], msg: &str, error_type: &str) -> Self {
        Self {
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.to_string(),
            error_type: error_type.to_string(),
        }
    }
}

/// Body of a 422 response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpValidationError {
    pub detail: Vec<ValidationErrorDetail>,
}

impl HttpValidationError {
    fn single(loc: &[&str], msg: &str, error_type: &str) -> Self {
        Self {
            detail: vec![ValidationErrorDetail::new(loc, msg, error_type)],
        }
    }
}

/// Validate a raw request body. Unknown fields are ignored.
pub fn parse_request(body: &[u8]) -> Result<AssistRequest, HttpValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(HttpValidationError::single(
            &["body"],
            "Field required",
            "missing",
        ));
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        HttpValidationError::single(&["body"], "JSON decode error", "json_invalid")
    })?;

    let object = value.as_object().ok_or_else(|| {
        HttpValidationError::single(
            &["body"],
            "Input should be a valid dictionary or object to extract fields from",
            "model_attributes_type",
        )
    })?;

    match object.get("query") {
        None => Err(HttpValidationError::single(
            &["body", "query"],
            "Field required",
            "missing",
        )),
        Some(Value::String(query)) => Ok(AssistRequest {
            query: query.clone(),
        }),
        Some(_) => Err(HttpValidationError::single(
            &["body", "query"],
            "Input should be a valid string",
            "string_type",
        )),
    }
}
