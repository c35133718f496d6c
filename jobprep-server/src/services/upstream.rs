//! Shared plumbing for the external HTTP collaborators
//!
//! Both the signing service and the pipeline service sometimes wrap their
//! JSON in a function-URL envelope (`{"statusCode": 200, "body": "..."}`)
//! and sometimes return the document directly. [`ResponsePayload`] models
//! the two shapes and [`normalize_body`] turns either into the inner JSON
//! object, so nothing above the clients ever sees an envelope.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Failure talking to an external collaborator
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream returned status {0}: {1}")]
    Status(u16, String),

    #[error("Malformed upstream response: {0}")]
    Malformed(String),

    #[error("{0} endpoint is not configured")]
    NotConfigured(&'static str),
}

impl UpstreamError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else {
            UpstreamError::Network(err.to_string())
        }
    }
}

/// Raw response document as received
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// `{"statusCode": .., "body": "<json text>"}`
    EnvelopedBody { status_code: Option<u16>, body: String },
    /// Envelope whose `body` is already an object
    EnvelopedObject { status_code: Option<u16>, body: Value },
    /// The document itself
    DirectBody(Value),
}

impl ResponsePayload {
    pub fn classify(document: Value) -> Self {
        let Value::Object(map) = &document else {
            return ResponsePayload::DirectBody(document);
        };

        let status_code = map
            .get("statusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok());

        match map.get("body") {
            Some(Value::String(body)) => ResponsePayload::EnvelopedBody {
                status_code,
                body: body.clone(),
            },
            Some(body @ Value::Object(_)) => ResponsePayload::EnvelopedObject {
                status_code,
                body: body.clone(),
            },
            _ => ResponsePayload::DirectBody(document),
        }
    }

    /// Unwrap to the inner JSON value
    pub fn into_inner(self) -> Result<Value, UpstreamError> {
        match self {
            ResponsePayload::EnvelopedBody { status_code, body } => {
                check_envelope_status(status_code, &body)?;
                serde_json::from_str(&body)
                    .map_err(|e| UpstreamError::Malformed(format!("envelope body is not JSON: {}", e)))
            }
            ResponsePayload::EnvelopedObject { status_code, body } => {
                check_envelope_status(status_code, &body.to_string())?;
                Ok(body)
            }
            ResponsePayload::DirectBody(value) => Ok(value),
        }
    }
}

fn check_envelope_status(status_code: Option<u16>, body: &str) -> Result<(), UpstreamError> {
    match status_code {
        Some(code) if !(200..300).contains(&code) => Err(UpstreamError::Status(code, body.to_string())),
        _ => Ok(()),
    }
}

/// Parse response text and strip any envelope
pub fn normalize_body(text: &str) -> Result<Value, UpstreamError> {
    let document: Value = serde_json::from_str(text)
        .map_err(|e| UpstreamError::Malformed(format!("response is not JSON: {}", e)))?;
    ResponsePayload::classify(document).into_inner()
}

/// Normalize and deserialize into a typed response
pub fn decode_body<T: DeserializeOwned>(text: &str) -> Result<T, UpstreamError> {
    let value = normalize_body(text)?;
    serde_json::from_value(value).map_err(|e| UpstreamError::Malformed(e.to_string()))
}

/// Thin JSON-over-POST client shared by the collaborator clients
#[derive(Clone)]
pub struct JsonPoster {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl JsonPoster {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("jobprep/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        Ok(Self { http_client, timeout })
    }

    /// POST `payload` as JSON; returns the body text of a 2xx response
    pub async fn post<P: Serialize + ?Sized>(&self, url: &str, payload: &P) -> Result<String, UpstreamError> {
        let response = self
            .http_client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16(), text));
        }

        Ok(text)
    }
}
