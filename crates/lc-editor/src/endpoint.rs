//! Server-side generate endpoint, independent of any HTTP framework.
//!
//! [`handle_generate`] takes the request method and body, calls the model
//! backend through [`Backend`], and returns a status plus body. The host
//! (a serverless function, a test) only moves bytes.

use crate::config::BackendConfig;
use crate::generate::{GenerateError, Generator};
use lc_core::prompt::SYSTEM_PROMPT;
use lc_core::{GenerationRequest, compose};
use serde_json::{Value, json};
use thiserror::Error;

pub const MISSING_API_KEY: &str = "API key is not configured.";

/// Raw reply from the model backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamReply {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

/// Outbound HTTP capability used by the endpoint.
pub trait Backend {
    /// POST `payload` as JSON to `url`. `Err` means no reply was received.
    fn post_json(&self, url: &str, api_key: &str, payload: &Value) -> Result<UpstreamReply, String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Invalid request: {0}")]
    InvalidBody(String),
    #[error("Prompt is required.")]
    MissingPrompt,
    #[error("{}", MISSING_API_KEY)]
    MissingApiKey,
    #[error("Google API Error: {status_text}")]
    Upstream { status: u16, status_text: String },
    #[error("Received an empty response from the AI.")]
    EmptyReply,
    #[error("{0}")]
    Internal(String),
}

impl EndpointError {
    pub fn status(&self) -> u16 {
        match self {
            EndpointError::MethodNotAllowed => 405,
            EndpointError::InvalidBody(_) | EndpointError::MissingPrompt => 400,
            EndpointError::Upstream { status, .. } => *status,
            EndpointError::MissingApiKey
            | EndpointError::EmptyReply
            | EndpointError::Internal(_) => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl From<EndpointError> for EndpointResponse {
    fn from(e: EndpointError) -> Self {
        Self {
            status: e.status(),
            content_type: "application/json",
            body: json!({ "error": e.to_string() }).to_string(),
        }
    }
}

/// Handle one call to the generate endpoint.
///
/// A body that is not JSON, or names an unknown style preset, is a client
/// error (400) rather than falling through to the generic 500. `maxLayers`
/// and `maxColors` of `0` or `null` mean no limit.
pub fn handle_generate(
    method: &str,
    body: &str,
    config: &BackendConfig,
    backend: &dyn Backend,
) -> EndpointResponse {
    let result = parse_request(method, body).and_then(|req| generate_text(&req, config, backend));
    match result {
        Ok(text) => EndpointResponse {
            status: 200,
            content_type: "application/json",
            body: text,
        },
        Err(e) => {
            log::error!("generate endpoint failed ({}): {e}", e.status());
            e.into()
        }
    }
}

fn parse_request(method: &str, body: &str) -> Result<GenerationRequest, EndpointError> {
    if !method.eq_ignore_ascii_case("POST") {
        return Err(EndpointError::MethodNotAllowed);
    }
    let value: Value =
        serde_json::from_str(body).map_err(|e| EndpointError::InvalidBody(e.to_string()))?;
    match value.get("prompt") {
        Some(Value::String(p)) if !p.trim().is_empty() => {}
        _ => return Err(EndpointError::MissingPrompt),
    }
    serde_json::from_value(value).map_err(|e| EndpointError::InvalidBody(e.to_string()))
}

/// Backend payload for `req`.
pub fn backend_payload(req: &GenerationRequest) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": compose(req) }] }],
        "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
        "generationConfig": { "responseMimeType": "application/json" },
    })
}

/// Compose, call the backend, and extract the design text.
pub fn generate_text(
    req: &GenerationRequest,
    config: &BackendConfig,
    backend: &dyn Backend,
) -> Result<String, EndpointError> {
    if !req.has_prompt() {
        return Err(EndpointError::MissingPrompt);
    }
    let api_key = config.api_key.as_deref().ok_or(EndpointError::MissingApiKey)?;

    let reply = backend
        .post_json(&config.generate_url(), api_key, &backend_payload(req))
        .map_err(EndpointError::Internal)?;
    if !(200..300).contains(&reply.status) {
        log::error!("upstream replied {}: {}", reply.status, reply.body);
        return Err(EndpointError::Upstream {
            status: reply.status,
            status_text: reply.status_text,
        });
    }

    let result: Value =
        serde_json::from_str(&reply.body).map_err(|e| EndpointError::Internal(e.to_string()))?;
    let text = result
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or(EndpointError::EmptyReply)?;
    Ok(text.to_string())
}

/// In-process [`Generator`] that runs the endpoint logic directly.
pub struct EndpointGenerator<'a> {
    pub config: &'a BackendConfig,
    pub backend: &'a dyn Backend,
}

impl Generator for EndpointGenerator<'_> {
    fn generate(&mut self, request: &GenerationRequest) -> Result<String, GenerateError> {
        generate_text(request, self.config, self.backend).map_err(|e| match e {
            EndpointError::MissingPrompt | EndpointError::InvalidBody(_) => {
                GenerateError::Input(e.to_string())
            }
            EndpointError::MissingApiKey => GenerateError::Config(e.to_string()),
            _ => GenerateError::Upstream {
                status: e.status(),
                message: e.to_string(),
            },
        })
    }
}
