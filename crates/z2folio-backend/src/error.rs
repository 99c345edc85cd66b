//! Errors raised by the back-end client.

use thiserror::Error;

/// Errors raised while talking to the back end. Call sites translate these into BIB-1
/// diagnostics (code 1014 for login failures, code 3 for search failures).
#[derive(Debug, Error)]
pub enum BackendError {
    /// The back end rejected the request; the message is the decoded error body (parsed
    /// `errorMessage` if the body is JSON, otherwise the raw body).
    #[error("{0}")]
    Rejected(String),

    /// The request could not be sent, or the response could not be read, at all.
    #[error("back-end request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The back end returned a 2xx response but the body did not parse as expected.
    #[error("back-end response was malformed: {0}")]
    MalformedResponse(String),

    /// The back end's login response did not carry an `X-Okapi-token` header.
    #[error("back-end login response carried no X-Okapi-token header")]
    MissingToken,
}

/// Decodes a back-end HTTP error body: if it begins with `{` it is parsed as JSON and the
/// `errorMessage` field used; otherwise the raw body is used verbatim.
pub(crate) fn decode_error_body(body: &str) -> String {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
            if let Some(message) = value.get("errorMessage").and_then(|v| v.as_str()) {
                return message.to_string();
            }
        }
    }
    body.to_string()
}
