//! The authenticated JSON/HTTP client itself.

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::{decode_error_body, BackendError};

const TOKEN_HEADER: &str = "X-Okapi-token";
const TENANT_HEADER: &str = "X-Okapi-tenant";

/// Result of a back-end search call.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "totalRecords")]
    pub total_records: u64,
    #[serde(default)]
    pub instances: Vec<JsonValue>,
}

/// Authenticated JSON/HTTP client for the back end.
///
/// Holds no per-session secrets itself: the session owns the token obtained from
/// [`BackendClient::login`], so its `Debug` impl is the derived one. Nothing here needs
/// redaction the way a client that cached a token would; the session itself redacts its
/// token and password in its own `Debug` impl.
#[derive(Debug, Clone, Default)]
pub struct BackendClient {
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// `POST {base}/bl-users/login`. Returns the back end's session token, read from the
    /// `X-Okapi-token` response header.
    pub async fn login(
        &self,
        base_url: &str,
        tenant: &str,
        username: &str,
        password: &str,
    ) -> Result<String, BackendError> {
        tracing::debug!(tenant, username, base_url, "logging in to back end");

        let response = self
            .http
            .post(format!("{base_url}/bl-users/login"))
            .header(TENANT_HEADER, tenant)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected(decode_error_body(&body)));
        }

        response
            .headers()
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or(BackendError::MissingToken)
    }

    /// `GET {base}/inventory/instances?offset=...&limit=...&query=...`.
    /// `token` is omitted from the request entirely iff no token is held.
    pub async fn search(
        &self,
        base_url: &str,
        tenant: &str,
        token: Option<&str>,
        cql: &str,
        offset: u32,
        limit: u32,
    ) -> Result<SearchResult, BackendError> {
        tracing::debug!(tenant, offset, limit, cql, "searching back end");

        let mut request = self
            .http
            .get(format!("{base_url}/inventory/instances"))
            .header(TENANT_HEADER, tenant)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("offset", offset.to_string()), ("limit", limit.to_string())])
            .query(&[("query", cql)]);

        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected(decode_error_body(&body)));
        }

        response
            .json::<SearchResult>()
            .await
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))
    }
}
