//! HTTP client for the request proxy.

use crate::launch::poller::{DocumentSource, PollError};
use crate::launch::port::ControlPort;
use crate::server::ResponseEnvelope;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Timeout for a single proxy request.
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 300;

#[derive(Clone)]
pub struct ProxyClient {
    http: Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(port: ControlPort) -> Result<Self, reqwest::Error> {
        Self::with_base_url(format!("http://127.0.0.1:{}", port))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: Client::builder()
                .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.into(),
        })
    }

    /// POST `arguments` to `path` and decode the response envelope, whatever
    /// the status code.
    pub async fn call(
        &self,
        path: &str,
        arguments: Value,
    ) -> Result<ResponseEnvelope, reqwest::Error> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Proxy request");
        let response = self.http.post(&url).json(&arguments).send().await?;
        debug!(status = %response.status(), "Proxy response");
        response.json::<ResponseEnvelope>().await
    }
}

fn poll_error(e: reqwest::Error) -> PollError {
    if e.is_connect() {
        PollError::Transient(e.to_string())
    } else {
        PollError::Fatal(e.to_string())
    }
}

impl DocumentSource for ProxyClient {
    async fn list_documents(&self) -> Result<Vec<String>, PollError> {
        let envelope = self.call("/documents", json!({})).await.map_err(poll_error)?;
        let data = envelope
            .into_result()
            .map_err(|e| PollError::Fatal(format!("/documents: {e}")))?;
        serde_json::from_value(data).map_err(|e| PollError::Fatal(e.to_string()))
    }

    async fn document_path(&self, name: &str) -> Result<Option<String>, PollError> {
        let envelope = self
            .call("/filepath", json!({ "document_name": name }))
            .await
            .map_err(poll_error)?;
        match envelope.into_result() {
            Ok(Value::String(path)) => Ok(Some(path)),
            Ok(_) => Ok(None),
            // The document can vanish or be renamed between list and lookup
            Err(e) => {
                debug!(document = %name, error = %e, "No file path for document");
                Ok(None)
            }
        }
    }
}
