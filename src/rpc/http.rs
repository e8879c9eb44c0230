//! HTTP transport: `POST <base>/api/method/<method>` with a JSON body.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::error::{RpcError, RpcResult};
use super::protocol::ResponseEnvelope;
use super::transport::Transport;
use crate::config::ServerSettings;

/// Talks to the report server's whitelisted method endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    authorization: Option<String>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> RpcResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(RpcError::InvalidConfig("server.base_url is empty".into()));
        }
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url,
            authorization: None,
        })
    }

    pub fn from_settings(settings: &ServerSettings) -> RpcResult<Self> {
        let mut transport = Self::new(
            settings.base_url.clone(),
            Duration::from_secs(settings.timeout_secs),
        )?;
        if let (Some(key), Some(secret)) = (&settings.api_key, &settings.api_secret) {
            transport = transport.with_token(key, secret);
        }
        Ok(transport)
    }

    /// Authenticate with an API key pair.
    pub fn with_token(mut self, key: &str, secret: &str) -> Self {
        self.authorization = Some(format!("token {key}:{secret}"));
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/api/method/{}", self.base_url, method)
    }
}

/// The server wraps return values in `{"message": ...}`; unwrap it when it
/// holds the envelope.
fn unwrap_message(body: Value) -> Value {
    match body {
        Value::Object(mut map) if !map.contains_key("success") => match map.remove("message") {
            Some(inner @ Value::Object(_)) => inner,
            Some(other) => {
                map.insert("message".to_string(), other);
                Value::Object(map)
            }
            None => Value::Object(map),
        },
        other => other,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> RpcResult<ResponseEnvelope> {
        let url = self.endpoint(method);
        tracing::debug!(%url, "calling report server");

        let mut request = self.client.post(&url).json(&params);
        if let Some(auth) = &self.authorization {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "report server rejected call");
            return Err(RpcError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = resp.json().await?;
        serde_json::from_value(unwrap_message(body)).map_err(RpcError::DeserializeFailed)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
