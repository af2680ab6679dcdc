use crate::config::DnsApiConfig;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Request parameters sent alongside the token
pub type Params = Vec<(&'static str, String)>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DnsApiError {
    #[error("Request timeout: DNS server did not respond within {0} seconds")]
    Timeout(u64),
    #[error("Connection failed: Cannot connect to DNS server at {0}")]
    Connection(String),
    #[error("HTTP error: Server returned {0}")]
    Http(u16),
    #[error("DNS server error: {0}")]
    Server(String),
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl DnsApiError {
    /// Category shown to the model in the `error` field
    pub fn label(&self) -> &'static str {
        match self {
            DnsApiError::Timeout(_) => "Request timeout",
            DnsApiError::Connection(_) => "Connection failed",
            DnsApiError::Http(_) => "HTTP error",
            DnsApiError::Server(_) => "DNS server error",
            DnsApiError::Unexpected(_) => "Unexpected error",
        }
    }

    /// Human-readable explanation for the `details` field
    pub fn details(&self) -> String {
        match self {
            DnsApiError::Timeout(secs) => {
                format!("DNS server did not respond within {} seconds", secs)
            }
            DnsApiError::Connection(url) => format!("Cannot connect to DNS server at {}", url),
            DnsApiError::Http(status) => format!("Server returned {}", status),
            DnsApiError::Server(message) => message.clone(),
            DnsApiError::Unexpected(message) => message.clone(),
        }
    }
}

/// Envelope every management API endpoint answers with
#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    response: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
}

impl ApiResponse {
    fn error_text(self) -> String {
        self.error
            .or(self.error_message)
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// HTTP transport for the DNS management API.
///
/// Adds the token to every call and folds transport, HTTP and application
/// failures into [`DnsApiError`]. Successful calls yield the `response` payload.
pub struct DnsApi {
    client: Client,
    config: DnsApiConfig,
}

impl DnsApi {
    pub fn new(config: DnsApiConfig) -> Result<Self, DnsApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DnsApiError::Unexpected(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &DnsApiConfig {
        &self.config
    }

    /// GET with the token as a query parameter
    pub async fn get(&self, path: &str, params: &[(&'static str, String)]) -> Result<Value, DnsApiError> {
        log::debug!("DNS API GET {} {:?}", path, params);

        let result = self
            .client
            .get(self.config.endpoint(path))
            .query(&[("token", self.config.token())])
            .query(params)
            .send()
            .await;

        self.finish(result).await
    }

    /// POST with the token as a form field
    pub async fn post(&self, path: &str, form: &[(&'static str, String)]) -> Result<Value, DnsApiError> {
        log::debug!("DNS API POST {} {:?}", path, form);

        let mut fields: Vec<(&str, &str)> = Vec::with_capacity(form.len() + 1);
        fields.push(("token", self.config.token()));
        fields.extend(form.iter().map(|(key, value)| (*key, value.as_str())));

        let result = self
            .client
            .post(self.config.endpoint(path))
            .form(&fields)
            .send()
            .await;

        self.finish(result).await
    }

    async fn finish(&self, result: reqwest::Result<Response>) -> Result<Value, DnsApiError> {
        let response = result.map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("DNS API returned HTTP {}", status);
            return Err(DnsApiError::Http(status.as_u16()));
        }

        let body: ApiResponse = response.json().await.map_err(|e| self.classify(e))?;
        if body.status == "ok" {
            Ok(body.response.unwrap_or(Value::Null))
        } else {
            let message = body.error_text();
            log::warn!("DNS server reported an error: {}", message);
            Err(DnsApiError::Server(message))
        }
    }

    fn classify(&self, err: reqwest::Error) -> DnsApiError {
        if err.is_timeout() {
            DnsApiError::Timeout(self.config.timeout.as_secs())
        } else if err.is_connect() {
            DnsApiError::Connection(self.config.server_url().to_string())
        } else if let Some(status) = err.status() {
            DnsApiError::Http(status.as_u16())
        } else {
            DnsApiError::Unexpected(err.to_string())
        }
    }
}
