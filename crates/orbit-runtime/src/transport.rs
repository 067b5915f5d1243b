//! HTTP transport that performs one plan step. No retries.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use orbit_core::truncate_for_error;
use orbit_plan::{HttpMethod, Instruction};
use thiserror::Error;

const ERROR_BODY_LIMIT: usize = 800;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{method} {url} failed with status {status} {reason}")]
    Status {
        method: String,
        url: String,
        status: u16,
        reason: String,
        body: String,
    },
    #[error("{method} {url} request failed: {detail}")]
    Request {
        method: String,
        url: String,
        detail: String,
    },
    #[error("credential '{reference}' is unavailable: {detail}")]
    Credential { reference: String, detail: String },
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw response body, when the server sent one.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } if !body.trim().is_empty() => Some(body),
            _ => None,
        }
    }

    /// Short text used as the error part of a chat report.
    pub fn summary(&self) -> String {
        match self {
            Self::Status { status, reason, .. } => format!("{status} {reason}").trim().to_string(),
            Self::Request { detail, .. } => detail.clone(),
            Self::Credential { reference, detail } => format!("{reference}: {detail}"),
        }
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform `instruction`, authenticating with `secret` when given.
    async fn perform(
        &self,
        instruction: &Instruction,
        secret: Option<&str>,
    ) -> Result<HttpResponse, TransportError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(request_timeout_ms: u64) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("orbit-chatops"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create http transport client")?;
        Ok(Self { http })
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn perform(
        &self,
        instruction: &Instruction,
        secret: Option<&str>,
    ) -> Result<HttpResponse, TransportError> {
        let method = instruction.method.as_str().to_string();
        let url = instruction.url.clone();
        let mut request = self
            .http
            .request(Self::method(instruction.method), &instruction.url);
        for (name, value) in &instruction.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(secret) = secret {
            request = request.header(reqwest::header::AUTHORIZATION, format!("token {secret}"));
        }
        if let Some(body) = &instruction.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|error| TransportError::Request {
                method: method.clone(),
                url: url.clone(),
                detail: error.to_string(),
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| TransportError::Request {
                method: method.clone(),
                url: url.clone(),
                detail: format!("failed to read response body: {error}"),
            })?;
        if !status.is_success() {
            return Err(TransportError::Status {
                method,
                url,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                body: truncate_for_error(&body, ERROR_BODY_LIMIT),
            });
        }
        Ok(HttpResponse {
            status: status.as_u16(),
            body,
        })
    }
}
