//! HTTP GET seam used by the [`Client`](crate::client::Client).

use std::time::Duration;

use thiserror::Error;

use crate::error::ApiError;

/// Status and body of one HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpReply {
            status,
            body: body.into(),
        }
    }
}

/// The request never produced a status (refused, timed out, reset, body cut short).
#[derive(Debug, Error)]
#[error("transport failure: {0}")]
pub struct TransportFailure(pub String);

/// Something that can issue a blocking HTTP GET.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpReply, TransportFailure>;
}

/// [`Transport`] over a blocking `reqwest` client. Connections are kept alive between calls.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpReply, TransportFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportFailure(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| TransportFailure(e.to_string()))?;
        Ok(HttpReply { status, body })
    }
}
