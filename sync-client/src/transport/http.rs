//! Plain HTTP transport over reqwest.

use super::{Transport, TransportError};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use vaultsync_types::{ChangeRecord, ErrorBody, FileRecord};

/// HTTP transport to a listening peer.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Mutex<Option<String>>,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        Ok(Self {
            client,
            base_url: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> Result<String, TransportError> {
        let base = self.base_url.lock().unwrap();
        base.as_ref()
            .map(|b| format!("{}{}", b, path))
            .ok_or(TransportError::NotConnected)
    }
}

fn map_request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::ConnectionFailed(e.to_string())
    } else {
        TransportError::SendFailed(e.to_string())
    }
}

async fn error_status(response: reqwest::Response) -> TransportError {
    let status = response.status().as_u16();
    let body = response.bytes().await.unwrap_or_default();
    match serde_json::from_slice::<ErrorBody>(&body) {
        Ok(err) => TransportError::Status {
            status,
            message: err.error,
            failed: err.failed,
        },
        Err(_) => TransportError::Status {
            status,
            message: String::from_utf8_lossy(&body).into_owned(),
            failed: Vec::new(),
        },
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn connect(&self, addr: SocketAddr) -> Result<(), TransportError> {
        let base = format!("http://{}", addr);
        let response = self
            .client
            .get(format!("{}/health", base))
            .send()
            .await
            .map_err(|e| match map_request_error(e) {
                TransportError::SendFailed(msg) => TransportError::ConnectionFailed(msg),
                other => other,
            })?;

        if !response.status().is_success() {
            return Err(error_status(response).await);
        }

        debug!(peer = %addr, "Connected");
        *self.base_url.lock().unwrap() = Some(base);
        Ok(())
    }

    async fn fetch(&self) -> Result<Vec<FileRecord>, TransportError> {
        let url = self.url("/hashes")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(error_status(response).await);
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::ReceiveFailed(e.to_string())
            }
        })?;
        serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
    }

    async fn send_changes(&self, changes: &[ChangeRecord]) -> Result<(), TransportError> {
        let url = self.url("/changes")?;
        let body =
            serde_json::to_vec(changes).map_err(|e| TransportError::SendFailed(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(error_status(response).await);
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.base_url.lock().unwrap().is_some()
    }

    async fn close(&self) -> Result<(), TransportError> {
        *self.base_url.lock().unwrap() = None;
        Ok(())
    }
}
