//! Byte transfers against storage node URLs
//!
//! The tracker only hands out URLs; moving the bytes is somebody else's job.
//! [`Transfer`] is that seam, and [`HttpTransfer`] is the `reqwest` backed
//! implementation used outside of tests.

use crate::common::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

pub use reqwest::Method;

/// Request body: fully buffered, or streamed from a reader
pub enum TransferBody {
    Bytes(Bytes),
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

impl fmt::Debug for TransferBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            TransferBody::Stream(_) => write!(f, "Stream"),
        }
    }
}

#[derive(Debug)]
pub struct TransferRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<TransferBody>,
}

impl TransferRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn put(url: impl Into<String>, body: TransferBody) -> Self {
        Self {
            url: url.into(),
            method: Method::PUT,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.headers.push((name.into(), value.to_string()));
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct TransferResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransferResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}

/// Performs one HTTP-style request against a storage node
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Run the request. A non-2xx status is still `Ok`; only a failure to
    /// talk to the node at all is an error.
    async fn execute(&self, request: TransferRequest) -> Result<TransferResponse>;
}

/// `reqwest` implementation of [`Transfer`]
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: reqwest::Client,
}

impl HttpTransfer {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn execute(&self, request: TransferRequest) -> Result<TransferResponse> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            Some(TransferBody::Bytes(bytes)) => builder.body(bytes),
            // Chunked unless the caller supplied a Content-Length header
            Some(TransferBody::Stream(reader)) => {
                builder.body(reqwest::Body::wrap_stream(ReaderStream::new(reader)))
            }
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok(TransferResponse { status, body })
    }
}
