use async_trait::async_trait;
use bytes::Bytes;
use std::error::Error as _;
use std::fmt;

use crate::types::UploadFileResponse;

/// What went wrong below the HTTP status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure, reset, or a browser-style opaque
    /// cross-origin failure: nothing usable came back.
    Unreachable,
    Timeout,
    /// A response arrived but its body could not be read or decoded.
    Decode,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Unreachable => write!(f, "unreachable"),
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::Decode => write!(f, "decode"),
            TransportErrorKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The peer could not be reached at all (as opposed to answering badly).
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Unreachable | TransportErrorKind::Timeout
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() || err.is_request() {
            TransportErrorKind::Unreachable
        } else if err.is_decode() || err.is_body() {
            TransportErrorKind::Decode
        } else {
            TransportErrorKind::Other
        };

        // reqwest's top-level message omits the cause ("error sending request"),
        // so append the source chain.
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        TransportError::new(kind, message)
    }
}

/// Status line of the direct PUT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectReply {
    pub status: u16,
    pub status_text: String,
}

impl DirectReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Status line and decoded body of the proxy upload.
#[derive(Debug, Clone)]
pub struct ProxyReply {
    pub status: u16,
    pub status_text: String,
    pub body: UploadFileResponse,
}

#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// PUT `body` to a presigned link.
    async fn put_direct(
        &self,
        link: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<DirectReply, TransportError>;

    /// POST `body` as multipart to the upload proxy: part `file` named after
    /// `source_name`, text part `file_name` naming the object to store.
    async fn post_proxy(
        &self,
        file_name: &str,
        source_name: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<ProxyReply, TransportError>;
}
