use bytes::Bytes;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{TransportError, UploadTransport};
use crate::types::PresignedLink;

/// A local file chosen for upload.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content: Bytes,
    /// Declared media type, if any.
    pub content_type: Option<String>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            content_type,
        }
    }

    /// Read a file from disk, guessing its media type from the extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let content = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = mime_guess::from_path(path).first().map(|m| m.to_string());
        Ok(Self::new(name, content, content_type))
    }
}

/// The upload link a transfer targets, with the object name it was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub file_name: String,
    pub url: String,
}

impl From<PresignedLink> for UploadTarget {
    fn from(link: PresignedLink) -> Self {
        Self {
            file_name: link.file_name,
            url: link.url,
        }
    }
}

/// Precondition failures; reported before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select a file")]
    NoFileSelected,

    #[error("Please generate an upload URL first")]
    NoUploadLink,
}

/// One validated upload, consumed by a single transfer.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Object name the link was issued for.
    pub file_name: String,
    /// Name of the selected local file.
    pub source_name: String,
    pub content: Bytes,
    pub content_type: String,
    pub target_link: String,
}

impl TransferRequest {
    pub fn new(
        selection: Option<SelectedFile>,
        target: Option<&UploadTarget>,
    ) -> Result<Self, ValidationError> {
        let file = selection.ok_or(ValidationError::NoFileSelected)?;
        let target = target
            .filter(|t| !t.url.is_empty() && !t.file_name.is_empty())
            .ok_or(ValidationError::NoUploadLink)?;

        let source_name = if file.name.is_empty() {
            target.file_name.clone()
        } else {
            file.name
        };

        Ok(Self {
            file_name: target.file_name.clone(),
            source_name,
            content: file.content,
            content_type: file
                .content_type
                .filter(|ct| !ct.is_empty())
                .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string()),
            target_link: target.url.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRoute {
    Direct,
    Proxy,
}

/// Why the direct PUT did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectFailure {
    Status { code: u16, text: String },
    Transport(TransportError),
}

impl fmt::Display for DirectFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectFailure::Status { code, text } => write!(f, "storage returned {} {}", code, text),
            DirectFailure::Transport(e) => write!(f, "{} ({})", e.message, e.kind),
        }
    }
}

/// Terminal failure of the proxy attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProxyTransferError {
    /// The proxy answered and refused the upload.
    #[error("{message}")]
    Rejected { message: String },

    #[error(
        "Failed to upload file ({message}). Check that CORS rules on the bucket allow PUT \
         from this origin, that the link service is running and reachable, and your \
         network connection."
    )]
    Unreachable { message: String },

    #[error("{message}")]
    Failed { message: String },
}

impl From<TransportError> for ProxyTransferError {
    fn from(err: TransportError) -> Self {
        if err.is_unreachable() {
            ProxyTransferError::Unreachable {
                message: err.message,
            }
        } else {
            ProxyTransferError::Failed {
                message: err.message,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    Success {
        route: TransferRoute,
        file_name: String,
        status_code: u16,
        status_text: String,
        /// Set when the proxy path was used.
        direct_failure: Option<DirectFailure>,
    },
    Failure {
        direct: DirectFailure,
        error: ProxyTransferError,
    },
}

impl TransferOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Success { .. })
    }

    /// User-facing summary.
    pub fn message(&self) -> String {
        match self {
            TransferOutcome::Success {
                route: TransferRoute::Direct,
                file_name,
                status_code,
                status_text,
                ..
            } => format!(
                "File uploaded successfully: {} (status {} {})",
                file_name, status_code, status_text
            ),
            TransferOutcome::Success {
                route: TransferRoute::Proxy,
                file_name,
                ..
            } => format!("File uploaded successfully via server proxy: {}", file_name),
            TransferOutcome::Failure { error, .. } => error.to_string(),
        }
    }
}

const GENERIC_PROXY_FAILURE: &str = "Upload failed";

pub struct UploadDispatcher<T> {
    transport: T,
}

impl<T: UploadTransport> UploadDispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Validate the selection and link, then run the transfer.
    pub async fn dispatch(
        &self,
        selection: Option<SelectedFile>,
        target: Option<&UploadTarget>,
    ) -> Result<TransferOutcome, ValidationError> {
        let request = TransferRequest::new(selection, target)?;
        Ok(self.transfer(request).await)
    }

    pub async fn transfer(&self, request: TransferRequest) -> TransferOutcome {
        debug!(
            file_name = %request.file_name,
            bytes = request.content.len(),
            content_type = %request.content_type,
            "Attempting direct upload"
        );

        let direct = match self
            .transport
            .put_direct(&request.target_link, request.content.clone(), &request.content_type)
            .await
        {
            Ok(reply) if reply.is_success() => {
                info!(file_name = %request.file_name, status = reply.status, "Direct upload succeeded");
                return TransferOutcome::Success {
                    route: TransferRoute::Direct,
                    file_name: request.file_name,
                    status_code: reply.status,
                    status_text: reply.status_text,
                    direct_failure: None,
                };
            }
            Ok(reply) => DirectFailure::Status {
                code: reply.status,
                text: reply.status_text,
            },
            Err(e) => DirectFailure::Transport(e),
        };

        warn!(file_name = %request.file_name, reason = %direct, "Direct upload failed, trying server proxy");

        match self
            .transport
            .post_proxy(
                &request.file_name,
                &request.source_name,
                request.content,
                &request.content_type,
            )
            .await
        {
            Ok(reply) if reply.body.success => {
                let file_name = reply.body.file_name.unwrap_or(request.file_name);
                info!(file_name = %file_name, "Proxy upload succeeded");
                TransferOutcome::Success {
                    route: TransferRoute::Proxy,
                    file_name,
                    status_code: reply.status,
                    status_text: reply.status_text,
                    direct_failure: Some(direct),
                }
            }
            Ok(reply) => {
                let message = reply
                    .body
                    .error
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| GENERIC_PROXY_FAILURE.to_string());
                warn!(status = reply.status, error = %message, "Proxy rejected upload");
                TransferOutcome::Failure {
                    direct,
                    error: ProxyTransferError::Rejected { message },
                }
            }
            Err(e) => {
                warn!(error = %e, kind = %e.kind, "Proxy upload failed");
                TransferOutcome::Failure {
                    direct,
                    error: e.into(),
                }
            }
        }
    }
}
