//! HTTP client for the link service
//!
//! - [`ApiClient`] wraps the REST calls (link generation, listing, config report)
//! - [`UploadTransport`] is the seam the upload dispatcher talks through;
//!   `ApiClient` implements it with a direct PUT and a multipart proxy POST.

pub mod api;
pub mod transport;

pub use api::{ApiClient, ClientError};
pub use transport::{DirectReply, ProxyReply, TransportError, TransportErrorKind, UploadTransport};
