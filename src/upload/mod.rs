//! Upload dispatch with server-proxy fallback
//!
//! A transfer first goes straight to storage through a presigned PUT link.
//! When that path fails (non-2xx status, or the storage endpoint cannot be
//! reached, which is how a missing CORS rule presents to a browser) the same
//! bytes are sent once more through the link service's upload proxy.
//!
//! ```text
//! Idle -> DirectAttempt -> Success
//!                       -> DirectFailure -> ProxyAttempt -> Success
//!                                                        -> Failure
//! ```

pub mod dispatcher;

pub use dispatcher::{
    DirectFailure, ProxyTransferError, SelectedFile, TransferOutcome, TransferRequest,
    TransferRoute, UploadDispatcher, UploadTarget, ValidationError,
};
