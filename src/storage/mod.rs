// Storage layer (S3-compatible)

pub mod s3_client;

pub use s3_client::S3Store;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors raised by an object store backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Error generating {operation} URL: {message}")]
    Presign {
        operation: &'static str,
        message: String,
    },

    #[error("{0}")]
    Backend(String),

    #[error("Invalid storage configuration: {0}")]
    Config(String),
}

impl StorageError {
    /// Short name of the failure class, reported alongside error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::Presign { .. } => "PresignError",
            StorageError::Backend(_) => "BackendError",
            StorageError::Config(_) => "ConfigError",
        }
    }

    /// Heuristic for credentials that authenticate but lack bucket permissions.
    pub fn is_unauthorized(&self) -> bool {
        let message = self.to_string().to_lowercase();
        message.contains("unauthorizedaccess")
            || message.contains("not authorized")
            || message.contains("accessdenied")
            || message.contains("403")
    }
}

/// A stored object as reported by a bucket listing
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Backend the link service signs and proxies for.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Presigned GET link valid for `expires_in` seconds.
    async fn presign_get(&self, key: &str, expires_in: u32) -> Result<String, StorageError>;

    /// Presigned PUT link valid for `expires_in` seconds.
    async fn presign_put(&self, key: &str, expires_in: u32) -> Result<String, StorageError>;

    async fn list_objects(&self) -> Result<Vec<ObjectInfo>, StorageError>;

    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Cheapest request that proves the credentials can reach the bucket.
    async fn check_access(&self) -> Result<(), StorageError>;

    fn bucket_name(&self) -> &str;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_and_message() {
        let err = StorageError::Presign {
            operation: "upload",
            message: "bad key".to_string(),
        };
        assert_eq!(err.kind(), "PresignError");
        assert_eq!(err.to_string(), "Error generating upload URL: bad key");
    }

    #[test]
    fn test_is_unauthorized() {
        assert!(StorageError::Backend("UnauthorizedAccess: bucket".to_string()).is_unauthorized());
        assert!(StorageError::Backend("Key is Not Authorized".to_string()).is_unauthorized());
        assert!(!StorageError::Backend("connection reset".to_string()).is_unauthorized());
    }
}
