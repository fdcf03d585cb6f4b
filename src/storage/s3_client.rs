// S3-compatible backend built on rust-s3

use super::{ObjectInfo, ObjectStore, StorageError};
use crate::config::StorageConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use s3::creds::Credentials;
use s3::region::Region;
use s3::Bucket;
use tracing::{debug, info, warn};

pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    /// Build a path-style SigV4 client for the configured endpoint.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let key_id = config
            .key_id
            .as_deref()
            .ok_or_else(|| StorageError::Config("missing application key id".to_string()))?;
        let secret = config
            .application_key
            .as_deref()
            .ok_or_else(|| StorageError::Config("missing application key".to_string()))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint_url.clone(),
        };
        let credentials = Credentials::new(Some(key_id), Some(secret), None, None, None)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(&config.bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?
            .with_path_style();

        info!(
            bucket = %config.bucket_name,
            endpoint = %config.endpoint_url,
            region = %config.region,
            "S3 store initialised"
        );

        Ok(Self {
            bucket: Box::new(bucket),
        })
    }
}

fn parse_last_modified(raw: &str) -> DateTime<Utc> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.with_timezone(&Utc),
        Err(e) => {
            warn!(value = %raw, error = %e, "Unparseable LastModified, using epoch");
            DateTime::<Utc>::default()
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn presign_get(&self, key: &str, expires_in: u32) -> Result<String, StorageError> {
        debug!(key = %key, expires_in, "Presigning GET");
        self.bucket
            .presign_get(key, expires_in, None)
            .await
            .map_err(|e| StorageError::Presign {
                operation: "download",
                message: e.to_string(),
            })
    }

    async fn presign_put(&self, key: &str, expires_in: u32) -> Result<String, StorageError> {
        debug!(key = %key, expires_in, "Presigning PUT");
        self.bucket
            .presign_put(key, expires_in, None)
            .await
            .map_err(|e| StorageError::Presign {
                operation: "upload",
                message: e.to_string(),
            })
    }

    async fn list_objects(&self) -> Result<Vec<ObjectInfo>, StorageError> {
        let pages = self
            .bucket
            .list(String::new(), None)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let objects: Vec<ObjectInfo> = pages
            .into_iter()
            .flat_map(|page| page.contents)
            .map(|obj| ObjectInfo {
                last_modified: parse_last_modified(&obj.last_modified),
                size: obj.size,
                key: obj.key,
            })
            .collect();

        debug!(count = objects.len(), "Listed bucket");
        Ok(objects)
    }

    async fn put_object(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            let body = String::from_utf8_lossy(response.as_slice()).to_string();
            return Err(StorageError::Backend(format!(
                "PUT {} returned {}: {}",
                key, status, body
            )));
        }

        info!(key = %key, bytes = data.len(), content_type = %content_type, "Object stored");
        Ok(())
    }

    async fn check_access(&self) -> Result<(), StorageError> {
        let (_, status) = self
            .bucket
            .list_page(String::new(), None, None, None, Some(1))
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        if (200..300).contains(&status) {
            Ok(())
        } else {
            Err(StorageError::Backend(format!("bucket probe returned {}", status)))
        }
    }

    fn bucket_name(&self) -> &str {
        &self.bucket.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StorageConfig {
        StorageConfig {
            endpoint_url: "https://s3.us-west-002.backblazeb2.com".to_string(),
            region: "us-west-002".to_string(),
            key_id: Some("0050428f1a906270000000001".to_string()),
            application_key: Some("K005rH1B5kjFA6QgKtyAbzl1F80qMeY".to_string()),
            bucket_name: "mybucket".to_string(),
        }
    }

    #[test]
    fn test_new_requires_credentials() {
        let mut cfg = config();
        cfg.application_key = None;
        assert!(matches!(S3Store::new(&cfg), Err(StorageError::Config(_))));
    }

    #[test]
    fn test_parse_last_modified() {
        let ts = parse_last_modified("2024-05-01T12:30:00.000Z");
        assert_eq!(ts.timestamp(), 1_714_566_600);
        assert_eq!(parse_last_modified("garbage").timestamp(), 0);
    }

    #[tokio::test]
    async fn test_presigned_links_are_path_style_and_signed() {
        let store = S3Store::new(&config()).unwrap();
        assert_eq!(store.bucket_name(), "mybucket");

        let put = store.presign_put("report.txt", 600).await.unwrap();
        assert!(put.starts_with("https://s3.us-west-002.backblazeb2.com/mybucket/report.txt?"));
        assert!(put.contains("X-Amz-Signature="));
        assert!(put.contains("X-Amz-Expires=600"));

        let get = store.presign_get("report.txt", 3600).await.unwrap();
        assert!(get.contains("X-Amz-Expires=3600"));
        assert_ne!(get, put);
    }
}
