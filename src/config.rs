use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_REGION: &str = "us-east-005";
const DEFAULT_BUCKET: &str = "mybucket";

const KEY_ID_VARS: [&str; 3] = ["B2_APPLICATION_KEY_ID", "B2_KEY_ID", "B2_ACCESS_KEY_ID"];
const SECRET_VARS: [&str; 3] = ["B2_APPLICATION_KEY", "B2_SECRET_KEY", "B2_APPLICATION_SECRET"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub static_dir: PathBuf,
}

/// Credentials and location of the bucket the link service signs for.
///
/// Secrets are optional here so that client-only commands can load the
/// configuration without them; `validate` is called before serving.
#[derive(Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint_url: String,
    pub region: String,
    pub key_id: Option<String>,
    pub application_key: Option<String>,
    pub bucket_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api_base: String,
    pub timeout_secs: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig::from_env()?,
            storage: StorageConfig::from_env(),
            client: ClientConfig::from_env()?,
        })
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: get_env("PORT")
                .unwrap_or_else(|| "5001".to_string())
                .parse()
                .context("PORT must be a port number")?,
            host: get_env("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            cors_allowed_origins: get_env("ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            max_upload_bytes: get_env("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|| (100 * 1024 * 1024).to_string())
                .parse()
                .context("MAX_UPLOAD_BYTES must be a byte count")?,
            static_dir: PathBuf::from(get_env("STATIC_DIR").unwrap_or_else(|| "static".to_string())),
        })
    }
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let endpoint_url = normalize_endpoint(&get_env("B2_ENDPOINT_URL").unwrap_or_default());
        let region = get_env("B2_REGION").unwrap_or_else(|| region_from_endpoint(&endpoint_url));

        Self {
            endpoint_url,
            region,
            key_id: first_env(&KEY_ID_VARS),
            application_key: first_env(&SECRET_VARS),
            bucket_name: get_env("B2_BUCKET_NAME").unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
        }
    }

    /// Fails when anything needed to sign requests is missing.
    pub fn validate(&self) -> Result<()> {
        if self.key_id.is_none() {
            bail!("B2_APPLICATION_KEY_ID is required (also accepted: B2_KEY_ID, B2_ACCESS_KEY_ID)");
        }
        if self.application_key.is_none() {
            bail!("B2_APPLICATION_KEY is required (also accepted: B2_SECRET_KEY, B2_APPLICATION_SECRET)");
        }
        if self.endpoint_url.is_empty() {
            bail!("B2_ENDPOINT_URL is required");
        }
        Ok(())
    }
}

// Keeps secrets out of `{:?}` output in logs.
impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("region", &self.region)
            .field(
                "key_id",
                &self.key_id.as_deref().map(crate::utils::mask_secret),
            )
            .field("application_key", &self.application_key.as_ref().map(|_| "<set>"))
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

impl ClientConfig {
    /// Client commands load only this section, so a bad server setting
    /// does not break them.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            api_base: get_env("API_BASE").unwrap_or_else(|| "http://localhost:5001/api".to_string()),
            timeout_secs: get_env("HTTP_TIMEOUT_SECS")
                .map(|v| v.parse())
                .transpose()
                .context("HTTP_TIMEOUT_SECS must be a number of seconds")?,
        })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Read an environment variable, trimming whitespace and surrounding quotes.
/// Empty values count as unset.
pub fn get_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|v| clean_value(&v))
}

fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| get_env(key))
}

fn clean_value(raw: &str) -> Option<String> {
    let value = raw.trim().trim_matches('"').trim_matches('\'');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Prefix `https://` when the endpoint was given as a bare host.
pub fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.is_empty() || endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

/// Extract the region from a B2 endpoint such as
/// `https://s3.us-west-002.backblazeb2.com`.
pub fn region_from_endpoint(endpoint: &str) -> String {
    let host = endpoint
        .split("://")
        .nth(1)
        .unwrap_or(endpoint)
        .split('/')
        .next()
        .unwrap_or_default();

    host.split('.')
        .find(|part| {
            let mut pieces = part.split('-');
            matches!(
                (pieces.next(), pieces.next(), pieces.next(), pieces.next()),
                (Some(geo), Some(dir), Some(num), None)
                    if geo.len() == 2
                        && !dir.is_empty()
                        && !num.is_empty()
                        && num.chars().all(|c| c.is_ascii_digit())
            )
        })
        .map(String::from)
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_value() {
        assert_eq!(clean_value("  \"abc\" "), Some("abc".to_string()));
        assert_eq!(clean_value("'key'"), Some("key".to_string()));
        assert_eq!(clean_value("   "), None);
        assert_eq!(clean_value("\"\""), None);
    }

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("s3.us-east-005.backblazeb2.com"),
            "https://s3.us-east-005.backblazeb2.com"
        );
        assert_eq!(normalize_endpoint("http://localhost:9000"), "http://localhost:9000");
        assert_eq!(normalize_endpoint(""), "");
    }

    #[test]
    fn test_region_from_endpoint() {
        assert_eq!(
            region_from_endpoint("https://s3.us-west-002.backblazeb2.com"),
            "us-west-002"
        );
        assert_eq!(
            region_from_endpoint("https://s3.eu-central-003.backblazeb2.com"),
            "eu-central-003"
        );
        assert_eq!(region_from_endpoint("http://localhost:9000"), DEFAULT_REGION);
        assert_eq!(region_from_endpoint(""), DEFAULT_REGION);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut storage = StorageConfig {
            endpoint_url: "https://s3.us-east-005.backblazeb2.com".to_string(),
            region: "us-east-005".to_string(),
            key_id: None,
            application_key: Some("K005secret".to_string()),
            bucket_name: "mybucket".to_string(),
        };
        assert!(storage.validate().is_err());

        storage.key_id = Some("0050428f1a906270000000001".to_string());
        assert!(storage.validate().is_ok());

        storage.endpoint_url.clear();
        assert!(storage.validate().is_err());
    }

    #[test]
    fn test_client_section_ignores_bad_server_settings() {
        env::set_var("PORT", "not-a-port");
        let client = ClientConfig::from_env();
        let full = Config::from_env();
        env::remove_var("PORT");

        assert!(client.is_ok());
        let err = full.unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let storage = StorageConfig {
            endpoint_url: "https://s3.us-east-005.backblazeb2.com".to_string(),
            region: "us-east-005".to_string(),
            key_id: Some("0050428f1a906270000000001".to_string()),
            application_key: Some("K005rH1B5kjFA6QgKtyAbzl1F80qMeY".to_string()),
            bucket_name: "mybucket".to_string(),
        };
        let rendered = format!("{:?}", storage);
        assert!(!rendered.contains("K005rH1B5kjFA6QgKtyAbzl1F80qMeY"));
        assert!(!rendered.contains("0050428f1a906270000000001"));
    }
}
