use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use super::transport::{DirectReply, ProxyReply, TransportError, TransportErrorKind, UploadTransport};
use crate::config::ClientConfig;
use crate::types::{
    FileEntry, GenerateLinkRequest, LinkResponse, ListFilesResponse, PresignedLink,
    UploadFileResponse,
};

/// Errors from the link service REST calls
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service answered with `success: false`.
    #[error("{0}")]
    Api(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Client for the link service API rooted at `api_base` (e.g. `http://localhost:5001/api`).
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    api_base: String,
}

impl ApiClient {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_base)
    }

    pub fn with_client(http: Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(TransportError::from)?;
        Ok(Self::with_client(http, config.api_base.clone()))
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    pub async fn generate_download_url(
        &self,
        file_name: &str,
        expiration: i64,
    ) -> Result<PresignedLink, ClientError> {
        self.generate_link("generate-download-url", file_name, expiration).await
    }

    pub async fn generate_upload_url(
        &self,
        file_name: &str,
        expiration: i64,
    ) -> Result<PresignedLink, ClientError> {
        self.generate_link("generate-upload-url", file_name, expiration).await
    }

    async fn generate_link(
        &self,
        path: &str,
        file_name: &str,
        expiration: i64,
    ) -> Result<PresignedLink, ClientError> {
        if file_name.trim().is_empty() {
            return Err(ClientError::InvalidInput("file name must not be empty".to_string()));
        }

        debug!(path = %path, file_name = %file_name, expiration, "Requesting presigned link");

        let response = self
            .http
            .post(self.endpoint(path))
            .json(&GenerateLinkRequest {
                file_name: Some(file_name.to_string()),
                expiration: Some(expiration),
            })
            .send()
            .await
            .map_err(TransportError::from)?;

        let data: LinkResponse = read_json(response).await?;
        if !data.success {
            return Err(ClientError::Api(
                data.error.unwrap_or_else(|| "Failed to generate URL".to_string()),
            ));
        }

        match (data.url, data.file_name, data.expiration_seconds, data.expires_at) {
            (Some(url), Some(file_name), Some(expiration_seconds), Some(expires_at)) => {
                info!(file_name = %file_name, expiration_seconds, "Presigned link received");
                Ok(PresignedLink {
                    file_name,
                    url,
                    expiration_seconds,
                    expires_at,
                })
            }
            _ => Err(ClientError::UnexpectedResponse(
                "link response is missing fields".to_string(),
            )),
        }
    }

    pub async fn list_files(&self) -> Result<Vec<FileEntry>, ClientError> {
        let response = self
            .http
            .get(self.endpoint("list-files"))
            .send()
            .await
            .map_err(TransportError::from)?;

        let data: ListFilesResponse = read_json(response).await?;
        if !data.success {
            return Err(ClientError::Api(
                data.error.unwrap_or_else(|| "Failed to load files".to_string()),
            ));
        }
        Ok(data.files)
    }

    /// Configuration report from `GET /api/check-config`, passed through as JSON.
    pub async fn check_config(&self) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http
            .get(self.endpoint("check-config"))
            .send()
            .await
            .map_err(TransportError::from)?;

        read_json(response).await
    }
}

/// Decode a JSON body whatever the status; the service reports failures as
/// `{error}` bodies on 4xx/5xx.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let text = response.text().await.map_err(TransportError::from)?;
    serde_json::from_str(&text).map_err(|e| {
        ClientError::UnexpectedResponse(format!("HTTP {} with undecodable body: {}", status, e))
    })
}

fn file_part(file_name: &str, body: Bytes, content_type: &str) -> Part {
    let part = Part::bytes(body.to_vec()).file_name(file_name.to_string());
    match part.mime_str(content_type) {
        Ok(part) => part,
        // Unparseable media type: send the bytes untyped rather than failing.
        Err(_) => Part::bytes(body.to_vec()).file_name(file_name.to_string()),
    }
}

#[async_trait]
impl UploadTransport for ApiClient {
    async fn put_direct(
        &self,
        link: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<DirectReply, TransportError> {
        let response = self
            .http
            .put(link)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        Ok(DirectReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }

    async fn post_proxy(
        &self,
        file_name: &str,
        source_name: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<ProxyReply, TransportError> {
        let form = Form::new()
            .part("file", file_part(source_name, body, content_type))
            .text("file_name", file_name.to_string());

        let response = self
            .http
            .post(self.endpoint("upload-file"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: UploadFileResponse = serde_json::from_str(&text).map_err(|_| {
            TransportError::new(
                TransportErrorKind::Decode,
                format!("Upload proxy returned HTTP {} with a non-JSON body", status),
            )
        })?;

        Ok(ProxyReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}
