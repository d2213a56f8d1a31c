//! HTTP client for the managed blob store.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::errors::AssetCleanupError;
use crate::tour::BlobStore;

/// Deletes objects through the storage REST API at `{base}/storage/v1/object`.
#[derive(Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
    service_key: Option<String>,
}

impl HttpBlobStore {
    pub fn new(client: Client, base_url: &str, service_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, key)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), AssetCleanupError> {
        let Some(service_key) = self.service_key.as_deref() else {
            return Err(AssetCleanupError::NotConfigured);
        };

        let response = self
            .client
            .delete(self.object_url(bucket, key))
            .bearer_auth(service_key)
            .send()
            .await?;

        let status = response.status();
        // An object already gone counts as deleted, so a retried open() is quiet.
        if status.is_success() || status == StatusCode::NOT_FOUND {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AssetCleanupError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
