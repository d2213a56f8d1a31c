//! Best-effort removal of event images held in the managed blob store.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use crate::errors::AssetCleanupError;

use super::store::BlobStore;

/// Path segment that precedes `{bucket}/{key}` in a managed public URL.
const PUBLIC_OBJECT_PATH: &str = "/storage/v1/object/public/";

/// Location of an object inside the managed store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedObject {
    pub bucket: String,
    /// Bucket-relative key, kept exactly as it appears in the URL path.
    pub key: String,
}

/// Recognizes public URLs served by the managed blob store.
#[derive(Debug, Clone)]
pub struct ManagedUrlPattern {
    base: Url,
    prefix: String,
}

impl ManagedUrlPattern {
    /// Returns `None` when `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Option<Self> {
        let base = Url::parse(base_url).ok()?;
        if base.cannot_be_a_base() {
            return None;
        }
        let prefix = format!("{}{}", base.path().trim_end_matches('/'), PUBLIC_OBJECT_PATH);
        Some(Self { base, prefix })
    }

    /// Extracts bucket and key, or `None` for any URL the store does not serve.
    pub fn parse(&self, url: &str) -> Option<ManagedObject> {
        let url = Url::parse(url.trim()).ok()?;
        if url.scheme() != self.base.scheme()
            || url.host_str() != self.base.host_str()
            || url.port_or_known_default() != self.base.port_or_known_default()
        {
            return None;
        }

        let rest = url.path().strip_prefix(&self.prefix)?;
        let (bucket, key) = rest.split_once('/')?;
        if bucket.is_empty() || key.is_empty() || key.ends_with('/') {
            return None;
        }

        Some(ManagedObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

/// Result of cleaning up one asset URL.
#[derive(Debug)]
pub enum AssetOutcome {
    Deleted(ManagedObject),
    /// Not a managed URL; nothing to do.
    Skipped,
    Failed(AssetCleanupError),
}

/// Deletes managed assets referenced by URL.
#[derive(Clone)]
pub struct AssetCleaner {
    blob: Arc<dyn BlobStore>,
    pattern: Option<ManagedUrlPattern>,
    timeout: Duration,
}

impl AssetCleaner {
    /// Without a pattern every URL is skipped.
    pub fn new(
        blob: Arc<dyn BlobStore>,
        pattern: Option<ManagedUrlPattern>,
        timeout: Duration,
    ) -> Self {
        Self {
            blob,
            pattern,
            timeout,
        }
    }

    /// Never fails: unrecognized URLs are skipped, store errors are returned
    /// as [`AssetOutcome::Failed`].
    pub async fn clean(&self, url: &str) -> AssetOutcome {
        let Some(object) = self.pattern.as_ref().and_then(|p| p.parse(url)) else {
            tracing::debug!(url, "skipping asset outside the managed store");
            return AssetOutcome::Skipped;
        };

        let request = self.blob.delete_object(&object.bucket, &object.key);
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(())) => {
                tracing::debug!(bucket = %object.bucket, key = %object.key, "deleted asset");
                AssetOutcome::Deleted(object)
            }
            Ok(Err(err)) => AssetOutcome::Failed(err),
            Err(_) => AssetOutcome::Failed(AssetCleanupError::Timeout(self.timeout)),
        }
    }
}
