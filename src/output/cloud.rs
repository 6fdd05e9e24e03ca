//! Object storage destinations (GCS, S3, R2, Azure, local)

use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::sync::Arc;

/// Object storage destination parsed from URL
#[derive(Debug, Clone)]
pub struct CloudDestination {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: String,
    /// Original URL scheme for logging
    scheme: String,
}

impl CloudDestination {
    /// Parse a destination URL and create appropriate object store
    ///
    /// Supported formats:
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/` or `file:///path/` - Local filesystem
    ///
    /// Credentials are read from the environment by each store builder.
    pub fn parse(url: &str) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("gs://") {
            let (bucket, prefix) = split_bucket(rest);
            let store = GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket)
                .build()
                .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;
            Ok(Self::new(Arc::new(store), prefix, "gs"))
        } else if let Some(rest) = url.strip_prefix("s3://") {
            let (bucket, prefix) = split_bucket(rest);
            let store = AmazonS3Builder::from_env()
                .with_bucket_name(bucket)
                .build()
                .map_err(|e| Error::config(format!("Failed to create s3 client: {e}")))?;
            Ok(Self::new(Arc::new(store), prefix, "s3"))
        } else if let Some(rest) = url.strip_prefix("r2://") {
            let (bucket, prefix) = split_bucket(rest);
            let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
            // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
            let store = builder
                .build()
                .map_err(|e| Error::config(format!("Failed to create r2 client: {e}")))?;
            Ok(Self::new(Arc::new(store), prefix, "r2"))
        } else if let Some(rest) = url.strip_prefix("az://") {
            let (container, prefix) = split_bucket(rest);
            let store = MicrosoftAzureBuilder::from_env()
                .with_container_name(container)
                .build()
                .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;
            Ok(Self::new(Arc::new(store), prefix, "az"))
        } else {
            Self::local(url.strip_prefix("file://").unwrap_or(url))
        }
    }

    /// Local filesystem destination rooted at `path`, created if missing
    pub fn local(path: &str) -> Result<Self> {
        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(path)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self::new(Arc::new(store), String::new(), "file"))
    }

    fn new(store: Arc<dyn ObjectStore>, prefix: String, scheme: &str) -> Self {
        Self {
            store,
            prefix,
            scheme: scheme.to_string(),
        }
    }

    /// Check if this is a cloud destination (not local)
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }

    /// Get the scheme (gs, s3, r2, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Resolve a relative name under the destination prefix
    pub fn object_path(&self, name: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(name)
        } else {
            ObjectPath::from(format!("{}/{name}", self.prefix.trim_end_matches('/')))
        }
    }

    /// Display form of an object path, for logging
    pub fn display_path(&self, path: &ObjectPath) -> String {
        format!("{}://{path}", self.scheme)
    }

    /// Write bytes to an object, overwriting it
    pub async fn put(&self, path: &ObjectPath, data: Bytes) -> Result<()> {
        self.store.put(path, data.into()).await?;
        Ok(())
    }

    /// Read an object fully
    pub async fn get(&self, path: &ObjectPath) -> Result<Bytes> {
        Ok(self.store.get(path).await?.bytes().await?)
    }

    /// List every object under a prefix
    pub async fn list(&self, prefix: &ObjectPath) -> Result<Vec<ObjectPath>> {
        let objects: Vec<_> = self.store.list(Some(prefix)).try_collect().await?;
        Ok(objects.into_iter().map(|meta| meta.location).collect())
    }

    /// Delete an object
    pub async fn delete(&self, path: &ObjectPath) -> Result<()> {
        self.store.delete(path).await?;
        Ok(())
    }
}

fn split_bucket(without_scheme: &str) -> (&str, String) {
    match without_scheme.find('/') {
        Some(idx) => (
            &without_scheme[..idx],
            without_scheme[idx + 1..].to_string(),
        ),
        None => (without_scheme, String::new()),
    }
}
