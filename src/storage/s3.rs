use async_trait::async_trait;
use aws_sdk_s3::Client;
use tracing::debug;

use super::{ObjectStore, StoredObject};
use crate::error::StoreError;
use crate::tier::Representation;

/// Object key for a representation: `{prefix}{image_id}/{representation}`.
pub fn object_key(prefix: &str, image_id: &str, representation: &Representation) -> String {
    format!("{}{}/{}", prefix, image_id, representation)
}

/// S3-backed representation store.
///
/// Works against AWS S3 or S3-compatible services (MinIO, etc.).
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch(
        &self,
        image_id: &str,
        representation: &Representation,
    ) -> Result<StoredObject, StoreError> {
        let key = object_key(&self.prefix, image_id, representation);
        let location = format!("s3://{}/{}", self.bucket, key);
        debug!(location = %location, "Fetching representation");

        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let is_not_found = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);

                // Some S3-compatible services only signal this via the status
                let status_is_404 = e
                    .raw_response()
                    .map(|r| r.status().as_u16() == 404)
                    .unwrap_or(false);

                if is_not_found || status_is_404 {
                    StoreError::NotFound(location.clone())
                } else {
                    StoreError::S3(e.to_string())
                }
            })?;

        let content_type = resp.content_type().map(str::to_string);

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .into_bytes();

        Ok(StoredObject { data, content_type })
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Pass an endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services generally want path-style addressing
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(endpoint_url.is_some())
        .build();

    Client::from_conf(s3_config)
}
