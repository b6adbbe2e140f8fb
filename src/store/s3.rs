//! S3 backend.
//!
//! Containers are buckets. The client is built from the standard AWS
//! environment (credentials chain, `AWS_REGION`), optionally pinned to a
//! region and pointed at an S3-compatible endpoint such as MinIO.

use super::{ObjectStore, StoreError, StoreResult};
use crate::address::ObjectAddress;
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;

#[derive(Clone)]
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    pub async fn new(region: Option<String>, endpoint: Option<String>) -> Self {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region));
        }
        let config = config_loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&config);
        if let Some(endpoint) = endpoint {
            // Compatible providers generally only support path-style addressing.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        Self {
            client: S3Client::from_conf(builder.build()),
        }
    }

    pub fn from_client(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, address: &ObjectAddress) -> StoreResult<Bytes> {
        let resp = self
            .client
            .get_object()
            .bucket(&address.container)
            .key(&address.key)
            .send()
            .await
            .map_err(|e| {
                let service = e.into_service_error();
                if service.is_no_such_key() {
                    StoreError::NotFound(address.to_string())
                } else {
                    StoreError::Backend(format!("S3 get_object failed: {}", service))
                }
            })?;
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Backend(format!("Failed to read S3 object body: {}", e)))?;
        Ok(body.into_bytes())
    }

    async fn put(
        &self,
        address: &ObjectAddress,
        data: Bytes,
        content_type: &str,
    ) -> StoreResult<()> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&address.container)
            .key(&address.key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %address.container,
                    key = %address.key,
                    size_bytes = size,
                    "S3 upload failed"
                );
                StoreError::Backend(format!("S3 put_object failed: {}", e.into_service_error()))
            })?;
        Ok(())
    }

    async fn list(&self, container: &str, prefix: &str, max_results: usize) -> StoreResult<usize> {
        let max_keys = i32::try_from(max_results).unwrap_or(i32::MAX);
        let resp = self
            .client
            .list_objects_v2()
            .bucket(container)
            .prefix(prefix)
            .max_keys(max_keys)
            .send()
            .await
            .map_err(|e| {
                StoreError::Backend(format!(
                    "S3 list_objects_v2 failed: {}",
                    e.into_service_error()
                ))
            })?;
        let count = resp
            .key_count()
            .map(|n| n.max(0) as usize)
            .unwrap_or_else(|| resp.contents().len());
        Ok(count.min(max_results))
    }
}
