//! AWS S3 storage gateway.
//!
//! Forwards every gateway operation to a single S3 bucket (or any
//! S3-compatible endpoint such as MinIO or LocalStack).  Signed URLs are
//! produced locally with SigV4 presigning; no request is sent for them.
//!
//! Credentials are resolved via the standard AWS credential chain
//! (env vars, `~/.aws/credentials`, IAM role, etc.) unless explicit keys
//! are configured.

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::time::Duration;
use tracing::{debug, info};

use super::backend::{
    GatewayError, GatewayFuture, ListPage, ObjectDescriptor, StorageGateway, UrlMode,
};
use crate::config::AwsStorageConfig;

/// Characters escaped in a key embedded in a URL path or copy source.
///
/// Everything except unreserved characters and `/`, so nested keys keep
/// their path structure.
pub const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'/');

/// Gateway that forwards operations to AWS S3.
pub struct AwsGateway {
    /// AWS S3 SDK client, built once at startup.
    client: Client,
    /// The bucket every key lives in.
    bucket: String,
}

impl AwsGateway {
    /// Create a new AWS gateway.
    ///
    /// Loads AWS credentials from the default credential chain and
    /// initializes the S3 client for the configured region.
    pub async fn new(config: &AwsStorageConfig, bucket: String) -> anyhow::Result<Self> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if !config.endpoint_url.is_empty() {
            config_loader = config_loader.endpoint_url(&config.endpoint_url);
        }

        // If explicit credentials are provided, inject them as static credentials.
        if !config.access_key_id.is_empty() && !config.secret_access_key.is_empty() {
            let creds = aws_sdk_s3::config::Credentials::new(
                &config.access_key_id,
                &config.secret_access_key,
                None, // session_token
                None, // expiry
                "albumstore-config",
            );
            config_loader = config_loader.credentials_provider(creds);
        }

        let sdk_config = config_loader.load().await;

        let s3_config_builder =
            aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(config.use_path_style);

        let client = Client::from_conf(s3_config_builder.build());

        info!(
            "AWS gateway initialized: bucket={} region={}",
            bucket, config.region
        );

        Ok(Self { client, bucket })
    }

    /// `CopySource` value for `key`: `bucket/encoded-key`.
    fn copy_source(&self, key: &str) -> String {
        copy_source(&self.bucket, key)
    }

    /// Map an AWS SDK error to a backend error with context.
    fn map_sdk_error(context: &str, err: impl std::fmt::Display) -> GatewayError {
        GatewayError::Backend(anyhow::anyhow!("AWS S3 {context}: {err}"))
    }
}

fn copy_source(bucket: &str, key: &str) -> String {
    format!("{}/{}", bucket, utf8_percent_encode(key, KEY_ENCODE_SET))
}

impl StorageGateway for AwsGateway {
    fn list_page<'a>(
        &'a self,
        prefix: Option<&'a str>,
        delimiter: Option<&'a str>,
        continuation: Option<&'a str>,
    ) -> GatewayFuture<'a, ListPage> {
        Box::pin(async move {
            debug!(
                "AWS list_objects_v2: bucket={} prefix={:?} delimiter={:?}",
                self.bucket, prefix, delimiter
            );

            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_prefix(prefix.map(str::to_string))
                .set_delimiter(delimiter.map(str::to_string))
                .set_continuation_token(continuation.map(str::to_string))
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("list_objects_v2", e.into_service_error()))?;

            let objects = resp
                .contents()
                .iter()
                .filter_map(|obj| {
                    obj.key().map(|k| {
                        ObjectDescriptor::new(k, obj.size().unwrap_or(0).max(0) as u64)
                    })
                })
                .collect();

            let common_prefixes = resp
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix().map(str::to_string))
                .collect();

            // S3 only hands out a token while the listing is truncated.
            let next_token = if resp.is_truncated() == Some(true) {
                resp.next_continuation_token().map(str::to_string)
            } else {
                None
            };

            Ok(ListPage {
                objects,
                common_prefixes,
                next_token,
            })
        })
    }

    fn exists<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, bool> {
        Box::pin(async move {
            debug!("AWS head_object: bucket={} key={}", self.bucket, key);

            match self
                .client
                .head_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
            {
                Ok(_) => Ok(true),
                Err(e) => {
                    let service_err = e.into_service_error();
                    if service_err.is_not_found() {
                        Ok(false)
                    } else {
                        Err(Self::map_sdk_error("head_object", service_err))
                    }
                }
            }
        })
    }

    fn fetch<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, Bytes> {
        Box::pin(async move {
            debug!("AWS get_object: bucket={} key={}", self.bucket, key);

            let resp = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    let service_err = e.into_service_error();
                    if service_err.is_no_such_key() {
                        GatewayError::NotFound {
                            key: key.to_string(),
                        }
                    } else {
                        Self::map_sdk_error("get_object", service_err)
                    }
                })?;

            let body = resp
                .body
                .collect()
                .await
                .map_err(|e| Self::map_sdk_error("get_object body", e))?
                .into_bytes();

            Ok(body)
        })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        data: Bytes,
        content_type: &'a str,
    ) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            debug!(
                "AWS put_object: bucket={} key={} bytes={}",
                self.bucket,
                key,
                data.len()
            );

            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .content_type(content_type)
                .body(aws_sdk_s3::primitives::ByteStream::from(data))
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("put_object", e.into_service_error()))?;

            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            debug!("AWS delete_object: bucket={} key={}", self.bucket, key);

            // S3 delete_object is idempotent -- no error for missing keys.
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| Self::map_sdk_error("delete_object", e.into_service_error()))?;

            Ok(())
        })
    }

    fn copy<'a>(&'a self, source: &'a str, destination: &'a str) -> GatewayFuture<'a, ()> {
        Box::pin(async move {
            let copy_source = self.copy_source(source);

            debug!(
                "AWS copy_object: src={} dst={}/{}",
                copy_source, self.bucket, destination
            );

            self.client
                .copy_object()
                .bucket(&self.bucket)
                .key(destination)
                .copy_source(&copy_source)
                .send()
                .await
                .map_err(|e| {
                    let service_err = e.into_service_error();
                    Self::map_sdk_error("copy_object", service_err)
                })?;

            Ok(())
        })
    }

    fn signed_url<'a>(
        &'a self,
        key: &'a str,
        ttl_seconds: u64,
        mode: UrlMode,
    ) -> GatewayFuture<'a, String> {
        Box::pin(async move {
            let presign_err = |message: String| GatewayError::Presign {
                key: key.to_string(),
                mode: mode.clone(),
                message,
            };

            let config = PresigningConfig::expires_in(Duration::from_secs(ttl_seconds))
                .map_err(|e| presign_err(e.to_string()))?;

            let presigned = match &mode {
                UrlMode::Download => self
                    .client
                    .get_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .presigned(config)
                    .await
                    .map_err(|e| presign_err(e.to_string()))?,
                UrlMode::Upload { content_type } => self
                    .client
                    .put_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .content_type(content_type)
                    .presigned(config)
                    .await
                    .map_err(|e| presign_err(e.to_string()))?,
            };

            Ok(presigned.uri().to_string())
        })
    }
}

// -- Tests -------------------------------------------------------------------
