//! S3-backed poster cache
//!
//! One object per movie, keyed by [`cache_key`]. Objects are never expired or
//! overwritten with different content, so concurrent writers of the same key
//! are harmless.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use tracing::debug;

use crate::errors::BotError;

/// Object key for a movie's cached poster.
#[must_use]
pub fn cache_key(movie_id: u64) -> String {
    format!("movie-{movie_id}.jpg")
}

/// MIME type stored alongside an object, guessed from the key's extension.
#[must_use]
pub fn content_type_for(key: &str) -> String {
    mime_guess::from_path(key)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PosterStore: Send + Sync {
    /// `Ok(false)` only when the store says the key does not exist.
    async fn exists(&self, key: &str) -> Result<bool, BotError>;

    /// Time-limited GET URL for `key`.
    async fn presigned_url(&self, key: &str) -> Result<String, BotError>;

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BotError>;
}

pub struct S3PosterStore {
    client: Client,
    bucket: String,
    presign_expiry: Duration,
}

impl S3PosterStore {
    #[must_use]
    pub fn new(client: Client, bucket: String, presign_expiry: Duration) -> Self {
        Self {
            client,
            bucket,
            presign_expiry,
        }
    }
}

#[async_trait]
impl PosterStore for S3PosterStore {
    async fn exists(&self, key: &str) -> Result<bool, BotError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.as_service_error().is_some_and(HeadObjectError::is_not_found) => {
                debug!(key, "Poster not cached");
                Ok(false)
            }
            Err(e) => Err(BotError::AwsError(format!(
                "s3 head_object {key}: {}",
                DisplayErrorContext(&e)
            ))),
        }
    }

    async fn presigned_url(&self, key: &str) -> Result<String, BotError> {
        let presigning = PresigningConfig::expires_in(self.presign_expiry)
            .map_err(|e| BotError::AwsError(format!("presigning config: {e}")))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                BotError::AwsError(format!(
                    "s3 presign get_object {key}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(request.uri().to_string())
    }

    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BotError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                BotError::AwsError(format!("s3 put_object {key}: {}", DisplayErrorContext(&e)))
            })?;

        Ok(())
    }
}
