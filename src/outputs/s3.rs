//! S3 sink.

use super::{CONTENT_TYPE, ResultSink};
use crate::error::SinkError;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use tracing::{debug, instrument};

/// Writes artifacts into a single bucket.
#[derive(Debug, Clone)]
pub struct S3Sink {
    client: Client,
    bucket: String,
}

impl S3Sink {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

impl ResultSink for S3Sink {
    fn backend(&self) -> &'static str {
        "S3"
    }

    #[instrument(level = "info", skip(self, body), fields(bucket = %self.bucket))]
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<String, SinkError> {
        debug!(bytes = body.len(), "PutObject");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(CONTENT_TYPE)
            .send()
            .await
            .map_err(|e| SinkError::Upload(DisplayErrorContext(&e).to_string()))?;
        Ok(self.location(key))
    }
}
