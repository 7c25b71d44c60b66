//! Local directory sink.
//!
//! Mirrors the bucket layout on disk so a local run produces the same key
//! it would in S3:
//!
//! ```text
//! local_output_dir/
//! └── <bucket>/
//!     └── reddit_insights_20250506_140309.json
//! ```

use super::ResultSink;
use crate::error::SinkError;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct LocalSink {
    dir: PathBuf,
}

impl LocalSink {
    /// Sink writing under `<root>/<bucket>/`.
    pub fn new(root: impl AsRef<Path>, bucket: &str) -> Self {
        Self {
            dir: root.as_ref().join(bucket),
        }
    }
}

impl ResultSink for LocalSink {
    fn backend(&self) -> &'static str {
        "local directory"
    }

    #[instrument(level = "info", skip(self, body), fields(dir = %self.dir.display()))]
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<String, SinkError> {
        if let Err(e) = fs::create_dir_all(&self.dir).await {
            error!(error = %e, "Failed to create output dir");
            return Err(e.into());
        }

        let path = self.dir.join(key);
        fs::write(&path, body).await?;
        info!(path = %path.display(), "Wrote insights file");

        let absolute = fs::canonicalize(&path).await.unwrap_or(path);
        Ok(format!("file://{}", absolute.display()))
    }
}
