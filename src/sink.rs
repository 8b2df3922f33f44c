use std::path::Path;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use object_store::ObjectStore;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::PutPayload;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::runtime::Runtime;
use tracing::info;

use crate::error::WriteError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteReceipt {
    pub path: String,
    pub bytes: usize,
    pub sha256: String,
}

pub trait SinkWriter: Send + Sync {
    /// `season` is `None` for season-independent tables.
    fn write(
        &self,
        batch: &RecordBatch,
        table: &str,
        season: Option<u16>,
    ) -> Result<WriteReceipt, WriteError>;
}

pub fn object_path(prefix: &str, table: &str, season: Option<u16>) -> String {
    let file = match season {
        Some(season) => format!("{table}_{season}.parquet"),
        None => format!("{table}.parquet"),
    };
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        file
    } else {
        format!("{prefix}/{file}")
    }
}

pub fn encode_parquet(batch: &RecordBatch, table: &str) -> Result<Bytes, WriteError> {
    let encode = |source| WriteError::Encode {
        table: table.to_string(),
        source,
    };
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props)).map_err(encode)?;
    writer.write(batch).map_err(encode)?;
    writer.close().map_err(encode)?;
    Ok(Bytes::from(buffer))
}

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Writes parquet objects to any `object_store` backend. Uploads are driven
/// on a private current-thread runtime so callers stay synchronous.
pub struct ObjectStoreSink {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    runtime: Runtime,
}

impl ObjectStoreSink {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Result<Self, WriteError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(WriteError::Runtime)?;
        Ok(Self {
            store,
            prefix: prefix.into(),
            runtime,
        })
    }

    /// Accepts `gs://bucket/prefix`, `file:///abs/dir` or a bare directory
    /// path. Other schemes, `memory://` included, are rejected: nothing would
    /// read back what was written there.
    pub fn from_root(root: &str, credentials: Option<&Path>) -> Result<Self, WriteError> {
        let root = root.trim();
        if let Some(rest) = root.strip_prefix("gs://") {
            let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                return Err(WriteError::InvalidRoot(root.to_string()));
            }
            let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
            if let Some(path) = credentials {
                builder = builder.with_service_account_path(path.to_string_lossy());
            }
            let store = builder.build().map_err(|source| WriteError::Auth {
                root: root.to_string(),
                source,
            })?;
            return Self::new(Arc::new(store), prefix);
        }
        let dir = root.strip_prefix("file://").unwrap_or(root);
        if dir.is_empty() || (root.contains("://") && !root.starts_with("file://")) {
            return Err(WriteError::InvalidRoot(root.to_string()));
        }
        std::fs::create_dir_all(dir).map_err(|source| WriteError::LocalDir {
            path: dir.to_string(),
            source,
        })?;
        let store = LocalFileSystem::new_with_prefix(dir).map_err(|source| WriteError::Auth {
            root: root.to_string(),
            source,
        })?;
        Self::new(Arc::new(store), "")
    }
}

impl SinkWriter for ObjectStoreSink {
    fn write(
        &self,
        batch: &RecordBatch,
        table: &str,
        season: Option<u16>,
    ) -> Result<WriteReceipt, WriteError> {
        let path = object_path(&self.prefix, table, season);
        let payload = encode_parquet(batch, table)?;
        let receipt = WriteReceipt {
            path: path.clone(),
            bytes: payload.len(),
            sha256: sha256_hex(&payload),
        };

        let location = ObjectPath::from(path.as_str());
        self.runtime
            .block_on(self.store.put(&location, PutPayload::from_bytes(payload)))
            .map_err(|source| WriteError::Upload { path, source })?;

        info!(
            table,
            path = %receipt.path,
            rows = batch.num_rows(),
            bytes = receipt.bytes,
            sha256 = %receipt.sha256,
            "wrote table"
        );
        Ok(receipt)
    }
}
