//! Object storage for generated files.
//!
//! Objects are addressed by slash-separated keys (`DISCHARGE_SUMMARY/<uuid>.pdf`).
//! [`LocalObjectStorage`] keeps them under a filesystem root with a JSON
//! sidecar recording the content type, and issues HMAC-signed, expiring
//! download URLs.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid signed URL: {0}")]
    InvalidSignedUrl(String),

    #[error("signed URL expired at {0}")]
    Expired(i64),

    #[error("signing failed: {0}")]
    Signing(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Bytes plus the content type they were stored with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Binary object store.
pub trait ObjectStorage: Send + Sync {
    fn put_object(&self, key: &str, bytes: &[u8], content_type: &str) -> StorageResult<()>;

    fn get_object(&self, key: &str) -> StorageResult<StoredObject>;

    /// Download URL for `key`, valid for `ttl`.
    fn signed_url(&self, key: &str, ttl: Duration) -> StorageResult<String>;

    /// Upload the contents of a local file.
    fn put_file(&self, key: &str, path: &Path, content_type: &str) -> StorageResult<()> {
        let bytes = fs::read(path)?;
        self.put_object(key, &bytes, content_type)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ObjectMeta {
    content_type: String,
    size: u64,
    stored_at: DateTime<Utc>,
}

/// Filesystem-backed object storage.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: String,
    signing_secret: Vec<u8>,
}

impl LocalObjectStorage {
    pub fn new<P: Into<PathBuf>>(root: P, public_base_url: &str, signing_secret: &[u8]) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            signing_secret: signing_secret.to_vec(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn meta_path(object_path: &Path) -> PathBuf {
        let mut name = object_path.as_os_str().to_owned();
        name.push(".meta.json");
        PathBuf::from(name)
    }

    fn signature(&self, key: &str, expires: i64) -> StorageResult<String> {
        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| StorageError::Signing(e.to_string()))?;
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Signed URL expiring `ttl` after `now`.
    pub fn signed_url_at(&self, key: &str, ttl: Duration, now: DateTime<Utc>) -> StorageResult<String> {
        self.object_path(key)?;
        let ttl_secs = i64::try_from(ttl.as_secs())
            .map_err(|_| StorageError::Signing(format!("ttl too large: {:?}", ttl)))?;
        let expires = now
            .timestamp()
            .checked_add(ttl_secs)
            .ok_or_else(|| StorageError::Signing(format!("ttl too large: {:?}", ttl)))?;
        let signature = self.signature(key, expires)?;
        Ok(format!(
            "{}/{}?expires={}&signature={}",
            self.public_base_url, key, expires, signature
        ))
    }

    /// Check a URL issued by this store and return the object key it grants.
    pub fn verify_signed_url(&self, url: &str, now: DateTime<Utc>) -> StorageResult<String> {
        let invalid = || StorageError::InvalidSignedUrl(url.to_string());

        let rest = url
            .strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(invalid)?;
        let (key, query) = rest.split_once('?').ok_or_else(invalid)?;

        let mut expires = None;
        let mut signature = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", value)) => expires = value.parse::<i64>().ok(),
                Some(("signature", value)) => signature = Some(value),
                _ => {}
            }
        }
        let expires = expires.ok_or_else(invalid)?;
        let signature = hex::decode(signature.ok_or_else(invalid)?).map_err(|_| invalid())?;

        let mut mac = HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| StorageError::Signing(e.to_string()))?;
        mac.update(key.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac.verify_slice(&signature).map_err(|_| invalid())?;

        if now.timestamp() >= expires {
            return Err(StorageError::Expired(expires));
        }
        Ok(key.to_string())
    }
}

/// Write and flush to disk before returning.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

impl ObjectStorage for LocalObjectStorage {
    fn put_object(&self, key: &str, bytes: &[u8], content_type: &str) -> StorageResult<()> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        write_synced(&path, bytes)?;

        let meta = ObjectMeta {
            content_type: content_type.to_string(),
            size: bytes.len() as u64,
            stored_at: Utc::now(),
        };
        write_synced(&Self::meta_path(&path), &serde_json::to_vec_pretty(&meta)?)?;

        tracing::debug!(key, size = bytes.len(), content_type, "stored object");
        Ok(())
    }

    fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        let path = self.object_path(key)?;
        if !path.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }
        let bytes = fs::read(&path)?;
        let content_type = match fs::read(Self::meta_path(&path)) {
            Ok(raw) => serde_json::from_slice::<ObjectMeta>(&raw)?.content_type,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                "application/octet-stream".to_string()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(StoredObject {
            bytes,
            content_type,
        })
    }

    fn signed_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        self.signed_url_at(key, ttl, Utc::now())
    }
}
