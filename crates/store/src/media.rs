//! Image object storage.
//!
//! Objects live under a bucket and are addressed by a store-generated name
//! (UUID plus the original file extension), so names never contain path
//! syntax. The filesystem backend keeps `<root>/<bucket>/<name>`; the
//! in-memory backend is for tests and database-less runs. `put` returns the
//! public URL the record should carry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult, lock_poisoned};

pub const PRODUCT_IMAGES_BUCKET: &str = "product-images";
pub const CUSTOMER_IMAGES_BUCKET: &str = "customer-images";

/// A stored object ready to be served.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

pub enum MediaStore {
    InMemory(InMemoryMedia),
    Filesystem(FilesystemMedia),
}

impl MediaStore {
    pub fn in_memory(public_base_url: impl Into<String>) -> Self {
        Self::InMemory(InMemoryMedia::new(public_base_url))
    }

    pub fn filesystem(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self::Filesystem(FilesystemMedia::new(root, public_base_url))
    }

    /// Store an object and return its public URL.
    pub async fn put(&self, bucket: &str, name: &str, bytes: Vec<u8>) -> StoreResult<String> {
        match self {
            MediaStore::InMemory(store) => store.put(bucket, name, bytes),
            MediaStore::Filesystem(store) => store.put(bucket, name, bytes).await,
        }
    }

    pub async fn get(&self, bucket: &str, name: &str) -> StoreResult<Option<StoredObject>> {
        match self {
            MediaStore::InMemory(store) => store.get(bucket, name),
            MediaStore::Filesystem(store) => store.get(bucket, name).await,
        }
    }
}

pub struct InMemoryMedia {
    objects: RwLock<HashMap<(String, String), Vec<u8>>>,
    public_base_url: String,
}

impl InMemoryMedia {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            public_base_url: public_base_url.into(),
        }
    }

    fn put(&self, bucket: &str, name: &str, bytes: Vec<u8>) -> StoreResult<String> {
        if !valid_component(bucket) || !valid_component(name) {
            return Err(StoreError::backend(format!(
                "invalid object path: {}/{}",
                bucket, name
            )));
        }
        let mut objects = self.objects.write().map_err(|_| lock_poisoned())?;
        objects.insert((bucket.to_string(), name.to_string()), bytes);
        Ok(public_url(&self.public_base_url, bucket, name))
    }

    fn get(&self, bucket: &str, name: &str) -> StoreResult<Option<StoredObject>> {
        if !valid_component(bucket) || !valid_component(name) {
            return Ok(None);
        }
        let objects = self.objects.read().map_err(|_| lock_poisoned())?;
        Ok(objects
            .get(&(bucket.to_string(), name.to_string()))
            .map(|bytes| StoredObject {
                content_type: content_type_for(name).to_string(),
                bytes: bytes.clone(),
            }))
    }
}

pub struct FilesystemMedia {
    root: PathBuf,
    public_base_url: String,
}

impl FilesystemMedia {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    async fn put(&self, bucket: &str, name: &str, bytes: Vec<u8>) -> StoreResult<String> {
        if !valid_component(bucket) || !valid_component(name) {
            return Err(StoreError::backend(format!(
                "invalid object path: {}/{}",
                bucket, name
            )));
        }
        let dir = self.root.join(bucket);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StoreError::backend(format!("failed to create {}: {}", dir.display(), e)))?;
        let path = dir.join(name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::backend(format!("failed to write {}: {}", path.display(), e)))?;
        Ok(public_url(&self.public_base_url, bucket, name))
    }

    async fn get(&self, bucket: &str, name: &str) -> StoreResult<Option<StoredObject>> {
        if !valid_component(bucket) || !valid_component(name) {
            return Ok(None);
        }
        let path = self.root.join(bucket).join(name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(StoredObject {
                content_type: content_type_for(name).to_string(),
                bytes,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::backend(format!(
                "failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

/// Store-generated object name: a fresh UUID carrying over the original
/// file extension (lowercased) when it has a plain one.
pub fn object_name(original: &str) -> String {
    let id = uuid::Uuid::now_v7();
    match Path::new(original).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{}.{}", id, ext.to_lowercase())
        }
        _ => id.to_string(),
    }
}

/// Content type by file extension; unknown extensions are served as raw
/// bytes.
pub fn content_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// Bucket and object names are single path components. Anything that could
// escape the bucket directory is refused outright.
fn valid_component(s: &str) -> bool {
    !s.is_empty() && s != "." && s != ".." && !s.contains('/') && !s.contains('\\')
}

fn public_url(base: &str, bucket: &str, name: &str) -> String {
    format!("{}/uploads/{}/{}", base.trim_end_matches('/'), bucket, name)
}
