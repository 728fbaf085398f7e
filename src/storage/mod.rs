//! In-memory bucket/object store backing the gateway handlers.
//!
//! The accounting layer only needs a working storage collaborator to wrap;
//! durability and S3 feature fidelity are out of scope here. `DashMap`
//! keeps the store safe for concurrent request tasks without explicit locks.

use axum::body::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("bucket {0:?} does not exist")]
    NoSuchBucket(String),

    #[error("key {0:?} does not exist")]
    NoSuchKey(String),

    #[error("bucket {0:?} already exists")]
    BucketExists(String),

    #[error("bucket {0:?} is not empty")]
    BucketNotEmpty(String),
}

/// Concurrent in-memory object store.
#[derive(Debug, Default)]
pub struct ObjectStore {
    buckets: DashMap<String, DashMap<String, Bytes>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_bucket(&self, name: &str) -> Result<(), StoreError> {
        match self.buckets.entry(name.to_string()) {
            Entry::Occupied(_) => Err(StoreError::BucketExists(name.to_string())),
            Entry::Vacant(v) => {
                v.insert(DashMap::new());
                Ok(())
            }
        }
    }

    pub fn delete_bucket(&self, name: &str) -> Result<(), StoreError> {
        {
            let bucket = self
                .buckets
                .get(name)
                .ok_or_else(|| StoreError::NoSuchBucket(name.to_string()))?;
            if !bucket.is_empty() {
                return Err(StoreError::BucketNotEmpty(name.to_string()));
            }
        }
        self.buckets.remove_if(name, |_, objects| objects.is_empty());
        Ok(())
    }

    pub fn list_buckets(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn list_objects(&self, bucket: &str) -> Result<Vec<String>, StoreError> {
        let bucket = self
            .buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        let mut keys: Vec<String> = bucket.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    pub fn put_object(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StoreError> {
        let bucket = self
            .buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        bucket.insert(key.to_string(), data);
        Ok(())
    }

    pub fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let bucket = self
            .buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        bucket
            .get(key)
            .map(|e| e.value().clone())
            .ok_or_else(|| StoreError::NoSuchKey(key.to_string()))
    }

    /// Object size in bytes, for HEAD responses.
    pub fn head_object(&self, bucket: &str, key: &str) -> Result<u64, StoreError> {
        self.get_object(bucket, key).map(|data| data.len() as u64)
    }

    /// Deleting a missing key succeeds, matching S3 semantics.
    pub fn delete_object(&self, bucket: &str, key: &str) -> Result<(), StoreError> {
        let bucket = self
            .buckets
            .get(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket(bucket.to_string()))?;
        bucket.remove(key);
        Ok(())
    }
}
