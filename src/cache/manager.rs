//! Disk-backed response cache
//!
//! Provides a `ResponseCache` that stores raw API response bodies as JSON files
//! with expiry timestamps derived from the response's cache headers.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use super::expiry::derive_expiration;
use crate::config::StorageRoot;

/// Errors that can occur when reading or writing cache entries
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache directory or an entry file could not be accessed
    #[error("Cache storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An entry file exists but does not contain a valid entry
    #[error("Failed to decode cache entry {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// An entry could not be serialized for writing
    #[error("Failed to encode cache entry {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// The response body, exactly as received
    pub data: String,
    /// When the data was cached
    pub cached_at: DateTime<Utc>,
    /// When the cache entry expires
    pub expires_at: DateTime<Utc>,
}

/// Outcome of looking up a fingerprint
#[derive(Debug)]
pub enum CacheLookup {
    /// A valid, unexpired entry
    Fresh(CacheEntry),
    /// No entry is stored for the fingerprint
    Absent,
    /// The entry was past its expiry and has been removed
    Expired,
    /// The entry could not be read or decoded
    Corrupt(CacheError),
}

impl CacheLookup {
    /// Collapses the outcome to the cached payload, treating everything but a
    /// fresh entry as a miss
    pub fn into_payload(self) -> Option<String> {
        match self {
            CacheLookup::Fresh(entry) => Some(entry.data),
            CacheLookup::Absent | CacheLookup::Expired | CacheLookup::Corrupt(_) => None,
        }
    }
}

/// Manages reading and writing cached API responses to disk
///
/// Each entry is a JSON file named after its fingerprint directly under the
/// storage root. Expired entries are deleted the first time they are read.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl ResponseCache {
    pub fn new(root: &StorageRoot) -> Self {
        Self {
            cache_dir: root.path().to_path_buf(),
        }
    }

    /// Creates a cache over a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the path to a cache file for the given fingerprint
    pub fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", fingerprint))
    }

    /// Reads the payload for `fingerprint`, or `None` on any kind of miss
    ///
    /// With `bypass` set this is an unconditional miss and leaves the stored
    /// entry untouched.
    pub fn read(&self, fingerprint: &str, bypass: bool) -> Option<String> {
        self.read_at(fingerprint, bypass, Utc::now())
    }

    /// Same as [`ResponseCache::read`] with an explicit current instant
    pub fn read_at(&self, fingerprint: &str, bypass: bool, now: DateTime<Utc>) -> Option<String> {
        if bypass {
            debug!(fingerprint, "cache bypassed");
            return None;
        }

        match self.lookup_at(fingerprint, now) {
            CacheLookup::Corrupt(err) => {
                debug!(fingerprint, error = %err, "ignoring unreadable cache entry");
                None
            }
            lookup => lookup.into_payload(),
        }
    }

    /// Looks up `fingerprint` as of `now`, deleting the entry if it has expired
    pub fn lookup_at(&self, fingerprint: &str, now: DateTime<Utc>) -> CacheLookup {
        let path = self.entry_path(fingerprint);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(fingerprint, "cache miss");
                return CacheLookup::Absent;
            }
            Err(source) => return CacheLookup::Corrupt(CacheError::Storage { path, source }),
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(source) => return CacheLookup::Corrupt(CacheError::Decode { path, source }),
        };

        if now > entry.expires_at {
            debug!(fingerprint, expires_at = %entry.expires_at, "cache entry expired");
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(fingerprint, error = %e, "failed to remove expired cache entry");
                }
            }
            return CacheLookup::Expired;
        }

        debug!(fingerprint, "cache hit");
        CacheLookup::Fresh(entry)
    }

    /// Stores `payload` under `fingerprint`, replacing any previous entry
    ///
    /// The expiry is derived from the response `headers`.
    pub fn write(
        &self,
        fingerprint: &str,
        payload: &str,
        headers: &HeaderMap,
    ) -> Result<(), CacheError> {
        self.write_at(fingerprint, payload, headers, Utc::now())
    }

    /// Same as [`ResponseCache::write`] with an explicit current instant
    pub fn write_at(
        &self,
        fingerprint: &str,
        payload: &str,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        let entry = CacheEntry {
            data: payload.to_string(),
            cached_at: now,
            expires_at: derive_expiration(headers, now),
        };

        let path = self.entry_path(fingerprint);
        let json = serde_json::to_vec(&entry).map_err(|source| CacheError::Encode {
            path: path.clone(),
            source,
        })?;

        write_atomic(&self.cache_dir, &path, &json)
            .map_err(|source| CacheError::Storage { path, source })?;

        debug!(fingerprint, expires_at = %entry.expires_at, "cache entry written");
        Ok(())
    }
}

/// Writes `contents` to `path` via a temporary file in `dir` and a rename,
/// creating `dir` if needed
pub(crate) fn write_atomic(dir: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    let mut temp_file = tempfile::Builder::new()
        .prefix(".tmp-")
        .suffix(".json")
        .tempfile_in(dir)?;
    temp_file.write_all(contents)?;
    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;

    Ok(())
}
