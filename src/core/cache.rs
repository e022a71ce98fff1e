//! On-disk response cache.
//!
//! One JSON file per request, named after a SHA-256 of the request identity.
//! Entries past their expiry are treated as misses and removed.

use crate::domain::model::HttpResponse;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    url: String,
    response: HttpResponse,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ResponseCache {
    dir: PathBuf,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    fn key(url: &str) -> String {
        format!("{:x}", Sha256::digest(format!("GET {}", url).as_bytes()))
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", Self::key(url)))
    }

    /// Cached response for `url`, if present and unexpired.
    pub fn get(&self, url: &str) -> Result<Option<HttpResponse>> {
        self.get_at(url, Utc::now())
    }

    fn get_at(&self, url: &str, now: DateTime<Utc>) -> Result<Option<HttpResponse>> {
        let path = self.entry_path(url);
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(url = %url, "Cache miss");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_slice(&raw)?;
        if entry.url != url {
            debug!(url = %url, "Cache key collision, ignoring entry");
            return Ok(None);
        }
        if now >= entry.expires_at {
            debug!(url = %url, expired_at = %entry.expires_at, "Cache entry expired");
            let _ = std::fs::remove_file(&path);
            return Ok(None);
        }

        debug!(url = %url, cached_at = %entry.created_at, "Cache hit");
        Ok(Some(entry.response))
    }

    pub fn put(&self, url: &str, response: &HttpResponse) -> Result<()> {
        self.put_at(url, response, Utc::now())
    }

    fn put_at(&self, url: &str, response: &HttpResponse, now: DateTime<Utc>) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let entry = CacheEntry {
            url: url.to_string(),
            response: response.clone(),
            created_at: now,
            expires_at: now.checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        std::fs::write(self.entry_path(url), serde_json::to_vec(&entry)?)?;

        debug!(url = %url, ttl_secs = self.ttl.as_secs(), "Cached response");
        Ok(())
    }
}
