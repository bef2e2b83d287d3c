//! Cache entries and their integrity checksum

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// A cached value with bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub key: String,
    pub value: V,
    /// When the entry was written; TTL counts from here
    pub timestamp: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
    pub hits: u64,
    /// SHA-256 hex over the JSON serialization of `value`
    pub checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl<V: Serialize> CacheEntry<V> {
    pub fn new(key: impl Into<String>, value: V) -> Self {
        let now = Utc::now();
        let checksum = checksum(&value);
        Self {
            key: key.into(),
            value,
            timestamp: now,
            last_access: now,
            hits: 0,
            checksum,
            ttl_ms: None,
            tags: Vec::new(),
            metadata: None,
        }
    }

    /// Recompute the checksum and compare it with the stored one
    pub fn is_intact(&self) -> bool {
        checksum(&self.value) == self.checksum
    }
}

impl<V> CacheEntry<V> {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.ttl_ms {
            Some(ttl) => {
                let age = now.signed_duration_since(self.timestamp).num_milliseconds();
                age >= 0 && age as u64 >= ttl
            }
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub(crate) fn touch(&mut self) {
        self.hits += 1;
        self.last_access = Utc::now();
    }
}

/// Optional settings for [`ResolutionCache::set_with`](super::ResolutionCache::set_with)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryOptions {
    /// Overrides the cache's default TTL
    pub ttl: Option<std::time::Duration>,
    pub tags: Vec<String>,
    pub metadata: Option<Value>,
}

impl EntryOptions {
    pub fn ttl(mut self, ttl: std::time::Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

pub(crate) fn checksum<V: Serialize>(value: &V) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    hex::encode(Sha256::digest(&bytes))
}
