// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cache configuration options

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which entry gives way when the cache is full
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Least recently read or written
    #[default]
    Lru,
    /// Fewest hits; ties go to the earliest inserted
    Lfu,
    /// Earliest inserted
    Fifo,
    /// Oldest `last_access`
    Ttl,
}

impl std::str::FromStr for EvictionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "lfu" => Ok(Self::Lfu),
            "fifo" => Ok(Self::Fifo),
            "ttl" => Ok(Self::Ttl),
            other => Err(format!("unknown eviction policy '{other}'")),
        }
    }
}

/// Where and how entries are written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceConfig {
    pub directory: PathBuf,

    /// Gzip then base64 each file (`.json.gz.b64`) instead of plain `.json`
    pub compress: bool,
}

impl PersistenceConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            compress: false,
        }
    }

    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Configuration for [`ResolutionCache`](super::ResolutionCache)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of entries; 0 stores nothing
    pub max_size: usize,

    /// TTL applied to entries set without their own
    pub default_ttl: Option<Duration>,

    pub policy: EvictionPolicy,

    /// Disk mirror of the in-memory entries
    pub persistence: Option<PersistenceConfig>,
}

impl CacheConfig {
    pub fn new(max_size: usize, policy: EvictionPolicy) -> Self {
        Self {
            max_size,
            policy,
            ..Self::default()
        }
    }

    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    pub fn with_persistence(mut self, persistence: PersistenceConfig) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Create a configuration optimized for high performance
    pub fn high_performance() -> Self {
        Self {
            max_size: 10_000,
            ..Self::default()
        }
    }

    /// Create a configuration optimized for low memory usage
    pub fn low_memory() -> Self {
        Self {
            max_size: 100,
            default_ttl: Some(Duration::from_secs(300)), // 5 minute TTL
            ..Self::default()
        }
    }

    /// Create a configuration for testing
    pub fn testing() -> Self {
        Self {
            max_size: 10,
            default_ttl: Some(Duration::from_millis(100)), // Very short TTL for tests
            ..Self::default()
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1_000,
            default_ttl: None,
            policy: EvictionPolicy::Lru,
            persistence: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.max_size, 1_000);
        assert_eq!(config.default_ttl, None);
        assert_eq!(config.policy, EvictionPolicy::Lru);
        assert!(config.persistence.is_none());
    }

    #[test]
    fn test_cache_config_presets() {
        assert_eq!(CacheConfig::high_performance().max_size, 10_000);
        let low = CacheConfig::low_memory();
        assert_eq!(low.max_size, 100);
        assert_eq!(low.default_ttl, Some(Duration::from_secs(300)));
        assert_eq!(
            CacheConfig::testing().default_ttl,
            Some(Duration::from_millis(100))
        );
    }

    #[test]
    fn test_cache_config_builders() {
        let config = CacheConfig::new(5, EvictionPolicy::Fifo)
            .with_default_ttl(Duration::from_secs(1))
            .with_persistence(PersistenceConfig::new("/tmp/cache").compressed(true));
        assert_eq!(config.max_size, 5);
        assert_eq!(config.policy, EvictionPolicy::Fifo);
        assert!(config.persistence.as_ref().is_some_and(|p| p.compress));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("LFU".parse::<EvictionPolicy>(), Ok(EvictionPolicy::Lfu));
        assert_eq!("ttl".parse::<EvictionPolicy>(), Ok(EvictionPolicy::Ttl));
        assert!("random".parse::<EvictionPolicy>().is_err());
    }
}
