//! Cache statistics

use serde::{Deserialize, Serialize};

/// Counters reported by [`ResolutionCache::stats`](super::ResolutionCache::stats)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    /// `hits / (hits + misses)`, 0 before the first lookup
    pub hit_rate: f64,
}

impl CacheStats {
    pub(crate) fn hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} entries, {} hits, {} misses, {} evictions ({:.1}% hit rate)",
            self.size,
            self.max_size,
            self.hits,
            self.misses,
            self.evictions,
            self.hit_rate * 100.0
        )
    }
}
