//! Resolver configuration

/// Configuration for [`Resolver`](super::Resolver)
///
/// # Examples
///
/// ```rust
/// use ptf_template::evaluator::ResolverConfig;
///
/// let config = ResolverConfig::default()
///     .with_max_depth(5)
///     .with_throw_on_undefined(true)
///     .with_delimiters("<%", "%>");
/// assert_eq!(config.max_depth, 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Deepest nested re-resolution allowed before `DepthExceeded`. Default: 10
    pub max_depth: usize,

    /// Fail the whole `resolve` call on the first unresolved placeholder
    /// instead of leaving it in place. Default: false
    pub throw_on_undefined: bool,

    /// Memoize resolved templates inside the resolver. Default: true
    pub enable_cache: bool,

    /// Capacity of the memo; 0 disables it. Default: 1000
    pub cache_size: usize,

    /// Default: `{{`
    pub open_delimiter: String,

    /// Default: `}}`
    pub close_delimiter: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            throw_on_undefined: false,
            enable_cache: true,
            cache_size: 1000,
            open_delimiter: "{{".to_string(),
            close_delimiter: "}}".to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_throw_on_undefined(mut self, enabled: bool) -> Self {
        self.throw_on_undefined = enabled;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.enable_cache = enabled;
        self
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    pub fn with_delimiters(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.open_delimiter = open.into();
        self.close_delimiter = close.into();
        self
    }

    /// Strict configuration: unresolved placeholders are errors
    pub fn strict() -> Self {
        Self::default().with_throw_on_undefined(true)
    }

    /// Configuration for unit tests: no memoization, shallow depth
    pub fn for_testing() -> Self {
        Self {
            max_depth: 5,
            enable_cache: false,
            cache_size: 0,
            ..Self::default()
        }
    }

    /// Whether the memo should be created at all
    pub fn memoization_enabled(&self) -> bool {
        self.enable_cache && self.cache_size > 0
    }

    /// Warnings for settings that will not behave as expected
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.open_delimiter.is_empty() || self.close_delimiter.is_empty() {
            warnings.push("empty delimiters disable placeholder scanning".to_string());
        }
        if self.max_depth == 0 {
            warnings.push("max_depth 0 forbids nested placeholder values".to_string());
        }
        if self.enable_cache && self.cache_size == 0 {
            warnings.push("cache enabled with size 0; memoization is off".to_string());
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.max_depth, 10);
        assert!(!config.throw_on_undefined);
        assert!(config.memoization_enabled());
        assert_eq!(config.open_delimiter, "{{");
        assert_eq!(config.close_delimiter, "}}");
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_builders_and_presets() {
        let config = ResolverConfig::new().with_cache_size(0);
        assert!(!config.memoization_enabled());
        assert_eq!(config.validate().len(), 1);

        assert!(ResolverConfig::strict().throw_on_undefined);
        let testing = ResolverConfig::for_testing();
        assert!(!testing.memoization_enabled());
        assert!(testing.validate().is_empty());

        let custom = ResolverConfig::default().with_delimiters("", "}}").with_max_depth(0);
        assert_eq!(custom.validate().len(), 2);
    }
}
