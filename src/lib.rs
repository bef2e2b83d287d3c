//! Placeholder resolution for parameterized HTTP requests and test data
//!
//! Templates carry `{{...}}` placeholders: variable paths, function calls,
//! JSON literals and pipelines. A [`Resolver`] evaluates them against a
//! [`Context`] and a catalog of built-in functions; [`SyntaxNormalizer`]
//! rewrites the legacy `${...}` dialect; [`ResolutionCache`] stores resolved
//! results with pluggable eviction and optional persistence.
//!
//! ```rust
//! use ptf_template::{Resolver, SyntaxNormalizer};
//! use serde_json::json;
//!
//! let mut resolver = Resolver::new();
//! resolver.set_variable("user", json!({"name": "Ada"}));
//! let template = SyntaxNormalizer::normalize("Hi ${testData.user.name}");
//! assert_eq!(resolver.resolve(&template).unwrap(), "Hi Ada");
//! ```

pub mod ast;
pub mod cache;
pub mod context;
pub mod core;
pub mod evaluator;
pub mod normalizer;
pub mod parser;
pub mod registry;

// Re-export main types
pub use cache::{
    CacheConfig, CacheEntry, CacheSnapshot, CacheStats, EntryOptions, EvictionPolicy,
    PersistenceConfig, ResolutionCache,
};
pub use context::{Context, ContextSnapshot, Namespace};
pub use crate::core::{ErrorCode, Result, TemplateError};
pub use evaluator::{Resolver, ResolverConfig};
pub use normalizer::{SyntaxNormalizer, SyntaxValidation};
pub use parser::parse_expression as parse;
pub use registry::{FunctionContext, FunctionRegistry, standard_registry};
