//! Template resolver
//!
//! The [`Resolver`] scans a template for placeholders, evaluates each body
//! against its owned [`Context`] and substitutes the stringified result.
//! Resolved templates are memoized in a private LRU map; the memo is cleared
//! on every context mutation and never stores templates that called an
//! impure function or left a placeholder unresolved.

use std::cell::Cell;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use log::{debug, trace};
use lru::LruCache;
use serde_json::Value;

use super::config::ResolverConfig;
use super::engine::Evaluation;
use crate::context::{Context, ContextSnapshot, Scope};
use crate::core::{Result, TemplateError, stringify};
use crate::parser::{find_placeholders, parse_expression};
use crate::registry::{FunctionContext, FunctionRegistry, SyncFunction, standard_registry};

/// Placeholder resolver with its own context and memo
///
/// `Send` but not `Sync`: give each concurrent unit of work its own resolver.
///
/// # Examples
///
/// ```rust
/// use ptf_template::Resolver;
/// use serde_json::json;
///
/// let mut resolver = Resolver::new();
/// resolver.set_variable("name", json!("world"));
/// assert_eq!(resolver.resolve("Hello, {{name}}!").unwrap(), "Hello, world!");
/// assert_eq!(resolver.resolve("{{name | uppercase}}").unwrap(), "WORLD");
/// assert_eq!(resolver.resolve("{{add(2, 3)}}").unwrap(), "5");
/// ```
pub struct Resolver {
    config: ResolverConfig,
    registry: Arc<FunctionRegistry>,
    context: Context,
    /// Third registry tier, consulted after built-ins and context functions
    transformers: HashMap<String, SyncFunction>,
    memo: Option<LruCache<String, String>>,
    volatile: Cell<bool>,
    unresolved: Cell<bool>,
}

impl Resolver {
    /// Resolver with default configuration and a snapshot of the process environment
    pub fn new() -> Self {
        Self::with_context(Context::new(), ResolverConfig::default())
    }

    pub fn with_config(config: ResolverConfig) -> Self {
        Self::with_context(Context::new(), config)
    }

    pub fn with_context(context: Context, config: ResolverConfig) -> Self {
        Self::with_registry(context, config, standard_registry())
    }

    /// Use a custom built-in tier instead of the shared standard registry
    pub fn with_registry(
        context: Context,
        config: ResolverConfig,
        registry: Arc<FunctionRegistry>,
    ) -> Self {
        for warning in config.validate() {
            debug!("resolver config: {warning}");
        }
        let memo = if config.memoization_enabled() {
            NonZeroUsize::new(config.cache_size).map(LruCache::new)
        } else {
            None
        };
        Self {
            config,
            registry,
            context,
            transformers: HashMap::new(),
            memo,
            volatile: Cell::new(false),
            unresolved: Cell::new(false),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// Resolve every placeholder in `template`, memoizing the result
    pub fn resolve(&mut self, template: &str) -> Result<String> {
        if let Some(hit) = self.memo.as_mut().and_then(|memo| memo.get(template)) {
            trace!("memo hit for {template:?}");
            return Ok(hit.clone());
        }

        self.volatile.set(false);
        self.unresolved.set(false);
        let resolved = self.resolve_at_depth(template, 0)?;

        if !self.volatile.get() && !self.unresolved.get() {
            if let Some(memo) = self.memo.as_mut() {
                memo.put(template.to_string(), resolved.clone());
            }
        }
        Ok(resolved)
    }

    /// Resolve without consulting the memo, treating `template` as nested `depth` levels deep
    pub fn resolve_at_depth(&self, template: &str, depth: usize) -> Result<String> {
        if depth > self.config.max_depth {
            return Err(TemplateError::depth_exceeded(depth, self.config.max_depth));
        }

        let placeholders = find_placeholders(
            template,
            &self.config.open_delimiter,
            &self.config.close_delimiter,
        );
        if placeholders.is_empty() {
            return Ok(template.to_string());
        }

        let mut output = String::with_capacity(template.len());
        let mut cursor = 0;
        for placeholder in placeholders {
            output.push_str(&template[cursor..placeholder.start]);
            cursor = placeholder.end;

            let raw = placeholder.raw(template);
            match self.substitute(placeholder.body, depth) {
                Ok(text) => output.push_str(&text),
                Err(error) if error.is_fatal() || self.config.throw_on_undefined => {
                    return Err(error);
                }
                Err(error) => {
                    debug!("leaving {raw} unresolved: {error}");
                    self.unresolved.set(true);
                    output.push_str(raw);
                }
            }
        }
        output.push_str(&template[cursor..]);
        Ok(output)
    }

    fn substitute(&self, body: &str, depth: usize) -> Result<String> {
        let value = self
            .evaluate(body)?
            .ok_or_else(|| TemplateError::unresolved(body.trim()))?;
        match value {
            Value::String(text) if text.contains(self.config.open_delimiter.as_str()) => {
                self.resolve_at_depth(&text, depth + 1)
            }
            other => Ok(stringify(&other)),
        }
    }

    /// Evaluate a bare expression body (no delimiters) to its typed value
    pub fn evaluate(&self, expression: &str) -> Result<Option<Value>> {
        let node = parse_expression(expression)?;
        let evaluation = Evaluation::new(
            &self.registry,
            &self.transformers,
            Scope::root(&self.context),
            &self.volatile,
            self.config.max_depth,
        );
        evaluation.evaluate(&node)
    }

    /// Resolve every string leaf of a JSON document; keys are left as-is
    pub fn resolve_value(&mut self, value: &Value) -> Result<Value> {
        Ok(match value {
            Value::String(text) => Value::String(self.resolve(text)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.resolve_value(item))
                    .collect::<Result<_>>()?,
            ),
            Value::Object(map) => {
                let mut resolved = serde_json::Map::with_capacity(map.len());
                for (key, item) in map {
                    resolved.insert(key.clone(), self.resolve_value(item)?);
                }
                Value::Object(resolved)
            }
            other => other.clone(),
        })
    }

    pub fn has_placeholders(&self, text: &str) -> bool {
        !find_placeholders(
            text,
            &self.config.open_delimiter,
            &self.config.close_delimiter,
        )
        .is_empty()
    }

    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.context.variables.insert(name.into(), value.into());
        self.invalidate();
    }

    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        self.context.variables.get(name)
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.invalidate();
        self.context.variables.remove(name)
    }

    /// Register a context-tier function; built-ins with the same name still win
    pub fn set_function<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&FunctionContext) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.context.functions.insert(name.into(), Arc::new(function));
        self.invalidate();
    }

    /// Register a transformer, the last tier consulted by calls and pipeline stages
    pub fn set_transformer<F>(&mut self, name: impl Into<String>, transformer: F)
    where
        F: Fn(&FunctionContext) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.transformers.insert(name.into(), Arc::new(transformer));
        self.invalidate();
    }

    pub fn set_response(&mut self, name: impl Into<String>, response: Value) {
        self.context.responses.insert(name.into(), response);
        self.invalidate();
    }

    pub fn set_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.context.cookies.insert(name.into(), value.into());
        self.invalidate();
    }

    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.context.headers.insert(name.into(), value.into());
        self.invalidate();
    }

    pub fn set_metadata(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.context.metadata.insert(name.into(), value.into());
        self.invalidate();
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Mutable access to the context; the memo is cleared up front
    pub fn context_mut(&mut self) -> &mut Context {
        self.invalidate();
        &mut self.context
    }

    pub fn export_context(&self) -> ContextSnapshot {
        self.context.snapshot()
    }

    /// Replace variables, cookies, headers and metadata from a snapshot
    pub fn import_context(&mut self, snapshot: ContextSnapshot) {
        self.context.restore(snapshot);
        self.invalidate();
    }

    pub fn clear_cache(&mut self) {
        self.invalidate();
    }

    /// Number of memoized templates
    pub fn cache_len(&self) -> usize {
        self.memo.as_ref().map_or(0, LruCache::len)
    }

    fn invalidate(&mut self) {
        if let Some(memo) = self.memo.as_mut() {
            memo.clear();
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut transformers: Vec<&String> = self.transformers.keys().collect();
        transformers.sort();
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("context", &self.context)
            .field("transformers", &transformers)
            .field("memoized", &self.cache_len())
            .finish()
    }
}
