//! Function registry for placeholder expressions
//!
//! Built-in functions live in a [`FunctionRegistry`] populated once by
//! [`FunctionRegistry::register_default_functions`]. The resolver consults
//! three tiers in fixed order: built-ins, context functions, then
//! transformers registered on the resolver. The first match wins and there
//! is no overloading by arity or type.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::core::{Result, TemplateError, stringify, to_number};

pub mod builder;
pub mod collection;
pub mod conditional;
pub mod datetime;
pub mod defaults;
pub mod encoding;
pub mod fake;
pub mod hash;
pub mod math;
pub mod object;
pub mod string;
pub mod types;

#[cfg(test)]
mod tests;

#[cfg(test)]
mod string_tests;

#[cfg(test)]
mod math_tests;

#[cfg(test)]
mod datetime_tests;


#[derive(Debug, Clone)]
pub struct FunctionMetadata {
    pub name: String,
    pub category: FunctionCategory,
    pub description: String,
    pub parameters: Vec<ParameterMetadata>,
    pub return_type: Option<String>,
    pub examples: Vec<String>,
    /// Deterministic with no side effects; results may be memoized
    pub is_pure: bool,
}

#[derive(Debug, Clone)]
pub struct ParameterMetadata {
    pub name: String,
    pub type_constraint: Option<String>,
    pub is_optional: bool,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCategory {
    String,
    Math,
    DateTime,
    Encoding,
    Hash,
    Identifier,
    Collection,
    Object,
    Conditional,
    Type,
    FakeData,
    Custom,
}

/// Evaluates sub-expressions on behalf of higher-order built-ins
///
/// `filter` and `map` use this to evaluate their expression argument once per
/// element inside a child scope, so the element bindings never leak into the
/// caller's context.
pub trait ScopedEvaluator {
    /// Evaluate `expression` with `bindings` shadowing outer variables
    fn evaluate_scoped(
        &self,
        expression: &str,
        bindings: Vec<(String, Value)>,
    ) -> Result<Option<Value>>;
}

/// Function execution context
pub struct FunctionContext<'a> {
    /// Name the function was invoked under
    pub name: &'a str,
    /// Evaluated arguments; `None` marks an undefined argument
    pub arguments: &'a [Option<Value>],
    pub evaluator: &'a dyn ScopedEvaluator,
}

/// Function signature shared by every registry tier
pub type SyncFunction = Arc<dyn Fn(&FunctionContext) -> Result<Option<Value>> + Send + Sync>;

impl<'a> FunctionContext<'a> {
    pub fn new(
        name: &'a str,
        arguments: &'a [Option<Value>],
        evaluator: &'a dyn ScopedEvaluator,
    ) -> Self {
        Self {
            name,
            arguments,
            evaluator,
        }
    }

    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }

    /// Argument `index`, `None` when missing or undefined
    pub fn arg(&self, index: usize) -> Option<&Value> {
        self.arguments.get(index).and_then(Option::as_ref)
    }

    /// Every defined argument from `start` onwards
    pub fn rest(&self, start: usize) -> impl Iterator<Item = &Value> {
        self.arguments.iter().skip(start).filter_map(Option::as_ref)
    }

    pub fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::invalid_argument(self.name, message)
    }

    pub fn require(&self, index: usize) -> Result<&Value> {
        self.arg(index)
            .ok_or_else(|| self.error(format!("argument {} is required", index + 1)))
    }

    /// Argument coerced to text
    pub fn string(&self, index: usize) -> Result<String> {
        self.require(index).map(stringify)
    }

    pub fn opt_string(&self, index: usize) -> Option<String> {
        self.arg(index).map(stringify)
    }

    /// Argument coerced to a number
    pub fn number(&self, index: usize) -> Result<f64> {
        let value = self.require(index)?;
        to_number(value).ok_or_else(|| {
            self.error(format!(
                "argument {} is not a number: {}",
                index + 1,
                stringify(value)
            ))
        })
    }

    pub fn opt_number(&self, index: usize) -> Result<Option<f64>> {
        match self.arg(index) {
            Some(_) => self.number(index).map(Some),
            None => Ok(None),
        }
    }

    /// Optional non-negative count, rejected when it is not finite or above `max`
    pub fn opt_count(&self, index: usize, default: usize, max: usize) -> Result<usize> {
        let Some(count) = self.opt_number(index)? else {
            return Ok(default);
        };
        if !count.is_finite() || count > max as f64 {
            return Err(self.error(format!(
                "argument {} must be between 0 and {max}, got {count}",
                index + 1
            )));
        }
        Ok(count.max(0.0) as usize)
    }

    pub fn array(&self, index: usize) -> Result<&Vec<Value>> {
        match self.require(index)? {
            Value::Array(items) => Ok(items),
            other => Err(self.error(format!(
                "argument {} must be an array, got {}",
                index + 1,
                crate::core::type_name(Some(other))
            ))),
        }
    }

    pub fn object(&self, index: usize) -> Result<&Map<String, Value>> {
        match self.require(index)? {
            Value::Object(map) => Ok(map),
            other => Err(self.error(format!(
                "argument {} must be an object, got {}",
                index + 1,
                crate::core::type_name(Some(other))
            ))),
        }
    }
}

/// Thread-safe function registry with metadata support
pub struct FunctionRegistry {
    functions: RwLock<HashMap<String, (SyncFunction, FunctionMetadata)>>,
}

impl FunctionRegistry {
    /// Create an empty registry; see [`FunctionRegistry::default`] for built-ins
    pub fn new() -> Self {
        Self {
            functions: RwLock::new(HashMap::new()),
        }
    }

    pub fn register_sync_function(
        &self,
        name: impl Into<String>,
        function: SyncFunction,
        metadata: FunctionMetadata,
    ) -> Result<()> {
        let name = name.into();
        let mut functions = self.functions.write();
        if functions.contains_key(&name) {
            return Err(TemplateError::duplicate_function(name));
        }
        functions.insert(name, (function, metadata));
        Ok(())
    }

    pub fn get_function(&self, name: &str) -> Option<SyncFunction> {
        self.functions
            .read()
            .get(name)
            .map(|(function, _)| function.clone())
    }

    pub fn get_function_metadata(&self, name: &str) -> Option<FunctionMetadata> {
        self.functions
            .read()
            .get(name)
            .map(|(_, metadata)| metadata.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }

    /// Unknown names count as impure so callers never memoize them
    pub fn is_pure(&self, name: &str) -> bool {
        self.functions
            .read()
            .get(name)
            .is_some_and(|(_, metadata)| metadata.is_pure)
    }

    pub fn len(&self) -> usize {
        self.functions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.read().is_empty()
    }

    pub fn list_functions(&self) -> Vec<FunctionMetadata> {
        let mut functions: Vec<_> = self
            .functions
            .read()
            .values()
            .map(|(_, metadata)| metadata.clone())
            .collect();
        functions.sort_by(|a, b| a.name.cmp(&b.name));
        functions
    }

    pub fn list_functions_by_category(&self, category: FunctionCategory) -> Vec<FunctionMetadata> {
        self.list_functions()
            .into_iter()
            .filter(|metadata| metadata.category == category)
            .collect()
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        let registry = Self::new();
        registry
            .register_default_functions()
            .expect("Failed to register default functions");
        registry
    }
}

static STANDARD_REGISTRY: Lazy<Arc<FunctionRegistry>> =
    Lazy::new(|| Arc::new(FunctionRegistry::default()));

/// Shared registry holding every built-in function
///
/// Built once per process; it is never mutated after construction so every
/// resolver can hold a clone of the same `Arc`.
pub fn standard_registry() -> Arc<FunctionRegistry> {
    STANDARD_REGISTRY.clone()
}
