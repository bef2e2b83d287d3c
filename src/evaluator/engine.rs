//! AST evaluation against a scope and the three function tiers

use std::borrow::Cow;
use std::cell::Cell;
use std::collections::HashMap;

use serde_json::Value;

use crate::ast::{ExpressionNode, PathData, PathSegment, PipelineStage};
use crate::context::{Namespace, Scope};
use crate::core::{Result, TemplateError, stringify};
use crate::parser::parse_expression;
use crate::registry::{FunctionContext, FunctionRegistry, ScopedEvaluator, SyncFunction};

/// One evaluation pass over an expression tree
///
/// Borrows everything from the owning resolver; child passes for
/// `filter`/`map` share the same registry, transformers and impurity flag
/// but see an extra scope layer.
pub(crate) struct Evaluation<'r> {
    registry: &'r FunctionRegistry,
    transformers: &'r HashMap<String, SyncFunction>,
    scope: Scope<'r>,
    /// Set when an impure (or unknown-purity) function is called
    volatile: &'r Cell<bool>,
    /// Deepest scope a `filter`/`map` expression may open
    max_depth: usize,
}

impl<'r> Evaluation<'r> {
    pub(crate) fn new(
        registry: &'r FunctionRegistry,
        transformers: &'r HashMap<String, SyncFunction>,
        scope: Scope<'r>,
        volatile: &'r Cell<bool>,
        max_depth: usize,
    ) -> Self {
        Self {
            registry,
            transformers,
            scope,
            volatile,
            max_depth,
        }
    }

    pub(crate) fn evaluate(&self, node: &ExpressionNode) -> Result<Option<Value>> {
        match node {
            ExpressionNode::Literal(value) => Ok(Some(value.clone())),
            ExpressionNode::Undefined => Ok(None),
            ExpressionNode::Path(path) => self.evaluate_path(path),
            ExpressionNode::FunctionCall(call) => {
                let arguments = self.evaluate_arguments(&call.args, None)?;
                self.call(&call.name, &arguments)
            }
            ExpressionNode::Pipeline(pipeline) => {
                let mut current = self.evaluate(&pipeline.head)?;
                for stage in &pipeline.stages {
                    let arguments = match stage {
                        PipelineStage::Call(call) => self.evaluate_arguments(&call.args, Some(current))?,
                        PipelineStage::Transformer(_) => vec![current],
                    };
                    current = self.call(stage.name(), &arguments)?;
                }
                Ok(current)
            }
        }
    }

    fn evaluate_arguments(
        &self,
        args: &[ExpressionNode],
        piped: Option<Option<Value>>,
    ) -> Result<Vec<Option<Value>>> {
        let mut arguments = Vec::with_capacity(args.len() + 1);
        if let Some(previous) = piped {
            arguments.push(previous);
        }
        for arg in args {
            arguments.push(self.evaluate(arg)?);
        }
        Ok(arguments)
    }

    /// Dispatch through built-ins, then context functions, then transformers
    fn call(&self, name: &str, arguments: &[Option<Value>]) -> Result<Option<Value>> {
        let function = if let Some(builtin) = self.registry.get_function(name) {
            if !self.registry.is_pure(name) {
                self.volatile.set(true);
            }
            builtin
        } else if let Some(custom) = self
            .scope
            .context()
            .functions
            .get(name)
            .or_else(|| self.transformers.get(name))
        {
            // Purity of caller-supplied functions is unknown
            self.volatile.set(true);
            custom.clone()
        } else {
            return Err(TemplateError::function_not_found(name));
        };

        let context = FunctionContext::new(name, arguments, self);
        function(&context)
    }

    fn evaluate_path(&self, path: &PathData) -> Result<Option<Value>> {
        let namespace = if path.segments.is_empty() {
            Namespace::Variables
        } else {
            Namespace::from_root(&path.root)
        };

        let (root, segments) = match namespace {
            Namespace::Variables => (self.scope.variable(&path.root), &path.segments[..]),
            namespace => {
                let key = match &path.segments[0] {
                    PathSegment::Property(name) => Some(name.clone()),
                    PathSegment::Index(index) => self.evaluate(index)?.map(|key| stringify(&key)),
                };
                let root = key.and_then(|key| self.scope.lookup(namespace, &key));
                (root, &path.segments[1..])
            }
        };

        let Some(root) = root else {
            return Ok(None);
        };

        let mut current: Cow<'_, Value> = Cow::Borrowed(&root);
        for segment in segments {
            let accessor = match segment {
                PathSegment::Property(name) => Accessor::Name(name),
                PathSegment::Index(index) => match self.evaluate(index)? {
                    Some(key) => Accessor::Value(key),
                    None => return Ok(None),
                },
            };
            let next = match current {
                Cow::Borrowed(value) => navigate(value, &accessor),
                Cow::Owned(value) => navigate(&value, &accessor).map(|v| Cow::Owned(v.into_owned())),
            };
            match next {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }
        Ok(Some(current.into_owned()))
    }
}

enum Accessor<'a> {
    /// `.name`
    Name(&'a str),
    /// `[expr]` after evaluation
    Value(Value),
}

/// Single navigation step; `None` short-circuits the rest of the path
fn navigate<'v>(value: &'v Value, accessor: &Accessor<'_>) -> Option<Cow<'v, Value>> {
    match (value, accessor) {
        (Value::Object(map), Accessor::Name(name)) => map.get(*name).map(Cow::Borrowed),
        (Value::Object(map), Accessor::Value(key)) => map.get(&stringify(key)).map(Cow::Borrowed),
        (Value::Array(items), Accessor::Name("length")) => Some(Cow::Owned(Value::from(items.len()))),
        (Value::String(text), Accessor::Name("length")) => {
            Some(Cow::Owned(Value::from(text.chars().count())))
        }
        (Value::Array(items), Accessor::Name(name)) => {
            name.parse::<usize>().ok().and_then(|i| items.get(i)).map(Cow::Borrowed)
        }
        (Value::Array(items), Accessor::Value(key)) => {
            array_index(key).and_then(|i| items.get(i)).map(Cow::Borrowed)
        }
        _ => None,
    }
}

fn array_index(key: &Value) -> Option<usize> {
    match key {
        Value::Number(n) => n.as_u64().map(|i| i as usize).or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as usize)
        }),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    }
}

impl ScopedEvaluator for Evaluation<'_> {
    fn evaluate_scoped(
        &self,
        expression: &str,
        bindings: Vec<(String, Value)>,
    ) -> Result<Option<Value>> {
        let depth = self.scope.depth() + 1;
        if depth > self.max_depth {
            return Err(TemplateError::depth_exceeded(depth, self.max_depth));
        }

        let node = parse_expression(expression)?;
        let child = Evaluation {
            registry: self.registry,
            transformers: self.transformers,
            scope: self.scope.child(bindings),
            volatile: self.volatile,
            max_depth: self.max_depth,
        };
        child.evaluate(&node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::registry::standard_registry;
    use serde_json::json;

    fn eval(context: &Context, expression: &str) -> Result<Option<Value>> {
        let registry = standard_registry();
        let transformers = HashMap::new();
        let volatile = Cell::new(false);
        let evaluation = Evaluation::new(&registry, &transformers, Scope::root(context), &volatile, 10);
        evaluation.evaluate(&parse_expression(expression)?)
    }

    fn context() -> Context {
        Context::empty().with_variables([
            ("user", json!({"profile": {"age": 30, "tags": ["a", "b"]}, "nickname": null})),
            ("items", json!([{"id": 1}, {"id": 2}, {"id": 3}])),
            ("i", json!(1)),
            ("key", json!("profile")),
        ])
    }

    #[test]
    fn test_path_walk() {
        let context = context();
        assert_eq!(eval(&context, "user.profile.age").unwrap(), Some(json!(30)));
        assert_eq!(eval(&context, "user.profile.tags[1]").unwrap(), Some(json!("b")));
        assert_eq!(eval(&context, "user.profile.tags.0").unwrap(), Some(json!("a")));
        assert_eq!(eval(&context, "items[i].id").unwrap(), Some(json!(2)));
        assert_eq!(eval(&context, "user[key].age").unwrap(), Some(json!(30)));
        assert_eq!(eval(&context, "user['profile']['age']").unwrap(), Some(json!(30)));
        assert_eq!(eval(&context, "items.length").unwrap(), Some(json!(3)));
    }

    #[test]
    fn test_missing_and_null_intermediates_short_circuit() {
        let context = context();
        assert_eq!(eval(&context, "user.nickname.first").unwrap(), None);
        assert_eq!(eval(&context, "user.missing.deep.path").unwrap(), None);
        assert_eq!(eval(&context, "items[10].id").unwrap(), None);
        assert_eq!(eval(&context, "items[-1]").unwrap(), None);
        assert_eq!(eval(&context, "nobody").unwrap(), None);
        assert_eq!(eval(&context, "user.nickname").unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_namespaces_route_only_with_segments() {
        let mut context = context().with_env([("TOKEN", "t-1")]);
        context.variables.insert("env".into(), json!("plain variable"));
        context
            .responses
            .insert("last".into(), json!({"body": {"id": 7}}));
        assert_eq!(eval(&context, "env.TOKEN").unwrap(), Some(json!("t-1")));
        assert_eq!(eval(&context, "env['TOKEN']").unwrap(), Some(json!("t-1")));
        assert_eq!(eval(&context, "env").unwrap(), Some(json!("plain variable")));
        assert_eq!(eval(&context, "responses.last.body.id").unwrap(), Some(json!(7)));
        assert_eq!(eval(&context, "response.last.body.id").unwrap(), Some(json!(7)));
        assert_eq!(eval(&context, "env.MISSING").unwrap(), None);
    }

    #[test]
    fn test_pipeline_threads_previous_result() {
        let context = Context::empty().with_variables([("name", json!("world"))]);
        assert_eq!(eval(&context, "name | uppercase").unwrap(), Some(json!("WORLD")));
        assert_eq!(
            eval(&context, "name | concat('!') | uppercase").unwrap(),
            Some(json!("WORLD!"))
        );
        assert_eq!(
            eval(&context, "'a|b' | split('|') | join('-')").unwrap(),
            Some(json!("a-b"))
        );
    }

    #[test]
    fn test_unknown_function_is_error() {
        let err = eval(&Context::empty(), "nope(1)").unwrap_err();
        assert!(matches!(err, TemplateError::FunctionNotFound { .. }));
    }

    #[test]
    fn test_impure_call_marks_volatile() {
        let context = Context::empty();
        let registry = standard_registry();
        let transformers = HashMap::new();
        let volatile = Cell::new(false);
        let evaluation = Evaluation::new(&registry, &transformers, Scope::root(&context), &volatile, 10);

        evaluation.evaluate(&parse_expression("add(1, 2)").unwrap()).unwrap();
        assert!(!volatile.get());
        evaluation.evaluate(&parse_expression("uuid()").unwrap()).unwrap();
        assert!(volatile.get());
    }

    #[test]
    fn test_filter_and_map_use_child_scope() {
        let context = context();
        assert_eq!(
            eval(&context, "map(filter(items, 'item.id'), 'multiply(item.id, 10)')").unwrap(),
            Some(json!([10, 20, 30]))
        );
        assert_eq!(
            eval(&context, "map(items, 'add(index, i)')").unwrap(),
            Some(json!([1, 2, 3]))
        );
        assert!(!context.variables.contains_key("item"));
    }
}
