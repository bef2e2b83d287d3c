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

//! Resolution context
//!
//! A [`Context`] holds the layered data a resolver reads from: user
//! variables, an environment snapshot, context-tier functions, captured
//! responses, cookies, headers and free-form metadata. Each resolver owns
//! its own context; nothing here is global.
//!
//! [`Scope`] layers local bindings over a context without mutating it. The
//! `filter`/`map` built-ins evaluate their per-element expression in a child
//! scope so `item` and `index` never leak into the caller's variables.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::SyncFunction;

/// Data source selected by the first segment of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Variables,
    Env,
    Responses,
    Cookies,
    Headers,
    Metadata,
}

impl Namespace {
    /// Namespace for a path root; plural and singular prefixes are aliases
    ///
    /// Only meaningful when the root is followed by at least one segment:
    /// a bare `env` is an ordinary variable name.
    pub fn from_root(root: &str) -> Namespace {
        match root {
            "env" => Namespace::Env,
            "response" | "responses" => Namespace::Responses,
            "cookie" | "cookies" => Namespace::Cookies,
            "header" | "headers" => Namespace::Headers,
            "meta" | "metadata" => Namespace::Metadata,
            _ => Namespace::Variables,
        }
    }
}

/// Layered data available to placeholder expressions
#[derive(Clone, Default)]
pub struct Context {
    pub variables: HashMap<String, Value>,
    /// Process environment captured when the context was created
    pub env: HashMap<String, String>,
    /// Context tier of the function registry, consulted after built-ins
    pub functions: HashMap<String, SyncFunction>,
    pub responses: HashMap<String, Value>,
    pub cookies: HashMap<String, String>,
    pub headers: HashMap<String, String>,
    pub metadata: HashMap<String, Value>,
}

impl Context {
    /// Context with a snapshot of the current process environment
    pub fn new() -> Self {
        Self {
            env: std::env::vars().collect(),
            ..Self::default()
        }
    }

    /// Context with no environment variables
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_variables<I, K>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.variables
            .extend(variables.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    pub fn with_env<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(env.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Look `key` up in a namespace; a miss is `None`, never an error
    pub fn lookup(&self, namespace: Namespace, key: &str) -> Option<Value> {
        match namespace {
            Namespace::Variables => self.variables.get(key).cloned(),
            Namespace::Env => self.env.get(key).cloned().map(Value::String),
            Namespace::Responses => self.responses.get(key).cloned(),
            Namespace::Cookies => self.cookies.get(key).cloned().map(Value::String),
            Namespace::Headers => self
                .headers
                .get(key)
                .or_else(|| {
                    self.headers
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case(key))
                        .map(|(_, value)| value)
                })
                .cloned()
                .map(Value::String),
            Namespace::Metadata => self.metadata.get(key).cloned(),
        }
    }

    /// Serializable copy of variables, cookies, headers and metadata
    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            variables: sorted_pairs(&self.variables),
            cookies: sorted_pairs(&self.cookies),
            headers: sorted_pairs(&self.headers),
            metadata: sorted_pairs(&self.metadata),
        }
    }

    /// Replace variables, cookies, headers and metadata with the snapshot's
    pub fn restore(&mut self, snapshot: ContextSnapshot) {
        self.variables = snapshot.variables.into_iter().collect();
        self.cookies = snapshot.cookies.into_iter().collect();
        self.headers = snapshot.headers.into_iter().collect();
        self.metadata = snapshot.metadata.into_iter().collect();
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&String> = self.functions.keys().collect();
        functions.sort();
        f.debug_struct("Context")
            .field("variables", &self.variables)
            .field("env", &format_args!("<{} entries>", self.env.len()))
            .field("functions", &functions)
            .field("responses", &self.responses)
            .field("cookies", &self.cookies)
            .field("headers", &self.headers)
            .field("metadata", &self.metadata)
            .finish()
    }
}

fn sorted_pairs<V: Clone>(map: &HashMap<String, V>) -> Vec<(String, V)> {
    let mut pairs: Vec<(String, V)> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

/// Exported context state as key/value pair lists, sorted by key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextSnapshot {
    pub variables: Vec<(String, Value)>,
    pub cookies: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub metadata: Vec<(String, Value)>,
}

/// Evaluation scope: local bindings over a parent scope or the context
///
/// Plain names resolve innermost binding first, then context variables.
/// Namespaced lookups always go to the context.
pub struct Scope<'a> {
    context: &'a Context,
    parent: Option<&'a Scope<'a>>,
    bindings: HashMap<String, Value>,
}

impl<'a> Scope<'a> {
    pub fn root(context: &'a Context) -> Self {
        Self {
            context,
            parent: None,
            bindings: HashMap::new(),
        }
    }

    /// New innermost scope whose bindings shadow this one
    pub fn child<'b>(&'b self, bindings: Vec<(String, Value)>) -> Scope<'b>
    where
        'a: 'b,
    {
        Scope {
            context: self.context,
            parent: Some(self),
            bindings: bindings.into_iter().collect(),
        }
    }

    pub fn context(&self) -> &'a Context {
        self.context
    }

    pub fn depth(&self) -> usize {
        self.parent.map_or(0, |parent| parent.depth() + 1)
    }

    /// Plain variable lookup through the scope chain
    pub fn variable(&self, name: &str) -> Option<Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.bindings.get(name) {
                return Some(value.clone());
            }
            scope = current.parent;
        }
        self.context.variables.get(name).cloned()
    }

    pub fn lookup(&self, namespace: Namespace, key: &str) -> Option<Value> {
        match namespace {
            Namespace::Variables => self.variable(key),
            other => self.context.lookup(other, key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Context {
        let mut context = Context::empty()
            .with_variables([("user", json!({"name": "Ada"})), ("count", json!(3))])
            .with_env([("API_KEY", "secret")]);
        context.headers.insert("Content-Type".into(), "application/json".into());
        context.cookies.insert("session".into(), "abc".into());
        context.responses.insert("last".into(), json!({"status": 200}));
        context.metadata.insert("suite".into(), json!("smoke"));
        context
    }

    #[test]
    fn test_namespace_routing() {
        assert_eq!(Namespace::from_root("env"), Namespace::Env);
        assert_eq!(Namespace::from_root("response"), Namespace::Responses);
        assert_eq!(Namespace::from_root("responses"), Namespace::Responses);
        assert_eq!(Namespace::from_root("cookies"), Namespace::Cookies);
        assert_eq!(Namespace::from_root("header"), Namespace::Headers);
        assert_eq!(Namespace::from_root("meta"), Namespace::Metadata);
        assert_eq!(Namespace::from_root("environment"), Namespace::Variables);
    }

    #[test]
    fn test_lookup() {
        let context = sample();
        assert_eq!(context.lookup(Namespace::Env, "API_KEY"), Some(json!("secret")));
        assert_eq!(context.lookup(Namespace::Env, "MISSING"), None);
        assert_eq!(
            context.lookup(Namespace::Headers, "content-type"),
            Some(json!("application/json"))
        );
        assert_eq!(context.lookup(Namespace::Cookies, "session"), Some(json!("abc")));
        assert_eq!(
            context.lookup(Namespace::Responses, "last"),
            Some(json!({"status": 200}))
        );
        assert_eq!(context.lookup(Namespace::Metadata, "suite"), Some(json!("smoke")));
        assert_eq!(context.lookup(Namespace::Variables, "count"), Some(json!(3)));
    }

    #[test]
    fn test_new_captures_process_environment() {
        let context = Context::new();
        let expected: HashMap<String, String> = std::env::vars().collect();
        assert_eq!(context.env.len(), expected.len());
        assert!(Context::empty().env.is_empty());
    }

    #[test]
    fn test_child_scope_shadows_without_leaking() {
        let context = sample();
        let root = Scope::root(&context);
        let child = root.child(vec![("count".into(), json!(10)), ("item".into(), json!(1))]);
        let grandchild = child.child(vec![("item".into(), json!(2))]);

        assert_eq!(grandchild.variable("item"), Some(json!(2)));
        assert_eq!(grandchild.variable("count"), Some(json!(10)));
        assert_eq!(grandchild.variable("user"), Some(json!({"name": "Ada"})));
        assert_eq!(grandchild.depth(), 2);

        assert_eq!(root.variable("item"), None);
        assert_eq!(root.variable("count"), Some(json!(3)));
        assert!(!context.variables.contains_key("item"));
    }

    #[test]
    fn test_snapshot_roundtrip_is_sorted() {
        let context = sample();
        let snapshot = context.snapshot();
        assert_eq!(snapshot.variables[0].0, "count");
        assert_eq!(snapshot.variables[1].0, "user");

        let text = serde_json::to_string(&snapshot).unwrap();
        let parsed: ContextSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, snapshot);

        let mut restored = Context::empty();
        restored.variables.insert("stale".into(), json!(true));
        restored.restore(parsed);
        assert!(!restored.variables.contains_key("stale"));
        assert_eq!(restored.cookies.get("session").map(String::as_str), Some("abc"));
        assert!(restored.responses.is_empty());
    }

    #[test]
    fn test_debug_hides_environment_values() {
        let rendered = format!("{:?}", sample());
        assert!(rendered.contains("<1 entries>"));
        assert!(!rendered.contains("secret"));
    }
}
