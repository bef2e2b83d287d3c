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

//! Array functions
//!
//! `filter` and `map` take their per-element expression as a string and
//! evaluate it through [`ScopedEvaluator`](super::ScopedEvaluator) with
//! `item` and `index` bound in a child scope.

use std::cmp::Ordering;

use super::{FunctionCategory, FunctionContext, FunctionRegistry};
use crate::core::{Result, is_truthy, stringify, values_equal};
use crate::register_function;
use serde_json::Value;

pub struct CollectionUtils;

impl CollectionUtils {
    /// Resolve a possibly negative `Array.prototype.slice` bound
    pub fn slice_bound(bound: f64, len: usize) -> usize {
        if bound.is_nan() {
            return 0;
        }
        let len_f = len as f64;
        let resolved = if bound < 0.0 { (len_f + bound).max(0.0) } else { bound.min(len_f) };
        resolved as usize
    }

    /// Numbers order numerically, everything else by its text
    pub fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(Value::Number(x)), Some(Value::Number(y))) => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
            (Some(x), Some(y)) => stringify(x).cmp(&stringify(y)),
        }
    }

    /// Run `expression` once per element with `item` and `index` bound
    pub fn each_scoped(
        context: &FunctionContext,
        items: &[Value],
        expression: &str,
    ) -> Result<Vec<Option<Value>>> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                context.evaluator.evaluate_scoped(
                    expression,
                    vec![
                        ("item".to_string(), item.clone()),
                        ("index".to_string(), Value::from(index)),
                    ],
                )
            })
            .collect()
    }
}

impl FunctionRegistry {
    pub fn register_collection_functions(&self) -> Result<()> {
        self.register_access_functions()?;
        self.register_reorder_functions()?;
        self.register_higher_order_functions()?;
        Ok(())
    }

    fn register_access_functions(&self) -> Result<()> {
        register_function!(
            self,
            "first",
            category: FunctionCategory::Collection,
            description: "First element of an array (undefined when empty)",
            parameters: ["items": "array" => "Source array"],
            return_type: "any",
            examples: ["{{first(items)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(context.array(0)?.first().cloned())
            }
        )?;

        register_function!(
            self,
            "last",
            category: FunctionCategory::Collection,
            description: "Last element of an array (undefined when empty)",
            parameters: ["items": "array" => "Source array"],
            return_type: "any",
            examples: ["{{items | last}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(context.array(0)?.last().cloned())
            }
        )?;

        register_function!(
            self,
            "slice",
            category: FunctionCategory::Collection,
            description: "Elements from start (inclusive) to end (exclusive); negative bounds count from the end",
            parameters: [
                "items": "array" => "Source array or text",
                "start": "number" => "Start index",
                "end?": "number" => "End index"
            ],
            return_type: "array",
            examples: ["{{slice(items, 1, 3)}}", "{{slice(items, -2)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let start = context.number(1)?;
                let end = context.opt_number(2)?;
                if let Some(Value::String(text)) = context.arg(0) {
                    let chars: Vec<char> = text.chars().collect();
                    let from = CollectionUtils::slice_bound(start, chars.len());
                    let to = end.map_or(chars.len(), |e| CollectionUtils::slice_bound(e, chars.len()));
                    let sliced: String = chars.get(from..to.max(from)).unwrap_or_default().iter().collect();
                    return Ok(Some(Value::String(sliced)));
                }
                let items = context.array(0)?;
                let from = CollectionUtils::slice_bound(start, items.len());
                let to = end.map_or(items.len(), |e| CollectionUtils::slice_bound(e, items.len()));
                let sliced = items.get(from..to.max(from)).unwrap_or_default().to_vec();
                Ok(Some(Value::Array(sliced)))
            }
        )
    }

    fn register_reorder_functions(&self) -> Result<()> {
        register_function!(
            self,
            "reverse",
            category: FunctionCategory::Collection,
            description: "Array (or text) in reverse order",
            parameters: ["items": "array" => "Source array or text"],
            return_type: "array",
            examples: ["{{reverse(items)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                if let Some(Value::String(text)) = context.arg(0) {
                    return Ok(Some(Value::String(text.chars().rev().collect())));
                }
                let mut items = context.array(0)?.clone();
                items.reverse();
                Ok(Some(Value::Array(items)))
            }
        )?;

        register_function!(
            self,
            "sort",
            category: FunctionCategory::Collection,
            description: "Stable ascending sort, optionally by an object key",
            parameters: ["items": "array" => "Source array", "key?": "string" => "Property to sort objects by"],
            return_type: "array",
            examples: ["{{sort(scores)}}", "{{sort(users, 'age')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let mut items = context.array(0)?.clone();
                match context.opt_string(1) {
                    Some(key) => items.sort_by(|a, b| {
                        CollectionUtils::compare(a.get(key.as_str()), b.get(key.as_str()))
                    }),
                    None => items.sort_by(|a, b| CollectionUtils::compare(Some(a), Some(b))),
                }
                Ok(Some(Value::Array(items)))
            }
        )?;

        register_function!(
            self,
            "unique",
            category: FunctionCategory::Collection,
            description: "Removes duplicate elements, keeping first occurrences",
            parameters: ["items": "array" => "Source array"],
            return_type: "array",
            examples: ["{{unique(tags)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let mut unique: Vec<Value> = Vec::new();
                for item in context.array(0)? {
                    if !unique.iter().any(|seen| values_equal(seen, item)) {
                        unique.push(item.clone());
                    }
                }
                Ok(Some(Value::Array(unique)))
            }
        )
    }

    fn register_higher_order_functions(&self) -> Result<()> {
        register_function!(
            self,
            "filter",
            category: FunctionCategory::Collection,
            description: "Keeps elements for which the expression is truthy; `item` and `index` are bound",
            parameters: ["items": "array" => "Source array", "expression": "string" => "Predicate expression"],
            return_type: "array",
            examples: ["{{filter(users, 'item.active')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let items = context.array(0)?;
                let expression = context.string(1)?;
                let verdicts = CollectionUtils::each_scoped(context, items, &expression)?;
                let kept = items
                    .iter()
                    .zip(verdicts)
                    .filter(|(_, verdict)| is_truthy(verdict.as_ref()))
                    .map(|(item, _)| item.clone())
                    .collect();
                Ok(Some(Value::Array(kept)))
            }
        )?;

        register_function!(
            self,
            "map",
            category: FunctionCategory::Collection,
            description: "Evaluates the expression for each element; undefined results become null",
            parameters: ["items": "array" => "Source array", "expression": "string" => "Projection expression"],
            return_type: "array",
            examples: ["{{map(users, 'item.name')}}", "{{map(prices, 'multiply(item, 2)')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let items = context.array(0)?;
                let expression = context.string(1)?;
                let mapped = CollectionUtils::each_scoped(context, items, &expression)?
                    .into_iter()
                    .map(|value| value.unwrap_or(Value::Null))
                    .collect();
                Ok(Some(Value::Array(mapped)))
            }
        )
    }
}

