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

//! Conditional functions
//!
//! Arguments are evaluated before the call, so both branches of `if` are
//! computed; only the selected one is returned.

use super::{FunctionCategory, FunctionContext, FunctionRegistry};
use crate::core::{Result, is_truthy, values_equal};
use crate::register_function;
use serde_json::Value;

impl FunctionRegistry {
    pub fn register_conditional_functions(&self) -> Result<()> {
        register_function!(
            self,
            "if",
            category: FunctionCategory::Conditional,
            description: "Returns `then` when the condition is truthy, otherwise `else`",
            parameters: [
                "condition": "any" => "Condition",
                "then": "any" => "Value when truthy",
                "else?": "any" => "Value when falsy"
            ],
            return_type: "any",
            examples: ["{{if(isAdmin, 'admin', 'user')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let branch = if is_truthy(context.arg(0)) { 1 } else { 2 };
                Ok(context.arg(branch).cloned())
            }
        )?;

        register_function!(
            self,
            "switch",
            category: FunctionCategory::Conditional,
            description: "Matches a value against case/result pairs; a trailing odd argument is the default",
            parameters: [
                "value": "any" => "Value to match",
                "cases": "any" => "Alternating case and result arguments, optionally followed by a default"
            ],
            return_type: "any",
            examples: ["{{switch(status, 200, 'ok', 404, 'missing', 'other')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let subject = context.arg(0);
                let pairs = &context.arguments[context.len().min(1)..];
                let mut chunks = pairs.chunks_exact(2);
                for pair in chunks.by_ref() {
                    let matched = match (subject, pair[0].as_ref()) {
                        (Some(a), Some(b)) => values_equal(a, b),
                        (None, None) => true,
                        _ => false,
                    };
                    if matched {
                        return Ok(pair[1].clone());
                    }
                }
                Ok(chunks.remainder().first().cloned().flatten())
            }
        )?;

        register_function!(
            self,
            "default",
            category: FunctionCategory::Conditional,
            description: "Returns the value unless it is undefined or null, otherwise the fallback",
            parameters: ["value": "any" => "Candidate value", "fallback": "any" => "Fallback value"],
            return_type: "any",
            examples: ["{{default(user.nickname, 'anonymous')}}", "{{nickname | default('n/a')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                match context.arg(0) {
                    None | Some(Value::Null) => Ok(context.arg(1).cloned()),
                    Some(value) => Ok(Some(value.clone())),
                }
            }
        )?;

        register_function!(
            self,
            "exists",
            category: FunctionCategory::Conditional,
            description: "True when the value is neither undefined nor null",
            parameters: ["value": "any" => "Value to test"],
            return_type: "boolean",
            examples: ["{{exists(response.body.id)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let exists = !matches!(context.arg(0), None | Some(Value::Null));
                Ok(Some(Value::Bool(exists)))
            }
        )
    }
}
