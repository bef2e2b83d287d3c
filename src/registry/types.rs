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

//! Type inspection functions

use std::sync::Arc;

use super::builder::FunctionBuilder;
use super::{FunctionCategory, FunctionContext, FunctionRegistry};
use crate::core::{Result, type_name};
use crate::register_function;
use serde_json::Value;

/// Predicate names paired with the type name they test for
const TYPE_PREDICATES: &[(&str, &str)] = &[
    ("isString", "string"),
    ("isNumber", "number"),
    ("isBoolean", "boolean"),
    ("isArray", "array"),
    ("isObject", "object"),
    ("isNull", "null"),
    ("isUndefined", "undefined"),
];

impl FunctionRegistry {
    pub fn register_type_functions(&self) -> Result<()> {
        register_function!(
            self,
            "type",
            category: FunctionCategory::Type,
            description: "Type name: undefined, null, boolean, number, string, array or object",
            parameters: ["value": "any" => "Value to inspect"],
            return_type: "string",
            examples: ["{{type(payload)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(type_name(context.arg(0)).to_string())))
            }
        )?;

        for &(name, expected) in TYPE_PREDICATES {
            FunctionBuilder::new(name, FunctionCategory::Type)
                .description(format!("True when the value's type is {expected}"))
                .parameter("value", Some("any".to_string()), "Value to test")
                .return_type("boolean")
                .example(format!("{{{{{name}(value)}}}}"))
                .register_sync(
                    self,
                    Arc::new(move |context: &FunctionContext| -> Result<Option<Value>> {
                        Ok(Some(Value::Bool(type_name(context.arg(0)) == expected)))
                    }),
                )?;
        }
        Ok(())
    }
}
