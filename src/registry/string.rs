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

//! String functions: case, trimming, slicing, replacement, split/join

use super::{FunctionCategory, FunctionContext, FunctionRegistry};
use crate::core::{Result, stringify};
use crate::register_function;
use serde_json::Value;

/// String utility functions shared by the string built-ins
pub struct StringUtils;

impl StringUtils {
    /// Character-based substring with `String.prototype.substring` clamping:
    /// negative bounds become 0 and swapped bounds are reordered
    pub fn substring(input: &str, start: f64, end: Option<f64>) -> String {
        let len = input.chars().count();
        let clamp = |n: f64| -> usize {
            if n.is_nan() || n < 0.0 {
                0
            } else {
                (n as usize).min(len)
            }
        };
        let mut from = clamp(start);
        let mut to = end.map(clamp).unwrap_or(len);
        if from > to {
            std::mem::swap(&mut from, &mut to);
        }
        input.chars().skip(from).take(to - from).collect()
    }

    /// Upper-case the first character, leave the rest untouched
    pub fn capitalize(input: &str) -> String {
        let mut chars = input.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl FunctionRegistry {
    pub fn register_string_functions(&self) -> Result<()> {
        self.register_case_functions()?;
        self.register_trim_function()?;
        self.register_substring_function()?;
        self.register_replace_function()?;
        self.register_split_function()?;
        self.register_join_function()?;
        self.register_length_function()?;
        self.register_concat_function()?;
        Ok(())
    }

    fn register_case_functions(&self) -> Result<()> {
        register_function!(
            self,
            "uppercase",
            category: FunctionCategory::String,
            description: "Converts the value to upper case",
            parameters: ["value": "string" => "Text to convert"],
            return_type: "string",
            examples: ["{{uppercase('abc')}}", "{{name | uppercase}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(context.string(0)?.to_uppercase())))
            }
        )?;

        register_function!(
            self,
            "lowercase",
            category: FunctionCategory::String,
            description: "Converts the value to lower case",
            parameters: ["value": "string" => "Text to convert"],
            return_type: "string",
            examples: ["{{lowercase('ABC')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(context.string(0)?.to_lowercase())))
            }
        )?;

        register_function!(
            self,
            "capitalize",
            category: FunctionCategory::String,
            description: "Upper-cases the first character",
            parameters: ["value": "string" => "Text to capitalize"],
            return_type: "string",
            examples: ["{{capitalize('hello')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(StringUtils::capitalize(&context.string(0)?))))
            }
        )
    }

    fn register_trim_function(&self) -> Result<()> {
        register_function!(
            self,
            "trim",
            category: FunctionCategory::String,
            description: "Removes leading and trailing whitespace",
            parameters: ["value": "string" => "Text to trim"],
            return_type: "string",
            examples: ["{{trim('  padded  ')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(context.string(0)?.trim().to_string())))
            }
        )
    }

    fn register_substring_function(&self) -> Result<()> {
        register_function!(
            self,
            "substring",
            category: FunctionCategory::String,
            description: "Returns the characters between start (inclusive) and end (exclusive)",
            parameters: [
                "value": "string" => "Source text",
                "start": "number" => "Start index",
                "end?": "number" => "End index, defaults to the end of the text"
            ],
            return_type: "string",
            examples: ["{{substring('abcdef', 1, 3)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let input = context.string(0)?;
                let start = context.number(1)?;
                let end = context.opt_number(2)?;
                Ok(Some(Value::String(StringUtils::substring(&input, start, end))))
            }
        )
    }

    fn register_replace_function(&self) -> Result<()> {
        register_function!(
            self,
            "replace",
            category: FunctionCategory::String,
            description: "Replaces every occurrence of search with replacement",
            parameters: [
                "value": "string" => "Source text",
                "search": "string" => "Text to look for",
                "replacement": "string" => "Replacement text"
            ],
            return_type: "string",
            examples: ["{{replace('a-b-c', '-', '_')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let input = context.string(0)?;
                let search = context.string(1)?;
                let replacement = context.opt_string(2).unwrap_or_default();
                if search.is_empty() {
                    return Ok(Some(Value::String(input)));
                }
                Ok(Some(Value::String(input.replace(&search, &replacement))))
            }
        )
    }

    fn register_split_function(&self) -> Result<()> {
        register_function!(
            self,
            "split",
            category: FunctionCategory::String,
            description: "Splits text into an array on a separator",
            parameters: [
                "value": "string" => "Source text",
                "separator?": "string" => "Separator; without one the text is returned as a single element"
            ],
            return_type: "array",
            examples: ["{{split('a,b,c', ',')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let input = context.string(0)?;
                let parts: Vec<Value> = match context.opt_string(1) {
                    None => vec![Value::String(input)],
                    Some(separator) if separator.is_empty() => input
                        .chars()
                        .map(|c| Value::String(c.to_string()))
                        .collect(),
                    Some(separator) => input
                        .split(separator.as_str())
                        .map(|part| Value::String(part.to_string()))
                        .collect(),
                };
                Ok(Some(Value::Array(parts)))
            }
        )
    }

    fn register_join_function(&self) -> Result<()> {
        register_function!(
            self,
            "join",
            category: FunctionCategory::String,
            description: "Joins array elements into text",
            parameters: [
                "items": "array" => "Elements to join",
                "separator?": "string" => "Separator, defaults to ','"
            ],
            return_type: "string",
            examples: ["{{join(tags, ', ')}}", "{{tags | join('-')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let items = context.array(0)?;
                let separator = context.opt_string(1).unwrap_or_else(|| ",".to_string());
                let joined = items
                    .iter()
                    .map(|item| match item {
                        Value::Null => String::new(),
                        other => stringify(other),
                    })
                    .collect::<Vec<_>>()
                    .join(&separator);
                Ok(Some(Value::String(joined)))
            }
        )
    }

    fn register_length_function(&self) -> Result<()> {
        register_function!(
            self,
            "length",
            category: FunctionCategory::String,
            description: "Number of characters in text, elements in an array or keys in an object",
            parameters: ["value": "any" => "Text, array or object"],
            return_type: "number",
            examples: ["{{length('hello')}}", "{{items | length}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let length = match context.require(0)? {
                    Value::Array(items) => items.len(),
                    Value::Object(map) => map.len(),
                    Value::String(s) => s.chars().count(),
                    other => stringify(other).chars().count(),
                };
                Ok(Some(Value::from(length)))
            }
        )
    }

    fn register_concat_function(&self) -> Result<()> {
        register_function!(
            self,
            "concat",
            category: FunctionCategory::String,
            description: "Concatenates every argument as text",
            parameters: ["values": "any" => "Values to concatenate"],
            return_type: "string",
            examples: ["{{concat(firstName, ' ', lastName)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let joined: String = context.rest(0).map(stringify).collect();
                Ok(Some(Value::String(joined)))
            }
        )
    }
}
