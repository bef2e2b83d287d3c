//! Object functions

use super::{FunctionCategory, FunctionContext, FunctionRegistry};
use crate::core::{Result, stringify};
use crate::register_function;
use serde_json::{Map, Value};

/// Key names from every argument after the object, flattening arrays
fn key_arguments(context: &FunctionContext) -> Vec<String> {
    context
        .rest(1)
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>(),
            other => vec![stringify(other)],
        })
        .collect()
}

impl FunctionRegistry {
    pub fn register_object_functions(&self) -> Result<()> {
        register_function!(
            self,
            "keys",
            category: FunctionCategory::Object,
            description: "Keys of an object in insertion order",
            parameters: ["object": "object" => "Source object"],
            return_type: "array",
            examples: ["{{keys(user)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let keys = context.object(0)?.keys().cloned().map(Value::String).collect();
                Ok(Some(Value::Array(keys)))
            }
        )?;

        register_function!(
            self,
            "values",
            category: FunctionCategory::Object,
            description: "Values of an object in insertion order",
            parameters: ["object": "object" => "Source object"],
            return_type: "array",
            examples: ["{{values(user)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let values = context.object(0)?.values().cloned().collect();
                Ok(Some(Value::Array(values)))
            }
        )?;

        register_function!(
            self,
            "entries",
            category: FunctionCategory::Object,
            description: "Key/value pairs of an object as two-element arrays",
            parameters: ["object": "object" => "Source object"],
            return_type: "array",
            examples: ["{{entries(headers)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let entries = context
                    .object(0)?
                    .iter()
                    .map(|(key, value)| Value::Array(vec![Value::String(key.clone()), value.clone()]))
                    .collect();
                Ok(Some(Value::Array(entries)))
            }
        )?;

        register_function!(
            self,
            "merge",
            category: FunctionCategory::Object,
            description: "Shallow merge; later objects override earlier keys",
            parameters: ["objects": "object" => "Objects to merge"],
            return_type: "object",
            examples: ["{{merge(defaults, overrides)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let mut merged = Map::new();
                for (position, value) in context.rest(0).enumerate() {
                    match value {
                        Value::Object(map) => {
                            merged.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
                        }
                        Value::Null => {}
                        other => {
                            return Err(context.error(format!(
                                "argument {} must be an object, got {}",
                                position + 1,
                                crate::core::type_name(Some(other))
                            )));
                        }
                    }
                }
                Ok(Some(Value::Object(merged)))
            }
        )?;

        register_function!(
            self,
            "pick",
            category: FunctionCategory::Object,
            description: "Copy of the object restricted to the given keys",
            parameters: ["object": "object" => "Source object", "keys": "string" => "Keys to keep"],
            return_type: "object",
            examples: ["{{pick(user, 'id', 'name')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let source = context.object(0)?;
                let picked = key_arguments(context)
                    .into_iter()
                    .filter_map(|key| source.get(&key).cloned().map(|value| (key, value)))
                    .collect();
                Ok(Some(Value::Object(picked)))
            }
        )?;

        register_function!(
            self,
            "omit",
            category: FunctionCategory::Object,
            description: "Copy of the object without the given keys",
            parameters: ["object": "object" => "Source object", "keys": "string" => "Keys to drop"],
            return_type: "object",
            examples: ["{{omit(user, 'password')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let dropped = key_arguments(context);
                let kept = context
                    .object(0)?
                    .iter()
                    .filter(|(key, _)| !dropped.contains(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect();
                Ok(Some(Value::Object(kept)))
            }
        )
    }
}
