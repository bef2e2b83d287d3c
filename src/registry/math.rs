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

//! Numeric functions

use super::{FunctionCategory, FunctionContext, FunctionRegistry};
use crate::core::{Result, number, to_number};
use crate::register_function;
use rand::Rng;
use serde_json::Value;

/// Arithmetic helpers used by the numeric built-ins
pub struct ArithmeticOperations;

impl ArithmeticOperations {
    /// Round half towards positive infinity at the given number of decimals
    pub fn round(value: f64, decimals: i32) -> f64 {
        let factor = 10f64.powi(decimals);
        (value * factor + 0.5).floor() / factor
    }

    /// Numbers from the arguments, flattening a single array argument
    pub fn collect_numbers(context: &FunctionContext) -> Result<Vec<f64>> {
        let values: Vec<&Value> = match context.arguments {
            [Some(Value::Array(items))] => items.iter().collect(),
            _ => context.rest(0).collect(),
        };
        values
            .into_iter()
            .map(|value| {
                to_number(value).ok_or_else(|| context.error(format!("not a number: {value}")))
            })
            .collect()
    }
}

impl FunctionRegistry {
    pub fn register_math_functions(&self) -> Result<()> {
        self.register_arithmetic_functions()?;
        self.register_rounding_functions()?;
        self.register_extrema_functions()?;
        self.register_random_functions()?;
        Ok(())
    }

    fn register_arithmetic_functions(&self) -> Result<()> {
        register_function!(
            self,
            "add",
            category: FunctionCategory::Math,
            description: "Sums every argument",
            parameters: ["values": "number" => "Numbers to add"],
            return_type: "number",
            examples: ["{{add(2, 3)}}", "{{price | add(tax)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let numbers = ArithmeticOperations::collect_numbers(context)?;
                Ok(Some(number(numbers.iter().sum())))
            }
        )?;

        register_function!(
            self,
            "subtract",
            category: FunctionCategory::Math,
            description: "Subtracts b from a",
            parameters: ["a": "number" => "Minuend", "b": "number" => "Subtrahend"],
            return_type: "number",
            examples: ["{{subtract(10, 4)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(number(context.number(0)? - context.number(1)?)))
            }
        )?;

        register_function!(
            self,
            "multiply",
            category: FunctionCategory::Math,
            description: "Multiplies every argument",
            parameters: ["values": "number" => "Numbers to multiply"],
            return_type: "number",
            examples: ["{{multiply(quantity, unitPrice)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let numbers = ArithmeticOperations::collect_numbers(context)?;
                Ok(Some(number(numbers.iter().product())))
            }
        )?;

        register_function!(
            self,
            "divide",
            category: FunctionCategory::Math,
            description: "Divides a by b; dividing by zero is an error",
            parameters: ["a": "number" => "Dividend", "b": "number" => "Divisor"],
            return_type: "number",
            examples: ["{{divide(total, count)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let divisor = context.number(1)?;
                if divisor == 0.0 {
                    return Err(context.error("division by zero"));
                }
                Ok(Some(number(context.number(0)? / divisor)))
            }
        )?;

        register_function!(
            self,
            "mod",
            category: FunctionCategory::Math,
            description: "Remainder of a divided by b, with the sign of a",
            parameters: ["a": "number" => "Dividend", "b": "number" => "Divisor"],
            return_type: "number",
            examples: ["{{mod(10, 3)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let divisor = context.number(1)?;
                if divisor == 0.0 {
                    return Err(context.error("division by zero"));
                }
                Ok(Some(number(context.number(0)? % divisor)))
            }
        )
    }

    fn register_rounding_functions(&self) -> Result<()> {
        register_function!(
            self,
            "round",
            category: FunctionCategory::Math,
            description: "Rounds to the given number of decimals (default 0)",
            parameters: ["value": "number" => "Number to round", "decimals?": "number" => "Decimal places"],
            return_type: "number",
            examples: ["{{round(2.567, 2)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let decimals = context.opt_number(1)?.unwrap_or(0.0) as i32;
                Ok(Some(number(ArithmeticOperations::round(context.number(0)?, decimals))))
            }
        )?;

        register_function!(
            self,
            "floor",
            category: FunctionCategory::Math,
            description: "Largest integer less than or equal to the value",
            parameters: ["value": "number" => "Number"],
            return_type: "number",
            examples: ["{{floor(2.7)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(number(context.number(0)?.floor())))
            }
        )?;

        register_function!(
            self,
            "ceil",
            category: FunctionCategory::Math,
            description: "Smallest integer greater than or equal to the value",
            parameters: ["value": "number" => "Number"],
            return_type: "number",
            examples: ["{{ceil(2.1)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(number(context.number(0)?.ceil())))
            }
        )?;

        register_function!(
            self,
            "abs",
            category: FunctionCategory::Math,
            description: "Absolute value",
            parameters: ["value": "number" => "Number"],
            return_type: "number",
            examples: ["{{abs(-4)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(number(context.number(0)?.abs())))
            }
        )
    }

    fn register_extrema_functions(&self) -> Result<()> {
        register_function!(
            self,
            "min",
            category: FunctionCategory::Math,
            description: "Smallest argument (or smallest element of a single array argument)",
            parameters: ["values": "number" => "Numbers to compare"],
            return_type: "number",
            examples: ["{{min(3, 1, 2)}}", "{{min(scores)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let numbers = ArithmeticOperations::collect_numbers(context)?;
                Ok(numbers.into_iter().reduce(f64::min).map(number))
            }
        )?;

        register_function!(
            self,
            "max",
            category: FunctionCategory::Math,
            description: "Largest argument (or largest element of a single array argument)",
            parameters: ["values": "number" => "Numbers to compare"],
            return_type: "number",
            examples: ["{{max(3, 1, 2)}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let numbers = ArithmeticOperations::collect_numbers(context)?;
                Ok(numbers.into_iter().reduce(f64::max).map(number))
            }
        )
    }

    fn register_random_functions(&self) -> Result<()> {
        register_function!(
            self,
            "random",
            category: FunctionCategory::Math,
            description: "Random float in [min, max), defaults to [0, 1)",
            parameters: ["min?": "number" => "Lower bound", "max?": "number" => "Upper bound"],
            return_type: "number",
            examples: ["{{random()}}", "{{random(1, 5)}}"],
            pure: false,
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let min = context.opt_number(0)?.unwrap_or(0.0);
                let max = context.opt_number(1)?.unwrap_or(1.0);
                if !min.is_finite() || !max.is_finite() || !(max - min).is_finite() {
                    return Err(context.error(format!("range {min}..{max} is not finite")));
                }
                if max <= min {
                    return Ok(Some(number(min)));
                }
                Ok(Some(number(rand::thread_rng().gen_range(min..max))))
            }
        )?;

        register_function!(
            self,
            "randomInt",
            category: FunctionCategory::Math,
            description: "Random integer between min and max, both inclusive",
            parameters: ["min": "number" => "Lower bound", "max": "number" => "Upper bound"],
            return_type: "number",
            examples: ["{{randomInt(1, 100)}}"],
            pure: false,
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let (min, max) = (context.number(0)?, context.number(1)?);
                if !min.is_finite() || !max.is_finite() {
                    return Err(context.error(format!("range {min}..={max} is not finite")));
                }
                let (min, max) = (min.ceil() as i64, max.floor() as i64);
                if max < min {
                    return Err(context.error(format!("empty range {min}..={max}")));
                }
                Ok(Some(Value::from(rand::thread_rng().gen_range(min..=max))))
            }
        )
    }
}
