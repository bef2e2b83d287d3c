//! Date and time functions
//!
//! Months and years are fixed-length intervals (30 and 365 days). Dates are
//! exchanged as RFC 3339 strings in UTC.

use super::{FunctionCategory, FunctionContext, FunctionRegistry};
use crate::core::{Result, number, stringify};
use crate::register_function;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

static FORMAT_TOKENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"YYYY|YY|MM|DD|HH|mm|ss|SSS").expect("valid regex"));

/// Date helpers used by the date built-ins
pub struct DateTimeUtils;

impl DateTimeUtils {
    /// Milliseconds in one unit, `None` for unknown units
    pub fn unit_millis(unit: &str) -> Option<i64> {
        const SECOND: i64 = 1_000;
        const MINUTE: i64 = 60 * SECOND;
        const HOUR: i64 = 60 * MINUTE;
        const DAY: i64 = 24 * HOUR;
        match unit {
            "M" => return Some(30 * DAY),
            "m" => return Some(MINUTE),
            _ => {}
        }
        let millis = match unit.to_ascii_lowercase().as_str() {
            "ms" | "millisecond" | "milliseconds" => 1,
            "s" | "second" | "seconds" => SECOND,
            "minute" | "minutes" => MINUTE,
            "h" | "hour" | "hours" => HOUR,
            "d" | "day" | "days" => DAY,
            "w" | "week" | "weeks" => 7 * DAY,
            "month" | "months" => 30 * DAY,
            "y" | "year" | "years" => 365 * DAY,
            _ => return None,
        };
        Some(millis)
    }

    /// Read a date from an epoch-millisecond number or a date string
    pub fn parse(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single()),
            Value::String(s) => Self::parse_str(s.trim()),
            _ => None,
        }
    }

    pub fn parse_str(text: &str) -> Option<DateTime<Utc>> {
        if text.eq_ignore_ascii_case("now") {
            return Some(Utc::now());
        }
        if let Ok(ms) = text.parse::<i64>() {
            return Utc.timestamp_millis_opt(ms).single();
        }
        if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
            return Some(parsed.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    /// Format with `YYYY YY MM DD HH mm ss SSS` tokens
    pub fn format(date: &DateTime<Utc>, pattern: &str) -> String {
        FORMAT_TOKENS
            .replace_all(pattern, |caps: &Captures| {
                let token = &caps[0];
                let format = match token {
                    "YYYY" => "%Y",
                    "YY" => "%y",
                    "MM" => "%m",
                    "DD" => "%d",
                    "HH" => "%H",
                    "mm" => "%M",
                    "ss" => "%S",
                    _ => return format!("{:03}", date.timestamp_subsec_millis()),
                };
                date.format(format).to_string()
            })
            .into_owned()
    }

    pub fn to_iso(date: &DateTime<Utc>) -> String {
        date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Parse argument `index` as a date, defaulting to now when absent
fn date_arg(context: &FunctionContext, index: usize) -> Result<DateTime<Utc>> {
    match context.arg(index) {
        None => Ok(Utc::now()),
        Some(value) => DateTimeUtils::parse(value)
            .ok_or_else(|| context.error(format!("invalid date: {}", stringify(value)))),
    }
}

fn unit_arg(context: &FunctionContext, index: usize, default: &str) -> Result<i64> {
    let unit = context.opt_string(index).unwrap_or_else(|| default.to_string());
    DateTimeUtils::unit_millis(&unit).ok_or_else(|| context.error(format!("unknown unit '{unit}'")))
}

impl FunctionRegistry {
    pub fn register_datetime_functions(&self) -> Result<()> {
        self.register_clock_functions()?;
        self.register_date_arithmetic_functions()?;
        self.register_date_format_functions()?;
        Ok(())
    }

    fn register_clock_functions(&self) -> Result<()> {
        register_function!(
            self,
            "now",
            category: FunctionCategory::DateTime,
            description: "Current time as an RFC 3339 UTC string",
            parameters: [],
            return_type: "string",
            examples: ["{{now()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::String(DateTimeUtils::to_iso(&Utc::now()))))
            }
        )?;

        register_function!(
            self,
            "timestamp",
            category: FunctionCategory::DateTime,
            description: "Current time in milliseconds since the Unix epoch",
            parameters: [],
            return_type: "number",
            examples: ["{{timestamp()}}"],
            pure: false,
            implementation: |_context: &FunctionContext| -> Result<Option<Value>> {
                Ok(Some(Value::from(Utc::now().timestamp_millis())))
            }
        )?;

        register_function!(
            self,
            "date",
            category: FunctionCategory::DateTime,
            description: "Current date formatted with the given pattern (default YYYY-MM-DD)",
            parameters: ["format?": "string" => "Format pattern"],
            return_type: "string",
            examples: ["{{date()}}", "{{date('DD/MM/YYYY')}}"],
            pure: false,
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let pattern = context.opt_string(0).unwrap_or_else(|| "YYYY-MM-DD".to_string());
                Ok(Some(Value::String(DateTimeUtils::format(&Utc::now(), &pattern))))
            }
        )
    }

    fn register_date_arithmetic_functions(&self) -> Result<()> {
        register_function!(
            self,
            "dateAdd",
            category: FunctionCategory::DateTime,
            description: "Adds an amount of units to a date",
            parameters: [
                "date": "string" => "Start date ('now', RFC 3339, YYYY-MM-DD or epoch ms)",
                "amount": "number" => "Amount to add, may be negative",
                "unit?": "string" => "Unit, defaults to days"
            ],
            return_type: "string",
            examples: ["{{dateAdd('2024-01-01', 7, 'days')}}", "{{dateAdd('now', -1, 'hour')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let date = date_arg(context, 0)?;
                let amount = context.number(1)?;
                let unit = unit_arg(context, 2, "day")?;
                let millis = (amount * unit as f64).round();
                if !millis.is_finite() {
                    return Err(context.error(format!("amount is not finite: {amount}")));
                }
                let shifted = chrono::TimeDelta::try_milliseconds(millis as i64)
                    .and_then(|delta| date.checked_add_signed(delta))
                    .ok_or_else(|| context.error("date out of range"))?;
                Ok(Some(Value::String(DateTimeUtils::to_iso(&shifted))))
            }
        )?;

        register_function!(
            self,
            "dateDiff",
            category: FunctionCategory::DateTime,
            description: "Whole units from the first date to the second, truncated toward zero",
            parameters: [
                "from": "string" => "First date",
                "to": "string" => "Second date",
                "unit?": "string" => "Unit, defaults to days"
            ],
            return_type: "number",
            examples: ["{{dateDiff('2024-01-01', '2024-01-31', 'days')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let from = date_arg(context, 0)?;
                let to = date_arg(context, 1)?;
                let unit = unit_arg(context, 2, "day")?;
                let diff = (to - from).num_milliseconds() as f64 / unit as f64;
                Ok(Some(number(diff.trunc())))
            }
        )
    }

    fn register_date_format_functions(&self) -> Result<()> {
        register_function!(
            self,
            "formatDate",
            category: FunctionCategory::DateTime,
            description: "Formats a date with YYYY/YY/MM/DD/HH/mm/ss/SSS tokens",
            parameters: ["date": "string" => "Date to format", "format?": "string" => "Pattern, defaults to YYYY-MM-DD"],
            return_type: "string",
            examples: ["{{formatDate(createdAt, 'YYYY/MM/DD HH:mm')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let date = date_arg(context, 0)?;
                let pattern = context.opt_string(1).unwrap_or_else(|| "YYYY-MM-DD".to_string());
                Ok(Some(Value::String(DateTimeUtils::format(&date, &pattern))))
            }
        )?;

        register_function!(
            self,
            "parseDate",
            category: FunctionCategory::DateTime,
            description: "Parses a date string or epoch milliseconds into an RFC 3339 UTC string",
            parameters: ["value": "string" => "Date text"],
            return_type: "string",
            examples: ["{{parseDate('2024-03-05')}}"],
            implementation: |context: &FunctionContext| -> Result<Option<Value>> {
                let value = context.require(0)?;
                let date = DateTimeUtils::parse(value)
                    .ok_or_else(|| context.error(format!("invalid date: {}", stringify(value))))?;
                Ok(Some(Value::String(DateTimeUtils::to_iso(&date))))
            }
        )
    }
}
