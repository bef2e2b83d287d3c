//! Literal recognition for expression tokens

use crate::ast::ExpressionNode;
use crate::core::{Result, TemplateError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid regex"));

/// Try to read `token` as a literal
///
/// Returns `Ok(None)` when the token is not a literal and should be evaluated
/// as an expression instead. JSON array/object tokens that fail to parse are
/// reported as `MalformedLiteral`.
pub fn parse_literal(token: &str) -> Result<Option<ExpressionNode>> {
    let token = token.trim();

    if let Some(text) = quoted_string(token) {
        return Ok(Some(ExpressionNode::literal(text)));
    }

    if NUMERIC.is_match(token) {
        return Ok(parse_number(token).map(ExpressionNode::Literal));
    }

    match token {
        "true" => return Ok(Some(ExpressionNode::literal(true))),
        "false" => return Ok(Some(ExpressionNode::literal(false))),
        "null" => return Ok(Some(ExpressionNode::Literal(Value::Null))),
        "undefined" => return Ok(Some(ExpressionNode::Undefined)),
        _ => {}
    }

    let is_json = (token.starts_with('[') && token.ends_with(']'))
        || (token.starts_with('{') && token.ends_with('}'));
    if is_json {
        return serde_json::from_str::<Value>(token)
            .map(|value| Some(ExpressionNode::Literal(value)))
            .map_err(|e| TemplateError::malformed_literal(token, e.to_string()));
    }

    Ok(None)
}

/// Inner text of a token wrapped in one pair of matching quotes
///
/// No escape processing: the first repeat of the opening quote must be the
/// final character.
fn quoted_string(token: &str) -> Option<&str> {
    let quote = token.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    if token.len() < 2 || !token.ends_with(quote) {
        return None;
    }
    let inner = &token[1..token.len() - 1];
    if inner.contains(quote) {
        return None;
    }
    Some(inner)
}

fn parse_number(token: &str) -> Option<Value> {
    if !token.contains('.') {
        if let Ok(i) = token.parse::<i64>() {
            return Some(Value::from(i));
        }
    }
    token
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}
