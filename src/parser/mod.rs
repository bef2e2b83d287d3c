//! Placeholder expression parser
//!
//! Converts the body of a placeholder into an [`ExpressionNode`]. Forms are
//! tried in priority order: pipeline, function call, literal, then variable
//! path (dot notation and index access).

pub mod literal;
pub mod scanner;

pub use literal::parse_literal;
pub use scanner::{Placeholder, find_placeholders, matching_bracket, split_top_level};

use crate::ast::{ExpressionNode, FunctionCallData, PathSegment, PipelineStage};
use crate::core::{Result, TemplateError};
use once_cell::sync::Lazy;
use regex::Regex;

/// Function names: identifiers, dots allowed between parts (`faker.name`)
static FUNCTION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*").expect("valid regex")
});

static STAGE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_$][\w$]*(?:\.[A-Za-z_$][\w$]*)*$").expect("valid regex")
});

/// Parse a placeholder body (delimiters already stripped)
pub fn parse_expression(input: &str) -> Result<ExpressionNode> {
    let expression = input.trim();
    if expression.is_empty() {
        return Err(TemplateError::syntax("empty expression"));
    }

    let parts = split_top_level(expression, '|')?;
    if parts.len() == 1 {
        return parse_operand(expression);
    }

    let head = parse_operand(parts[0])?;
    let stages = parts[1..]
        .iter()
        .map(|stage| parse_stage(stage))
        .collect::<Result<Vec<_>>>()?;
    Ok(ExpressionNode::pipeline(head, stages))
}

/// Anything but a pipeline: call, literal or path
fn parse_operand(input: &str) -> Result<ExpressionNode> {
    let expression = input.trim();
    if expression.is_empty() {
        return Err(TemplateError::syntax("empty pipeline stage"));
    }

    if let Some(call) = parse_call(expression)? {
        return Ok(ExpressionNode::FunctionCall(Box::new(call)));
    }

    if let Some(literal) = parse_literal(expression)? {
        return Ok(literal);
    }

    parse_path(expression)
}

fn parse_stage(input: &str) -> Result<PipelineStage> {
    let stage = input.trim();
    if let Some(call) = parse_call(stage)? {
        return Ok(PipelineStage::Call(call));
    }
    if STAGE_NAME.is_match(stage) {
        return Ok(PipelineStage::Transformer(stage.to_string()));
    }
    Err(TemplateError::syntax(format!(
        "invalid pipeline stage '{stage}'"
    )))
}

/// `name(args)` where the paren opened after the name closes at the very end
fn parse_call(expression: &str) -> Result<Option<FunctionCallData>> {
    let Some(name_match) = FUNCTION_NAME.find(expression) else {
        return Ok(None);
    };
    let name = name_match.as_str();
    let rest = &expression[name_match.end()..];
    let open_index = name_match.end() + (rest.len() - rest.trim_start().len());
    if !expression[open_index..].starts_with('(') {
        return Ok(None);
    }
    match matching_bracket(expression, open_index) {
        Some(close_index) if close_index == expression.len() - 1 => {}
        _ => return Ok(None),
    }

    let args = parse_arguments(&expression[open_index + 1..expression.len() - 1])?;
    Ok(Some(FunctionCallData {
        name: name.to_string(),
        args,
    }))
}

/// Split an argument list on top-level commas; literals are parsed directly,
/// everything else re-enters full expression parsing
pub fn parse_arguments(input: &str) -> Result<Vec<ExpressionNode>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(input, ',')?
        .into_iter()
        .map(|arg| {
            let arg = arg.trim();
            if arg.is_empty() {
                return Err(TemplateError::syntax(format!(
                    "empty argument in '({input})'"
                )));
            }
            match parse_literal(arg)? {
                Some(literal) => Ok(literal),
                None => parse_expression(arg),
            }
        })
        .collect()
}

/// `root(.prop | [index])*`
fn parse_path(expression: &str) -> Result<ExpressionNode> {
    let root_end = expression
        .find(['.', '['])
        .unwrap_or(expression.len());
    let root = expression[..root_end].trim();
    if root.is_empty() {
        return Err(TemplateError::syntax(format!(
            "missing variable name in '{expression}'"
        )));
    }

    let mut segments = Vec::new();
    let mut cursor = root_end;
    while cursor < expression.len() {
        let rest = &expression[cursor..];
        if let Some(after_dot) = rest.strip_prefix('.') {
            let len = after_dot.find(['.', '[']).unwrap_or(after_dot.len());
            let property = after_dot[..len].trim();
            if property.is_empty() {
                return Err(TemplateError::syntax(format!(
                    "empty property name in '{expression}'"
                )));
            }
            segments.push(PathSegment::Property(property.to_string()));
            cursor += 1 + len;
        } else if rest.starts_with('[') {
            let close = matching_bracket(expression, cursor).ok_or_else(|| {
                TemplateError::syntax(format!("unclosed '[' in '{expression}'"))
            })?;
            let index = parse_expression(&expression[cursor + 1..close])?;
            segments.push(PathSegment::Index(index));
            cursor = close + 1;
        } else {
            return Err(TemplateError::syntax(format!(
                "unexpected '{rest}' in '{expression}'"
            )));
        }
    }

    Ok(ExpressionNode::path(root, segments))
}
