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

//! Low-level scanning helpers
//!
//! Everything here is aware of single/double quoted strings and of
//! `()`, `[]` and `{}` nesting, so separators and delimiters that appear
//! inside string literals or nested calls are never treated as structure.

use crate::core::{Result, TemplateError};

/// A placeholder located inside a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Byte offset of the open delimiter
    pub start: usize,
    /// Byte offset one past the close delimiter
    pub end: usize,
    /// Text between the delimiters, untrimmed
    pub body: &'a str,
}

impl Placeholder<'_> {
    /// The full placeholder text including delimiters
    pub fn raw<'t>(&self, template: &'t str) -> &'t str {
        &template[self.start..self.end]
    }
}

/// Find every placeholder in `template`, left to right, non-overlapping
pub fn find_placeholders<'a>(template: &'a str, open: &str, close: &str) -> Vec<Placeholder<'a>> {
    let mut placeholders = Vec::new();
    if open.is_empty() || close.is_empty() {
        return placeholders;
    }

    let mut cursor = 0;
    while let Some(relative) = template[cursor..].find(open) {
        let start = cursor + relative;
        let body_start = start + open.len();
        let close_at = match find_close(template, body_start, close) {
            Some(index) => index,
            None => break,
        };
        placeholders.push(Placeholder {
            start,
            end: close_at + close.len(),
            body: &template[body_start..close_at],
        });
        cursor = close_at + close.len();
    }
    placeholders
}

/// Locate the close delimiter for a body starting at `from`
///
/// Prefers the first delimiter outside quotes and nesting; falls back to the
/// first raw occurrence when the body has unbalanced quotes or brackets.
fn find_close(template: &str, from: usize, close: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut depth = 0usize;

    for (offset, c) in template[from..].char_indices() {
        let index = from + offset;
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        if depth == 0 && template[index..].starts_with(close) {
            return Some(index);
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    template[from..].find(close).map(|offset| from + offset)
}

/// Split `input` on `separator` wherever it appears at nesting depth zero
/// and outside string literals
pub fn split_top_level(input: &str, separator: char) -> Result<Vec<&str>> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut segment_start = 0;

    for (index, c) in input.char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    TemplateError::syntax(format!("unbalanced '{c}' in '{input}'"))
                })?;
            }
            c if c == separator && depth == 0 => {
                parts.push(&input[segment_start..index]);
                segment_start = index + c.len_utf8();
            }
            _ => {}
        }
    }

    if let Some(q) = quote {
        return Err(TemplateError::syntax(format!(
            "unterminated string literal ({q}) in '{input}'"
        )));
    }
    if depth != 0 {
        return Err(TemplateError::syntax(format!(
            "unclosed bracket in '{input}'"
        )));
    }

    parts.push(&input[segment_start..]);
    Ok(parts)
}

/// Given the index of an opening bracket, return the index of its match
pub fn matching_bracket(input: &str, open_index: usize) -> Option<usize> {
    let open = input[open_index..].chars().next()?;
    let close = match open {
        '(' => ')',
        '[' => ']',
        '{' => '}',
        _ => return None,
    };

    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    for (offset, c) in input[open_index..].char_indices() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(open_index + offset);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_simple_placeholders() {
        let template = "Hello, {{name}}! You are {{ age }}.";
        let found = find_placeholders(template, "{{", "}}");
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].body, "name");
        assert_eq!(found[0].raw(template), "{{name}}");
        assert_eq!(found[1].body, " age ");
    }

    #[test]
    fn test_close_delimiter_inside_object_literal() {
        let template = r#"{{merge(a, {"x":{"y":1}})}} tail"#;
        let found = find_placeholders(template, "{{", "}}");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].body, r#"merge(a, {"x":{"y":1}})"#);
    }

    #[test]
    fn test_close_delimiter_inside_string() {
        let found = find_placeholders("{{default(x, '}}')}}", "{{", "}}");
        assert_eq!(found[0].body, "default(x, '}}')");
    }

    #[test]
    fn test_unbalanced_quote_falls_back_to_first_close() {
        let found = find_placeholders("{{it's}} and {{b}}", "{{", "}}");
        assert_eq!(found[0].body, "it's");
        assert_eq!(found[1].body, "b");
    }

    #[test]
    fn test_unterminated_placeholder() {
        assert!(find_placeholders("{{never closed", "{{", "}}").is_empty());
    }

    #[test]
    fn test_custom_delimiters() {
        let found = find_placeholders("<%a%> and <%b%>", "<%", "%>");
        let bodies: Vec<_> = found.iter().map(|p| p.body).collect();
        assert_eq!(bodies, vec!["a", "b"]);
    }

    #[test]
    fn test_split_respects_quotes_and_nesting() {
        let parts = split_top_level("a, 'b,c', f(d, e), [1,2]", ',').unwrap();
        assert_eq!(parts, vec!["a", " 'b,c'", " f(d, e)", " [1,2]"]);

        let stages = split_top_level("items | join('|') | uppercase", '|').unwrap();
        assert_eq!(stages, vec!["items ", " join('|') ", " uppercase"]);
    }

    #[test]
    fn test_split_errors() {
        assert!(split_top_level("'open", ',').is_err());
        assert!(split_top_level("f(a", ',').is_err());
        assert!(split_top_level("a)", ',').is_err());
    }

    #[test]
    fn test_matching_bracket() {
        assert_eq!(matching_bracket("f(a(b), 'c)')", 1), Some(12));
        assert_eq!(matching_bracket("x[0][1]", 1), Some(3));
        assert_eq!(matching_bracket("f(a", 1), None);
    }
}
