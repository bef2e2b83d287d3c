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

//! Legacy `${...}` syntax normalization
//!
//! Rewrites the legacy dialect into `{{...}}` placeholders, applying the
//! rules in this order:
//!
//! 1. `${config.X}` → `{{env.X}}`
//! 2. `${response.X}` → `{{responses.last.body.X}}`
//! 3. `${testData.X}` → `{{X}}`
//! 4. any other `${X}` → `{{X}}`
//!
//! Every function here is total: malformed input comes back as close to
//! unchanged as the rules allow.

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parser::{find_placeholders, split_top_level};

static CONFIG_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{\s*config\.([^{}]+?)\s*\}").expect("valid regex"));
static RESPONSE_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{\s*response\.([^{}]+?)\s*\}").expect("valid regex"));
static TEST_DATA_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{\s*testData\.([^{}]+?)\s*\}").expect("valid regex"));
static LEGACY_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{\s*([^{}]+?)\s*\}").expect("valid regex"));
static PTF_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{.+?\}\}").expect("valid regex"));

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const LEGACY_OPEN: &str = "${";
const LEGACY_CLOSE: &str = "}";

/// Result of [`SyntaxNormalizer::validate_syntax`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxValidation {
    pub is_valid: bool,
    /// Human-readable problems, in order of position
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Ptf,
    Legacy,
}

impl Dialect {
    fn opener(self) -> &'static str {
        match self {
            Dialect::Ptf => OPEN,
            Dialect::Legacy => LEGACY_OPEN,
        }
    }
}

/// Stateless converter between the legacy and current placeholder dialects
pub struct SyntaxNormalizer;

impl SyntaxNormalizer {
    /// Rewrite every legacy placeholder into `{{...}}` form
    pub fn normalize(input: &str) -> String {
        if !input.contains(LEGACY_OPEN) {
            return input.to_string();
        }
        let output = CONFIG_RULE.replace_all(input, "{{env.${1}}}");
        let output = RESPONSE_RULE.replace_all(&output, "{{responses.last.body.${1}}}");
        let output = TEST_DATA_RULE.replace_all(&output, "{{${1}}}");
        let output = LEGACY_RULE.replace_all(&output, "{{${1}}}").into_owned();
        if output != input {
            debug!("normalized legacy placeholders: {input:?} -> {output:?}");
        }
        output
    }

    pub fn has_java_syntax(input: &str) -> bool {
        LEGACY_RULE.is_match(input)
    }

    pub fn has_ptf_syntax(input: &str) -> bool {
        PTF_PLACEHOLDER.is_match(input)
    }

    /// Placeholder bodies from both dialects, first-seen order, without duplicates
    ///
    /// Pipeline suffixes are dropped, so `{{name | uppercase}}` yields `name`.
    pub fn extract_variables(input: &str) -> Vec<String> {
        let mut bodies: Vec<(usize, &str)> = find_placeholders(input, OPEN, CLOSE)
            .into_iter()
            .map(|p| (p.start, p.body))
            .collect();
        bodies.extend(
            find_placeholders(input, LEGACY_OPEN, LEGACY_CLOSE)
                .into_iter()
                .map(|p| (p.start, p.body)),
        );
        bodies.sort_by_key(|(start, _)| *start);

        let mut variables: Vec<String> = Vec::new();
        for (_, body) in bodies {
            let head = match split_top_level(body, '|') {
                Ok(parts) => parts[0],
                Err(_) => body.split('|').next().unwrap_or(body),
            };
            let name = head.trim();
            if !name.is_empty() && !variables.iter().any(|seen| seen == name) {
                variables.push(name.to_string());
            }
        }
        variables
    }

    /// Brace balance for both dialects; nested placeholders are reported
    pub fn validate_syntax(input: &str) -> SyntaxValidation {
        let mut errors = Vec::new();
        // Open placeholders with their position and bracket depth inside the body
        let mut stack: Vec<(Dialect, usize, usize)> = Vec::new();
        let mut chars = input.char_indices().peekable();

        while let Some((index, c)) = chars.next() {
            let rest = &input[index..];
            if !stack.is_empty() && (c == '\'' || c == '"') {
                // Skip quoted text inside a placeholder body
                for (_, q) in chars.by_ref() {
                    if q == c {
                        break;
                    }
                }
                continue;
            }

            let opened = if rest.starts_with(OPEN) {
                Some(Dialect::Ptf)
            } else if rest.starts_with(LEGACY_OPEN) {
                Some(Dialect::Legacy)
            } else {
                None
            };
            if let Some(dialect) = opened {
                if let Some(&(outer, outer_at, _)) = stack.last() {
                    errors.push(format!(
                        "nested placeholder '{}' at position {index} inside '{}' opened at position {outer_at}",
                        dialect.opener(),
                        outer.opener()
                    ));
                }
                stack.push((dialect, index, 0));
                chars.next();
                continue;
            }

            match (stack.last_mut(), c) {
                (Some((_, _, depth)), '{' | '(' | '[') => *depth += 1,
                (Some((_, _, depth)), '}' | ')' | ']') if *depth > 0 => *depth -= 1,
                (Some((Dialect::Ptf, _, _)), '}') if rest.starts_with(CLOSE) => {
                    stack.pop();
                    chars.next();
                }
                (Some((Dialect::Legacy, _, _)), '}') => {
                    stack.pop();
                }
                (None, '}') if rest.starts_with(CLOSE) => {
                    errors.push(format!("unmatched '}}}}' at position {index}"));
                    chars.next();
                }
                _ => {}
            }
        }

        for (dialect, position, _) in stack {
            errors.push(format!(
                "unclosed '{}' at position {position}",
                dialect.opener()
            ));
        }

        SyntaxValidation {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Convert `{{x}}` back to `${x}`, skipping bodies with `(` or `.`
    pub fn to_legacy_syntax(input: &str) -> String {
        let placeholders = find_placeholders(input, OPEN, CLOSE);
        if placeholders.is_empty() {
            return input.to_string();
        }

        let mut output = String::with_capacity(input.len());
        let mut cursor = 0;
        for placeholder in placeholders {
            output.push_str(&input[cursor..placeholder.start]);
            cursor = placeholder.end;
            let body = placeholder.body.trim();
            if body.is_empty() || body.contains(['(', '.']) {
                output.push_str(placeholder.raw(input));
            } else {
                output.push_str(LEGACY_OPEN);
                output.push_str(body);
                output.push_str(LEGACY_CLOSE);
            }
        }
        output.push_str(&input[cursor..]);
        output
    }

    /// Normalize every string leaf of a JSON document
    pub fn normalize_object(value: &Value) -> Value {
        match value {
            Value::String(text) => Value::String(Self::normalize(text)),
            Value::Array(items) => Value::Array(items.iter().map(Self::normalize_object).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), Self::normalize_object(item)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("${config.X}", "{{env.X}}")]
    #[case("${response.a.b}", "{{responses.last.body.a.b}}")]
    #[case("${testData.user.name}", "{{user.name}}")]
    #[case("${token}", "{{token}}")]
    #[case("${ token }", "{{token}}")]
    #[case(
        "Bearer ${config.TOKEN} for ${testData.id}/${response.id}",
        "Bearer {{env.TOKEN}} for {{id}}/{{responses.last.body.id}}"
    )]
    #[case("no placeholders", "no placeholders")]
    #[case("{{already}} ${x}", "{{already}} {{x}}")]
    #[case("${unclosed", "${unclosed")]
    fn test_normalize_rules(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(SyntaxNormalizer::normalize(input), expected);
    }

    #[rstest]
    #[case("{{a}}")]
    #[case("x {{ name | uppercase }} y {{add(1, 2)}}")]
    #[case("${config.A} and ${b}")]
    fn test_normalize_is_idempotent(#[case] input: &str) {
        let once = SyntaxNormalizer::normalize(input);
        assert_eq!(SyntaxNormalizer::normalize(&once), once);
    }

    #[test]
    fn test_dialect_detection() {
        assert!(SyntaxNormalizer::has_java_syntax("Hello ${name}"));
        assert!(!SyntaxNormalizer::has_java_syntax("Hello {{name}}"));
        assert!(SyntaxNormalizer::has_ptf_syntax("Hello {{name}}"));
        assert!(!SyntaxNormalizer::has_ptf_syntax("Hello ${name}"));
        assert!(!SyntaxNormalizer::has_ptf_syntax("{{}}"));
    }

    #[test]
    fn test_extract_variables() {
        let variables = SyntaxNormalizer::extract_variables(
            "{{ name | uppercase }} ${config.URL} {{name}} ${id} {{add(1, 2)}} {{'a|b' | length}}",
        );
        assert_eq!(
            variables,
            vec!["name", "config.URL", "id", "add(1, 2)", "'a|b'"]
        );
        assert!(SyntaxNormalizer::extract_variables("plain").is_empty());
    }

    #[test]
    fn test_validate_syntax() {
        let ok = SyntaxNormalizer::validate_syntax("{{a}} ${b} {{concat('}}', x)}}");
        assert!(ok.is_valid, "{:?}", ok.errors);

        let unclosed = SyntaxNormalizer::validate_syntax("{{a");
        assert!(!unclosed.is_valid);
        assert_eq!(unclosed.errors, vec!["unclosed '{{' at position 0"]);

        let unmatched = SyntaxNormalizer::validate_syntax("a}}");
        assert_eq!(unmatched.errors, vec!["unmatched '}}' at position 1"]);

        let nested = SyntaxNormalizer::validate_syntax("{{outer ${inner}}}");
        assert!(!nested.is_valid);
        assert!(nested.errors[0].starts_with("nested placeholder '${' at position 8"));

        let legacy = SyntaxNormalizer::validate_syntax("${a");
        assert_eq!(legacy.errors, vec!["unclosed '${' at position 0"]);
    }

    #[rstest]
    #[case(r#"{{merge(a, {"x":{"y":1}})}}"#)]
    #[case(r#"{{pick({"a":[1,{"b":2}]}, 'a')}}"#)]
    #[case("{{slice([1, [2, 3]], 0)}} tail")]
    fn test_validate_syntax_allows_nested_literals(#[case] input: &str) {
        let validation = SyntaxNormalizer::validate_syntax(input);
        assert!(validation.is_valid, "{input}: {:?}", validation.errors);
    }

    #[test]
    fn test_validate_syntax_reports_unclosed_literal_body() {
        let validation = SyntaxNormalizer::validate_syntax(r#"{{merge(a, {"x":1)}}"#);
        assert_eq!(validation.errors, vec!["unclosed '{{' at position 0"]);
    }

    #[test]
    fn test_to_legacy_syntax() {
        assert_eq!(
            SyntaxNormalizer::to_legacy_syntax("{{ a }} {{env.X}} {{now()}} {{b}}"),
            "${a} {{env.X}} {{now()}} ${b}"
        );
        let round_trip = SyntaxNormalizer::normalize(&SyntaxNormalizer::to_legacy_syntax("{{id}}"));
        assert_eq!(round_trip, "{{id}}");
    }

    #[test]
    fn test_normalize_object() {
        let document = json!({
            "url": "${config.BASE}/users/${testData.id}",
            "headers": [{"auth": "${token}"}],
            "count": 3,
            "flag": null
        });
        assert_eq!(
            SyntaxNormalizer::normalize_object(&document),
            json!({
                "url": "{{env.BASE}}/users/{{id}}",
                "headers": [{"auth": "{{token}}"}],
                "count": 3,
                "flag": null
            })
        );
    }
}
