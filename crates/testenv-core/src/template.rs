use std::collections::BTreeMap;

use tracing::debug;

use crate::selector::evaluate_selector;
use crate::{RecipeError, RenderConfig};

/// Renders a raw `meta.yaml` into plain YAML.
///
/// Lines whose trailing `# [selector]` evaluates false are blanked (so YAML
/// error line numbers still match the file). `{% set name = value %}`
/// statements define variables and `{{ expr }}` substitutes them; undefined
/// names render as an empty string, as Jinja does by default.
pub fn render_recipe(raw: &str, config: &RenderConfig) -> Result<String, RecipeError> {
    let mut vars = BTreeMap::new();
    let mut rendered = String::with_capacity(raw.len());

    for (index, line) in raw.lines().enumerate() {
        let line_no = index + 1;
        let (content, selector) = split_selector(line);
        if let Some(selector) = selector {
            let keep = evaluate_selector(selector, config).map_err(|reason| {
                RecipeError::Selector {
                    line: line_no,
                    selector: selector.to_string(),
                    reason,
                }
            })?;
            if !keep {
                rendered.push('\n');
                continue;
            }
        }

        let trimmed = content.trim();
        if trimmed.starts_with("{%") {
            apply_statement(trimmed, line_no, &mut vars)?;
            rendered.push('\n');
            continue;
        }
        if trimmed.starts_with("{#") && trimmed.ends_with("#}") {
            rendered.push('\n');
            continue;
        }

        rendered.push_str(&substitute_expressions(content, line_no, &vars)?);
        rendered.push('\n');
    }

    Ok(rendered)
}

fn split_selector(line: &str) -> (&str, Option<&str>) {
    let Some(hash) = line.rfind('#') else {
        return (line, None);
    };
    let tail = line[hash + 1..].trim();
    if tail.len() >= 2 && tail.starts_with('[') && tail.ends_with(']') {
        return (line[..hash].trim_end(), Some(tail[1..tail.len() - 1].trim()));
    }
    (line, None)
}

fn apply_statement(
    statement: &str,
    line: usize,
    vars: &mut BTreeMap<String, Option<String>>,
) -> Result<(), RecipeError> {
    let Some(inner) = statement
        .strip_prefix("{%")
        .and_then(|rest| rest.strip_suffix("%}"))
    else {
        return Err(RecipeError::UnterminatedTag { line });
    };
    let inner = inner.trim_matches('-').trim();

    let unsupported = || RecipeError::UnsupportedStatement {
        line,
        statement: statement.to_string(),
    };
    let Some(assignment) = inner.strip_prefix("set ") else {
        return Err(unsupported());
    };
    let Some((name, value)) = assignment.split_once('=') else {
        return Err(unsupported());
    };
    let name = name.trim();
    if name.is_empty()
        || !name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return Err(unsupported());
    }

    let value = evaluate_expression(value.trim(), vars);
    vars.insert(name.to_string(), value);
    Ok(())
}

fn substitute_expressions(
    content: &str,
    line: usize,
    vars: &BTreeMap<String, Option<String>>,
) -> Result<String, RecipeError> {
    let mut output = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            return Err(RecipeError::UnterminatedTag { line });
        };
        let expression = after_open[..end].trim_matches('-').trim();
        if let Some(value) = evaluate_expression(expression, vars) {
            output.push_str(&value);
        }
        rest = &after_open[end + 2..];
    }
    output.push_str(rest);
    Ok(output)
}

/// `None` is Jinja's `Undefined`.
fn evaluate_expression(
    expression: &str,
    vars: &BTreeMap<String, Option<String>>,
) -> Option<String> {
    let mut parts = expression.split('|').map(str::trim);
    let head = parts.next().unwrap_or_default();

    let mut value = if let Some(literal) = string_literal(head) {
        Some(literal.to_string())
    } else if !head.is_empty() && head.chars().all(|ch| ch.is_ascii_digit() || ch == '.') {
        Some(head.to_string())
    } else if let Some(value) = vars.get(head) {
        value.clone()
    } else {
        debug!(expression, "template expression is undefined");
        None
    };

    for filter in parts {
        value = value.map(|current| match filter {
            "lower" => current.to_lowercase(),
            "upper" => current.to_uppercase(),
            "trim" => current.trim().to_string(),
            _ => current,
        });
    }
    value
}

fn string_literal(input: &str) -> Option<&str> {
    let bytes = input.as_bytes();
    if bytes.len() >= 2 {
        let quote = bytes[0];
        if (quote == b'"' || quote == b'\'') && bytes[bytes.len() - 1] == quote {
            return Some(&input[1..input.len() - 1]);
        }
    }
    None
}
