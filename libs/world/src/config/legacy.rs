//! Rendering configs as command-line flags for the GA release.
//!
//! Each field becomes `-lowerCamelName=value`. Null and empty values are
//! skipped, arrays repeat the flag per item and maps repeat it per entry as
//! `key:value`.

use serde_json::Value;

use super::ComponentConfig;
use crate::error::WorldError;

pub fn flags<C: ComponentConfig>(config: &C) -> Result<Vec<String>, WorldError> {
    let Value::Object(fields) = serde_json::to_value(config)? else {
        return Ok(Vec::new());
    };

    let mut flags = Vec::new();
    for (field, value) in fields {
        if C::FLAG_OMITTED.contains(&field.as_str()) {
            continue;
        }

        let name = C::FLAG_RENAMES
            .iter()
            .find(|(from, _)| *from == field)
            .map(|(_, to)| to.to_string())
            .unwrap_or_else(|| lower_camel(&field));

        match value {
            Value::Array(items) => {
                flags.extend(items.iter().filter_map(scalar).map(|v| format!("-{name}={v}")));
            }
            Value::Object(entries) => {
                for (key, value) in &entries {
                    if let Some(value) = scalar(value) {
                        flags.push(format!("-{name}={key}:{value}"));
                    }
                }
            }
            other => {
                if let Some(value) = scalar(&other) {
                    flags.push(format!("-{name}={value}"));
                }
            }
        }
    }

    Ok(flags)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn lower_camel(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
