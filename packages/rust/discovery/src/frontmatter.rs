//! Minimal frontmatter reader.
//!
//! Supports the subset of YAML that documentation frontmatter actually uses:
//! - `key: value` scalars, optionally quoted
//! - `key: [a, "b"]` inline lists (JSON first, comma split as fallback)
//! - `key:` followed by `- item` lines

use docweave_shared::{Frontmatter, FrontmatterValue};

/// Split `content` into its frontmatter block (without delimiters) and body.
///
/// A block is only recognised when the first line is `---` and a closing
/// `---` line follows. Otherwise the whole content is the body.
pub fn split_frontmatter(content: &str) -> (Option<&str>, &str) {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(rest) = content.strip_prefix("---") else {
        return (None, content);
    };
    let Some(newline) = rest.find('\n') else {
        return (None, content);
    };
    if !rest[..newline].trim().is_empty() {
        return (None, content);
    }

    let inner = &rest[newline + 1..];
    let mut offset = 0;
    for line in inner.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return (Some(&inner[..offset]), &inner[offset + line.len()..]);
        }
        offset += line.len();
    }

    (None, content)
}

/// Parse a frontmatter block into key/value pairs. Unrecognised lines are ignored.
pub fn parse_frontmatter(block: &str) -> Frontmatter {
    let mut fields = Frontmatter::new();
    let mut pending_list: Option<(String, Vec<String>)> = None;

    for line in block.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix("- ") {
            if let Some((_, items)) = pending_list.as_mut() {
                items.push(unquote(item.trim()).to_string());
            }
            continue;
        }

        if let Some((key, items)) = pending_list.take() {
            fields.insert(key, FrontmatterValue::List(items));
        }

        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }
        let value = value.trim();

        if value.is_empty() {
            pending_list = Some((key.to_string(), Vec::new()));
        } else if value.starts_with('[') && value.ends_with(']') {
            fields.insert(key.to_string(), FrontmatterValue::List(parse_list(value)));
        } else {
            fields.insert(
                key.to_string(),
                FrontmatterValue::Text(unquote(value).to_string()),
            );
        }
    }

    if let Some((key, items)) = pending_list {
        if items.is_empty() {
            fields.insert(key, FrontmatterValue::Text(String::new()));
        } else {
            fields.insert(key, FrontmatterValue::List(items));
        }
    }

    fields
}

fn parse_list(value: &str) -> Vec<String> {
    if let Ok(items) = serde_json::from_str::<Vec<serde_json::Value>>(value) {
        return items
            .into_iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();
    }

    value[1..value.len() - 1]
        .split(',')
        .map(|item| unquote(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
