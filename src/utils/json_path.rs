use serde_json::Value;
use serde_json_path::JsonPath;

pub fn normalize_expression(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.starts_with('$') {
        trimmed.to_string()
    } else if trimmed.starts_with('[') {
        format!("${}", trimmed)
    } else {
        format!("$.{}", trimmed)
    }
}

fn is_shorthand_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || !first.is_ascii() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii())
}

fn quote_name(name: &str) -> String {
    format!("['{}']", name.replace('\\', "\\\\").replace('\'', "\\'"))
}

// Length of a bracket selector starting at `start`, quotes respected.
fn bracket_len(chars: &[char], start: usize) -> usize {
    let mut quote = None;
    let mut index = start + 1;
    while index < chars.len() {
        let c = chars[index];
        match quote {
            Some(_) if c == '\\' => index += 1,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ']' => return index + 1 - start,
            None => {}
        }
        index += 1;
    }
    chars.len() - start
}

/// Rewrites dot segments that are not plain member names into bracket
/// form: `$.data.first-name` becomes `$.data['first-name']`.
pub fn bracket_segments(expression: &str) -> String {
    let chars: Vec<char> = expression.chars().collect();
    let mut out = String::with_capacity(expression.len());
    let mut index = 0;
    while index < chars.len() {
        match chars[index] {
            '[' => {
                let len = bracket_len(&chars, index);
                out.extend(&chars[index..index + len]);
                index += len;
            }
            '.' => {
                let prefix = if chars.get(index + 1) == Some(&'.') { ".." } else { "." };
                let start = index + prefix.len();
                let mut end = start;
                while end < chars.len() && chars[end] != '.' && chars[end] != '[' {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let name = name.trim_end();
                if name.is_empty() || name == "*" || name.ends_with("()") || is_shorthand_name(name)
                {
                    out.push_str(prefix);
                    out.push_str(name);
                } else {
                    if prefix == ".." {
                        out.push_str(prefix);
                    }
                    out.push_str(&quote_name(name));
                }
                index = end;
            }
            c => {
                out.push(c);
                index += 1;
            }
        }
    }
    out
}

// Quoted names are dropped so their contents cannot look like selectors.
fn strip_quoted(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len());
    let mut quote = None;
    let mut escaped = false;
    for c in expression.chars() {
        match quote {
            Some(_) if escaped => escaped = false,
            Some(_) if c == '\\' => escaped = true,
            Some(q) if c == q => {
                quote = None;
                out.push(c);
            }
            Some(_) => {}
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                }
                out.push(c);
            }
        }
    }
    out
}

fn is_definite(expression: &str) -> bool {
    let bare = strip_quoted(expression);
    !(bare.contains('*')
        || bare.contains("..")
        || bare.contains('?')
        || bare.contains(':')
        || bare.contains(','))
}

fn compile(expression: &str) -> Option<(JsonPath, String)> {
    if let Ok(path) = JsonPath::parse(expression) {
        return Some((path, expression.to_string()));
    }
    let repaired = bracket_segments(expression);
    if repaired == expression {
        return None;
    }
    JsonPath::parse(&repaired).ok().map(|path| (path, repaired))
}

pub fn extract(root: &Value, mapping: &str) -> Option<Value> {
    let trimmed = mapping.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "$" || trimmed == "$." {
        return non_null(root.clone());
    }
    let expression = normalize_expression(trimmed);
    let (path, compiled) = compile(&expression)?;
    let nodes = path.query(root);
    if is_definite(&compiled) {
        return nodes.at_most_one().ok().flatten().cloned().and_then(non_null);
    }
    Some(Value::Array(nodes.all().into_iter().cloned().collect()))
}

fn non_null(value: Value) -> Option<Value> {
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_expressions_return_whole_tree() {
        let root = json!({"a": 1});
        assert_eq!(extract(&root, "$"), Some(root.clone()));
        assert_eq!(extract(&root, "$."), Some(root.clone()));
    }

    #[test]
    fn spaced_property_names_are_repaired() {
        let root = json!({"data": {"first name": "Ann", "last": "Lee"}});
        assert_eq!(extract(&root, "$.data.first name"), Some(json!("Ann")));
        assert_eq!(
            bracket_segments("$.data.first name.x"),
            "$.data['first name'].x"
        );
    }

    #[test]
    fn hyphenated_names_are_repaired() {
        let root = json!({"user-id": 5, "data": {"first-name": "Ann"}});
        assert_eq!(extract(&root, "$.user-id"), Some(json!(5)));
        assert_eq!(extract(&root, "$.data.first-name"), Some(json!("Ann")));
        assert_eq!(extract(&root, "data.first-name"), Some(json!("Ann")));
        assert_eq!(bracket_segments("$..first-name"), "$..['first-name']");
        assert_eq!(bracket_segments("$.it's-here"), r"$['it\'s-here']");
    }

    #[test]
    fn quoted_names_with_selector_characters_stay_singular() {
        assert_eq!(extract(&json!({"a:b": "x"}), "$['a:b']"), Some(json!("x")));
        assert_eq!(
            extract(&json!({"what is this?": 1}), "$.what is this?"),
            Some(json!(1))
        );
        assert_eq!(
            extract(&json!({"items": [1, 2]}), "$.items[*]"),
            Some(json!([1, 2]))
        );
    }

    #[test]
    fn valid_expressions_are_not_rewritten() {
        let root = json!({"data": {"last": "Lee"}});
        assert_eq!(bracket_segments("$.data.last"), "$.data.last");
        assert_eq!(extract(&root, "$.data.last"), Some(json!("Lee")));
    }

    #[test]
    fn missing_paths_and_parse_errors_yield_none() {
        let root = json!({"a": {"b": null}});
        assert_eq!(extract(&root, "$.a.c"), None);
        assert_eq!(extract(&root, "$.a.b"), None);
        assert_eq!(extract(&root, "$[[["), None);
        assert_eq!(extract(&root, ""), None);
    }

    #[test]
    fn wildcard_paths_collect_every_node() {
        let root = json!({"items": [{"id": 1}, {"id": 2}]});
        assert_eq!(extract(&root, "$.items[*].id"), Some(json!([1, 2])));
    }

    #[test]
    fn bare_expressions_get_root_prefix() {
        let root = json!({"items": [{"id": 1}]});
        assert_eq!(extract(&root, "items[0].id"), Some(json!(1)));
    }
}
