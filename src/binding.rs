//! Resolution of node bindings into template substitutions and table rows.

use crate::fetch::{FetchKind, Fetcher};
use crate::model::{Binding, BindingShape, RequestKind};
use serde_json::{Map, Value};

/// Prefix added to the value of an indented text node
pub const INDENT: &str = "  ";

/// Resolves bindings against inline JSON or remote endpoints. Every failure
/// degrades to empty data: a broken binding leaves its placeholders literal.
#[derive(Debug, Clone, Copy)]
pub struct BindingResolver<'a> {
    fetcher: &'a dyn Fetcher,
}

impl<'a> BindingResolver<'a> {
    pub fn new(fetcher: &'a dyn Fetcher) -> Self {
        Self { fetcher }
    }

    /// Apply each binding in order to the template; later bindings see the
    /// output of earlier ones
    pub fn resolve(&self, template: Option<&str>, bindings: &[Binding], indent: bool) -> String {
        let mut value = template.unwrap_or_default().to_string();
        for binding in bindings {
            match binding.shape {
                BindingShape::Object => {
                    let data = self.resolve_object(binding);
                    value = substitute(&value, &data);
                }
                shape => log::warn!(
                    "binding `{}` has shape {shape:?}, which cannot fill a text value",
                    binding_label(binding)
                ),
            }
        }
        if indent {
            value.insert_str(0, INDENT);
        }
        value
    }

    /// The mapping an object binding provides; empty when it cannot be resolved
    pub fn resolve_object(&self, binding: &Binding) -> Map<String, Value> {
        match self.load(binding) {
            Some(Value::Object(map)) => map,
            Some(other) => {
                log::warn!(
                    "binding `{}` resolved to {} instead of an object",
                    binding_label(binding),
                    json_kind(&other)
                );
                Map::new()
            }
            None => Map::new(),
        }
    }

    /// The rows a list binding provides, truncated to `limit`; empty when it
    /// cannot be resolved
    pub fn resolve_list(&self, binding: &Binding, limit: usize) -> Vec<Value> {
        if binding.shape != BindingShape::List {
            log::warn!(
                "row binding `{}` has shape {:?}, expected a list",
                binding_label(binding),
                binding.shape
            );
            return Vec::new();
        }
        match self.load(binding) {
            Some(Value::Array(mut rows)) => {
                if rows.len() > limit {
                    log::debug!("dropping {} rows beyond the limit of {limit}", rows.len() - limit);
                    rows.truncate(limit);
                }
                rows
            }
            Some(other) => {
                log::warn!(
                    "row binding `{}` resolved to {} instead of a list",
                    binding_label(binding),
                    json_kind(&other)
                );
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn load(&self, binding: &Binding) -> Option<Value> {
        let source = binding.value.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        match binding.request {
            RequestKind::Data => parse_json(source, binding),
            RequestKind::Url => match self.fetcher.fetch(source, FetchKind::Json) {
                Ok(body) => match std::str::from_utf8(&body) {
                    Ok(text) => parse_json(text, binding),
                    Err(err) => {
                        log::warn!("`{source}` answered with non UTF-8 data: {err}");
                        None
                    }
                },
                Err(err) => {
                    log::warn!("failed to fetch binding data from `{source}`: {err}");
                    None
                }
            },
            RequestKind::Unknown => {
                log::warn!(
                    "binding `{}` has an unknown request kind",
                    binding_label(binding)
                );
                None
            }
        }
    }
}

fn parse_json(text: &str, binding: &Binding) -> Option<Value> {
    match serde_json::from_str(text) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("binding `{}` is not valid JSON: {err}", binding_label(binding));
            None
        }
    }
}

fn binding_label(binding: &Binding) -> &str {
    binding
        .name
        .as_deref()
        .or(binding.bind.as_deref())
        .unwrap_or("<unnamed>")
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Replace every `${key}` whose key the data provides. Keys may be dotted
/// paths into nested objects. Unmatched placeholders stay verbatim.
pub fn substitute(template: &str, data: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match data.get(key).or_else(|| lookup_in(data, key)) {
            Some(value) => out.push_str(&display_value(value)),
            None => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn lookup_in<'v>(data: &'v Map<String, Value>, path: &str) -> Option<&'v Value> {
    let (head, tail) = path.split_once('.')?;
    lookup_path(data.get(head)?, tail)
}

/// Follow a dotted path (`a.b.c`) through nested objects
pub fn lookup_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    path.split('.')
        .try_fold(value, |current, key| current.as_object()?.get(key))
        .filter(|v| !v.is_null())
}

/// How a JSON value reads when placed in text
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{InMemoryFetcher, OfflineFetcher};
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn substitutes_known_keys_only() {
        let map = data(json!({"name": "Ada", "age": 36, "address": {"city": "London"}}));
        assert_eq!(
            substitute("${name} (${age}) from ${address.city}, ${missing}", &map),
            "Ada (36) from London, ${missing}"
        );
        assert_eq!(substitute("unterminated ${name", &map), "unterminated ${name");
        assert_eq!(substitute("", &map), "");
    }

    #[test]
    fn bindings_apply_in_order() {
        let resolver = BindingResolver::new(&OfflineFetcher);
        let bindings = vec![
            Binding::object_data(r#"{"greeting": "Hello ${who}"}"#),
            Binding::object_data(r#"{"who": "world"}"#),
        ];
        assert_eq!(
            resolver.resolve(Some("${greeting}!"), &bindings, false),
            "Hello world!"
        );
    }

    #[test]
    fn failed_bindings_leave_placeholders() {
        let resolver = BindingResolver::new(&OfflineFetcher);
        let bindings = vec![
            Binding::object_data("{not json"),
            Binding {
                shape: BindingShape::Object,
                request: RequestKind::Url,
                value: Some("https://unreachable.test/data".into()),
                ..Binding::default()
            },
        ];
        assert_eq!(
            resolver.resolve(Some("Dear ${name}"), &bindings, true),
            "  Dear ${name}"
        );
    }

    #[test]
    fn remote_lists_are_capped() {
        let fetcher = InMemoryFetcher::new();
        let rows: Vec<Value> = (0..250).map(|i| json!({"n": i})).collect();
        fetcher.add("https://rows.test", serde_json::to_vec(&rows).expect("encode"));
        let resolver = BindingResolver::new(&fetcher);

        let resolved = resolver.resolve_list(&Binding::list_url("https://rows.test"), 100);
        assert_eq!(resolved.len(), 100);
        assert_eq!(resolved[0]["n"], 0);
        assert_eq!(resolved[99]["n"], 99);
        assert!(resolver
            .resolve_list(&Binding::list_url("https://other.test"), 100)
            .is_empty());
    }

    #[test]
    fn dotted_paths() {
        let row = json!({"a": {"b": {"c": 5}}, "n": null});
        assert_eq!(lookup_path(&row, "a.b.c"), Some(&json!(5)));
        assert_eq!(lookup_path(&row, "a.x"), None);
        assert_eq!(lookup_path(&row, "n"), None);
        assert_eq!(lookup_path(&row, ""), None);
    }
}
