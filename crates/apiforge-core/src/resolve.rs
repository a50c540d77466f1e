//! `$ref` resolution — raw JSON schema nodes into the closed [`Schema`]
//! variant, with cycle avoidance and a fixed expansion depth cap.
//!
//! Resolution is deliberately forgiving: a dangling pointer, a cycle, or an
//! exceeded depth all degrade to an empty `Object` schema instead of
//! failing, so one bad reference never aborts a document.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::document::Schema;

/// How many `$ref` hops to expand before stubbing out. Bounds recursive and
/// self-referential schemas (e.g. a tree node referencing itself).
pub const REF_DEPTH_CAP: usize = 3;

/// Resolve a raw schema node (or `$ref`) against the root document.
///
/// Pure function, no I/O; safe to call concurrently.
#[must_use]
pub fn resolve(raw: &Value, root: &Value) -> Schema {
    let mut visited = HashSet::new();
    resolve_inner(raw, root, &mut visited, 0)
}

fn resolve_inner(
    raw: &Value,
    root: &Value,
    visited: &mut HashSet<String>,
    depth: usize,
) -> Schema {
    // Both `{"$ref": "#/..."}` and a bare pointer string are accepted.
    if let Some(pointer) = ref_pointer(raw) {
        return follow_ref(pointer, root, visited, depth);
    }

    let Some(obj) = raw.as_object() else {
        return Schema::empty_object();
    };

    // allOf: merge object parts into one object schema.
    if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
        let mut properties = BTreeMap::new();
        let mut required = Vec::new();
        for part in parts {
            if let Schema::Object {
                properties: p,
                required: r,
                ..
            } = resolve_inner(part, root, visited, depth)
            {
                properties.extend(p);
                for name in r {
                    if !required.contains(&name) {
                        required.push(name);
                    }
                }
            }
        }
        return Schema::Object {
            properties,
            required,
            title: str_field(obj, "title"),
            example: obj.get("example").cloned(),
        };
    }

    // anyOf/oneOf: first non-null variant. Full polymorphism resolution
    // (discriminator) is out of scope.
    for key in ["anyOf", "oneOf"] {
        if let Some(variants) = obj.get(key).and_then(Value::as_array) {
            let picked = variants
                .iter()
                .find(|v| v.get("type").and_then(Value::as_str) != Some("null"));
            return match picked {
                Some(v) => resolve_inner(v, root, visited, depth),
                None => Schema::Null,
            };
        }
    }

    match obj.get("type").and_then(Value::as_str) {
        Some("object") => resolve_object(obj, root, visited, depth),
        Some("array") => resolve_array(obj, root, visited, depth),
        Some("string") => Schema::String {
            format: str_field(obj, "format"),
            title: str_field(obj, "title"),
            enum_values: obj
                .get("enum")
                .and_then(Value::as_array)
                .map(|a| a.to_vec()),
            example: obj.get("example").cloned(),
        },
        Some("number") => Schema::Number {
            minimum: obj.get("minimum").and_then(Value::as_f64),
            maximum: obj.get("maximum").and_then(Value::as_f64),
            example: obj.get("example").cloned(),
        },
        Some("integer") => Schema::Integer {
            minimum: obj.get("minimum").and_then(Value::as_i64),
            maximum: obj.get("maximum").and_then(Value::as_i64),
            example: obj.get("example").cloned(),
        },
        Some("boolean") => Schema::Boolean {
            example: obj.get("example").cloned(),
        },
        Some("null") => Schema::Null,
        // No declared type: infer from structure, else degrade.
        _ => {
            if obj.contains_key("properties") {
                resolve_object(obj, root, visited, depth)
            } else if obj.contains_key("items") {
                resolve_array(obj, root, visited, depth)
            } else if obj.contains_key("enum") {
                Schema::String {
                    format: None,
                    title: str_field(obj, "title"),
                    enum_values: obj
                        .get("enum")
                        .and_then(Value::as_array)
                        .map(|a| a.to_vec()),
                    example: obj.get("example").cloned(),
                }
            } else {
                Schema::empty_object()
            }
        }
    }
}

fn resolve_object(
    obj: &serde_json::Map<String, Value>,
    root: &Value,
    visited: &mut HashSet<String>,
    depth: usize,
) -> Schema {
    let mut properties = BTreeMap::new();
    if let Some(props) = obj.get("properties").and_then(Value::as_object) {
        for (name, prop) in props {
            properties.insert(name.clone(), resolve_inner(prop, root, visited, depth));
        }
    }
    let required = obj
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    Schema::Object {
        properties,
        required,
        title: str_field(obj, "title"),
        example: obj.get("example").cloned(),
    }
}

fn resolve_array(
    obj: &serde_json::Map<String, Value>,
    root: &Value,
    visited: &mut HashSet<String>,
    depth: usize,
) -> Schema {
    let items = obj
        .get("items")
        .map(|i| resolve_inner(i, root, visited, depth))
        .unwrap_or_else(Schema::string);
    Schema::Array {
        items: Box::new(items),
        min_items: obj.get("minItems").and_then(Value::as_u64),
        max_items: obj.get("maxItems").and_then(Value::as_u64),
        example: obj.get("example").cloned(),
    }
}

fn follow_ref(
    pointer: &str,
    root: &Value,
    visited: &mut HashSet<String>,
    depth: usize,
) -> Schema {
    // Cycle on the current path, or too deep: stub out without expanding.
    if visited.contains(pointer) || depth >= REF_DEPTH_CAP {
        return Schema::empty_object();
    }
    let Some(target) = lookup_pointer(pointer, root) else {
        // Dangling reference is recoverable, not fatal.
        return Schema::empty_object();
    };
    visited.insert(pointer.to_string());
    let resolved = resolve_inner(target, root, visited, depth + 1);
    visited.remove(pointer);
    resolved
}

fn ref_pointer(raw: &Value) -> Option<&str> {
    match raw {
        Value::String(s) if s.starts_with("#/") => Some(s),
        Value::Object(obj) => obj.get("$ref").and_then(Value::as_str),
        _ => None,
    }
}

/// Walk `#/a/b/c` segment by segment. Any missing segment yields `None`.
fn lookup_pointer<'a>(pointer: &str, root: &'a Value) -> Option<&'a Value> {
    let path = pointer.strip_prefix("#/")?;
    let mut current = root;
    for segment in path.split('/') {
        current = match current {
            Value::Object(obj) => obj.get(segment)?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_metadata_preserved() {
        let raw = json!({"type": "string", "format": "email", "example": "a@b.c"});
        let schema = resolve(&raw, &json!({}));
        assert_eq!(
            schema,
            Schema::String {
                format: Some("email".into()),
                title: None,
                enum_values: None,
                example: Some(json!("a@b.c")),
            }
        );
    }

    #[test]
    fn ref_resolves_through_components() {
        let root = json!({
            "components": {"schemas": {"Pet": {
                "type": "object",
                "properties": {"id": {"type": "integer"}},
                "required": ["id"]
            }}}
        });
        let raw = json!({"$ref": "#/components/schemas/Pet"});
        let schema = resolve(&raw, &root);
        match schema {
            Schema::Object {
                properties,
                required,
                ..
            } => {
                assert!(properties.contains_key("id"));
                assert_eq!(required, vec!["id"]);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn bare_pointer_string_accepted() {
        let root = json!({"definitions": {"Id": {"type": "integer"}}});
        let schema = resolve(&json!("#/definitions/Id"), &root);
        assert!(matches!(schema, Schema::Integer { .. }));
    }

    #[test]
    fn dangling_ref_degrades_to_empty_object() {
        let raw = json!({"$ref": "#/components/schemas/Missing"});
        let schema = resolve(&raw, &json!({"components": {}}));
        assert_eq!(schema, Schema::empty_object());
    }

    #[test]
    fn self_referential_schema_terminates() {
        // TreeNode.children references TreeNode itself.
        let root = json!({
            "components": {"schemas": {"TreeNode": {
                "type": "object",
                "properties": {
                    "value": {"type": "integer"},
                    "children": {
                        "type": "array",
                        "items": {"$ref": "#/components/schemas/TreeNode"}
                    }
                }
            }}}
        });
        let raw = json!({"$ref": "#/components/schemas/TreeNode"});
        let schema = resolve(&raw, &root);
        // Must return (bounded), and the cycle point is a stub object.
        match &schema {
            Schema::Object { properties, .. } => {
                let children = properties.get("children").expect("children property");
                match children {
                    Schema::Array { items, .. } => {
                        assert_eq!(**items, Schema::empty_object());
                    }
                    other => panic!("expected array, got {other:?}"),
                }
            }
            other => panic!("expected object, got {other:?}"),
        }
        assert!(!schema.contains_ref());
    }

    #[test]
    fn ref_chain_capped_at_depth() {
        let root = json!({
            "a": {"$ref": "#/b"},
            "b": {"$ref": "#/c"},
            "c": {"$ref": "#/d"},
            "d": {"type": "string"}
        });
        // a -> b -> c hits the cap before d is reached.
        let schema = resolve(&json!({"$ref": "#/a"}), &root);
        assert_eq!(schema, Schema::empty_object());
    }

    #[test]
    fn diamond_refs_are_not_false_cycles() {
        // Two sibling properties referencing the same target must both expand.
        let root = json!({
            "components": {"schemas": {"Id": {"type": "integer"}}}
        });
        let raw = json!({
            "type": "object",
            "properties": {
                "first": {"$ref": "#/components/schemas/Id"},
                "second": {"$ref": "#/components/schemas/Id"}
            }
        });
        let schema = resolve(&raw, &json!(root));
        match schema {
            Schema::Object { properties, .. } => {
                assert!(matches!(properties["first"], Schema::Integer { .. }));
                assert!(matches!(properties["second"], Schema::Integer { .. }));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn all_of_merges_objects() {
        let raw = json!({
            "allOf": [
                {"type": "object", "properties": {"a": {"type": "integer"}}, "required": ["a"]},
                {"type": "object", "properties": {"b": {"type": "string"}}, "required": ["b"]}
            ]
        });
        let schema = resolve(&raw, &json!({}));
        match schema {
            Schema::Object {
                properties,
                required,
                ..
            } => {
                assert!(properties.contains_key("a"));
                assert!(properties.contains_key("b"));
                assert_eq!(required, vec!["a", "b"]);
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn any_of_picks_first_non_null() {
        let raw = json!({"anyOf": [{"type": "null"}, {"type": "string"}]});
        assert!(matches!(
            resolve(&raw, &json!({})),
            Schema::String { .. }
        ));
    }

    #[test]
    fn untyped_node_with_properties_is_object() {
        let raw = json!({"properties": {"x": {"type": "boolean"}}});
        match resolve(&raw, &json!({})) {
            Schema::Object { properties, .. } => {
                assert!(matches!(properties["x"], Schema::Boolean { .. }));
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_node_degrades() {
        assert_eq!(resolve(&json!(42), &json!({})), Schema::empty_object());
        assert_eq!(resolve(&json!({}), &json!({})), Schema::empty_object());
    }
}
