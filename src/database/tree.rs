//! JSON tree semantics shared by snapshots and the emulator.
//!
//! The store has no notion of `null` or empty containers: writing `null`
//! deletes a node, an object left without children disappears, and arrays
//! are stored as objects keyed by index.

use serde_json::Map;
use serde_json::Value;

use super::DbPath;

/// Strip `null` children and empty objects, turning arrays into
/// index-keyed objects. Returns `Value::Null` for a value that does not
/// exist in the tree.
pub fn normalize(value: Value) -> Value {
    match value {
        Value::Array(items) => {
            let map = items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect::<Map<String, Value>>();
            normalize(Value::Object(map))
        }
        Value::Object(map) => {
            let map: Map<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, normalize(v)))
                .filter(|(_, v)| !v.is_null())
                .collect();
            if map.is_empty() {
                Value::Null
            } else {
                Value::Object(map)
            }
        }
        other => other,
    }
}

/// Borrow the node at `path`, if it exists.
pub fn get_at<'a>(
    root: &'a Value,
    path: &DbPath,
) -> Option<&'a Value> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object()?.get(segment)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

/// Owned copy of the node at `path`, `Value::Null` when absent.
pub fn value_at(
    root: &Value,
    path: &DbPath,
) -> Value {
    get_at(root, path).cloned().unwrap_or(Value::Null)
}

/// Replace the node at `path` with `value`.
///
/// Intermediate primitives are replaced by objects; writing `null` removes
/// the node and prunes ancestors left empty.
pub fn set_at(
    root: &mut Value,
    path: &DbPath,
    value: Value,
) {
    set_in(root, path.segments(), normalize(value));
}

fn set_in(
    node: &mut Value,
    segments: &[String],
    value: Value,
) {
    let Some((head, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Map::new());
    }

    let now_empty = match node {
        Value::Object(map) => {
            let child = map.entry(head.clone()).or_insert(Value::Null);
            set_in(child, rest, value);
            if child.is_null() {
                map.remove(head);
            }
            map.is_empty()
        }
        _ => false,
    };

    if now_empty {
        *node = Value::Null;
    }
}
