// Depth-first walkers over CloudFormation fragments
//
// Every macro pass is built from these primitives. Fragments are plain
// `serde_json::Value` trees, so the walkers match on the variant instead of
// inspecting types at runtime.

use serde_json::Value;

/// Rewrite every string leaf in place. `rewrite` returns `Some(new)` to
/// replace the string. Object keys are never passed to `rewrite`.
///
/// Returns the number of strings that were replaced.
pub fn map_strings<F>(value: &mut Value, rewrite: &mut F) -> usize
where
    F: FnMut(&str) -> Option<String>,
{
    match value {
        Value::String(current) => match rewrite(current) {
            Some(replaced) => {
                *current = replaced;
                1
            }
            None => 0,
        },
        Value::Object(map) => map
            .values_mut()
            .map(|child| map_strings(child, rewrite))
            .sum(),
        Value::Array(items) => items
            .iter_mut()
            .map(|item| map_strings(item, rewrite))
            .sum(),
        _ => 0,
    }
}

/// Replace every occurrence of `old` with `new` in string leaves.
pub fn replace_literal(value: &mut Value, old: &str, new: &str) -> usize {
    if old.is_empty() {
        return 0;
    }
    map_strings(value, &mut |current| {
        current.contains(old).then(|| current.replace(old, new))
    })
}

/// Rename every object key containing `old`, replacing that substring with
/// `new`. Values are moved untouched. When a renamed key collides with a key
/// already present, the renamed entry overwrites it.
///
/// Returns the number of keys renamed.
pub fn rename_keys(value: &mut Value, old: &str, new: &str) -> usize {
    if old.is_empty() {
        return 0;
    }

    match value {
        Value::Object(map) => {
            let mut renamed = 0;
            if map.keys().any(|key| key.contains(old)) {
                // untouched keys first so a renamed key always overwrites
                let entries = std::mem::take(map);
                let mut moved = Vec::new();
                for (key, child) in entries {
                    if key.contains(old) {
                        moved.push((key.replace(old, new), child));
                    } else {
                        map.insert(key, child);
                    }
                }
                renamed = moved.len();
                for (key, child) in moved {
                    map.insert(key, child);
                }
            }
            renamed
                + map
                    .values_mut()
                    .map(|child| rename_keys(child, old, new))
                    .sum::<usize>()
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|item| rename_keys(item, old, new))
            .sum(),
        _ => 0,
    }
}

/// What [`rewrite_nodes`] does with the node it just offered.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// Keep the node and walk its children
    Descend,
    /// Keep the node and leave its subtree alone
    Skip,
    /// Swap the node out; the replacement is not visited
    Replace(Value),
}

/// Pre-order node rewrite driven by the [`Rewrite`] returned for each node.
pub fn rewrite_nodes<F>(value: &mut Value, rewrite: &mut F)
where
    F: FnMut(&Value) -> Rewrite,
{
    match rewrite(value) {
        Rewrite::Descend => {}
        Rewrite::Skip => return,
        Rewrite::Replace(replacement) => {
            *value = replacement;
            return;
        }
    }

    match value {
        Value::Object(map) => {
            for child in map.values_mut() {
                rewrite_nodes(child, rewrite);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                rewrite_nodes(item, rewrite);
            }
        }
        _ => {}
    }
}

/// Read-only pre-order walk. `visit` returns whether to descend into the
/// node's children.
pub fn visit_nodes<F>(value: &Value, visit: &mut F)
where
    F: FnMut(&Value) -> bool,
{
    if !visit(value) {
        return;
    }

    match value {
        Value::Object(map) => {
            for child in map.values() {
                visit_nodes(child, visit);
            }
        }
        Value::Array(items) => {
            for item in items {
                visit_nodes(item, visit);
            }
        }
        _ => {}
    }
}
