// Structured references: `{"PhoenixSSM": <locator>}` and
// `{"PhoenixS3Transform": <locator>}`
//
// A locator is either a literal string or `{"Ref": "<ParameterName>"}`, which
// is read from the invocation's template parameter values. Resolved nodes are
// replaced in place and never re-scanned; unresolved ones are left whole, and
// the walk never descends into a reference node either way.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::document::{rewrite_nodes, visit_nodes, Rewrite};
use crate::source::Parameters;
use crate::substitution::SubstitutionMap;

/// Parameter store reference tag
pub const SSM_TAG: &str = "PhoenixSSM";

/// Object store template transform tag
pub const S3_TRANSFORM_TAG: &str = "PhoenixS3Transform";

/// The locator of a reference node: an object whose only key is `tag`.
pub fn reference_locator<'a>(node: &'a Value, tag: &str) -> Option<&'a Value> {
    let map = node.as_object()?;
    if map.len() != 1 {
        return None;
    }
    map.get(tag)
}

/// Turn a locator into the string it designates.
pub fn resolve_locator(locator: &Value, parameters: &Parameters) -> Option<String> {
    match locator {
        Value::String(literal) => Some(literal.clone()),
        Value::Object(map) if map.len() == 1 => {
            let name = map.get("Ref")?.as_str()?;
            match parameters.get(name)? {
                Value::String(value) => Some(value.clone()),
                Value::Number(value) => Some(value.to_string()),
                Value::Bool(value) => Some(value.to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Replace every `PhoenixSSM` node whose locator is found in `map`. Nodes that
/// do not resolve stay as they are; the orphan check decides whether that
/// matters.
pub fn resolve_parameter_references(
    fragment: &mut Value,
    parameters: &Parameters,
    map: &SubstitutionMap,
) -> usize {
    let mut resolved = 0;
    rewrite_nodes(fragment, &mut |node| {
        let Some(locator) = reference_locator(node, SSM_TAG) else {
            return Rewrite::Descend;
        };
        let Some(path) = resolve_locator(locator, parameters) else {
            warn!(locator = %locator, "Unresolvable {} locator", SSM_TAG);
            return Rewrite::Skip;
        };
        match map.lookup_reference(&path) {
            Some(value) => {
                resolved += 1;
                Rewrite::Replace(Value::String(value.to_string()))
            }
            None => {
                debug!(path = %path, "No parameter for {} reference; leaving node", SSM_TAG);
                Rewrite::Skip
            }
        }
    });
    resolved
}

/// Names referenced by `PhoenixS3Transform` nodes, deduplicated, in walk
/// order. Mirrors [`splice_transforms`]: the walk stops at every reference
/// node.
pub fn collect_transform_names(fragment: &Value, parameters: &Parameters) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    visit_nodes(fragment, &mut |node| {
        let Some(locator) = reference_locator(node, S3_TRANSFORM_TAG) else {
            return true;
        };
        match resolve_locator(locator, parameters) {
            Some(name) if !names.contains(&name) => names.push(name),
            Some(_) => {}
            None => warn!(locator = %locator, "Unresolvable {} locator", S3_TRANSFORM_TAG),
        }
        false
    });
    names
}

/// Splice prefetched documents over their `PhoenixS3Transform` nodes.
pub fn splice_transforms(
    fragment: &mut Value,
    parameters: &Parameters,
    fetched: &HashMap<String, Value>,
) -> usize {
    let mut spliced = 0;
    rewrite_nodes(fragment, &mut |node| {
        let Some(locator) = reference_locator(node, S3_TRANSFORM_TAG) else {
            return Rewrite::Descend;
        };
        match resolve_locator(locator, parameters).and_then(|name| fetched.get(&name)) {
            Some(document) => {
                spliced += 1;
                Rewrite::Replace(document.clone())
            }
            None => Rewrite::Skip,
        }
    });
    spliced
}
