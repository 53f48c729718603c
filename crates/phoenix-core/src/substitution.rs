// Substitution map: macro token -> replacement value
//
// Tokens are derived from parameter store names (`/shop/db/db-host` becomes
// `PHX_MACRO_DB_HOST`). Literal substitution tries the longest token first so
// `PHX_MACRO_DB` never eats the front of `PHX_MACRO_DB_HOST`; equal lengths
// keep insertion order.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::document::map_strings;
use crate::source::{ParameterKind, StoredParameter};

const REDACTED: &str = "****";

/// Token for a stored parameter name: the last path segment, uppercased, with
/// every non-alphanumeric character turned into `_`.
pub fn token_for(prefix: &str, name: &str) -> String {
    let short = name.rsplit('/').next().unwrap_or(name);
    let normalized: String = short
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}", prefix, normalized)
}

#[derive(Debug, Clone, Default)]
pub struct SubstitutionMap {
    entries: Vec<(String, String)>,
    positions: HashMap<String, usize>,
    /// Full and namespace-relative parameter names, for structured references
    paths: HashMap<String, String>,
    secrets: HashSet<String>,
}

impl SubstitutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a token. Overwriting keeps the original position,
    /// so tie-breaking between equal-length tokens stays stable.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        let value = value.into();
        match self.positions.get(&token) {
            Some(&index) => self.entries[index].1 = value,
            None => {
                self.positions.insert(token.clone(), self.entries.len());
                self.entries.push((token, value));
            }
        }
    }

    /// Add a parameter store entry under its derived token. The full name and
    /// the name relative to `namespace` both become reference paths.
    pub fn insert_parameter(&mut self, prefix: &str, namespace: &str, parameter: StoredParameter) {
        let token = token_for(prefix, &parameter.name);
        if token.len() == prefix.len() {
            tracing::warn!(name = %parameter.name, "Skipping parameter with an empty short name");
            return;
        }

        if parameter.kind == ParameterKind::Secret {
            self.secrets.insert(token.clone());
        } else {
            // a later plain value replaces an earlier secret one
            self.secrets.remove(&token);
        }

        if let Some(relative) = parameter.name.strip_prefix(namespace) {
            if !relative.is_empty() {
                self.paths
                    .insert(relative.to_string(), parameter.value.clone());
            }
        }
        self.paths
            .insert(parameter.name.clone(), parameter.value.clone());
        self.insert(token, parameter.value);
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.positions
            .get(token)
            .map(|&index| self.entries[index].1.as_str())
    }

    /// Resolve a structured-reference locator: parameter paths first, then
    /// tokens.
    pub fn lookup_reference(&self, locator: &str) -> Option<&str> {
        self.paths
            .get(locator)
            .map(String::as_str)
            .or_else(|| self.get(locator))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn secret_count(&self) -> usize {
        self.secrets.len()
    }

    /// Tokens longest first; `sort_by` is stable so ties keep insertion order.
    pub fn ordered_tokens(&self) -> Vec<(&str, &str)> {
        let mut ordered: Vec<(&str, &str)> = self
            .entries
            .iter()
            .map(|(token, value)| (token.as_str(), value.as_str()))
            .collect();
        ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        ordered
    }

    /// Token/value pairs safe to log.
    pub fn redacted(&self) -> Vec<(&str, &str)> {
        self.entries
            .iter()
            .map(|(token, value)| {
                if self.secrets.contains(token) {
                    (token.as_str(), REDACTED)
                } else {
                    (token.as_str(), value.as_str())
                }
            })
            .collect()
    }
}

/// Apply ordered tokens to one string. `None` when nothing matched.
///
/// Each token is applied to the output of the ones before it, so a value that
/// itself contains a later (shorter) token is expanded again. Values are
/// assumed not to contain tokens.
pub fn substitute_str(input: &str, ordered: &[(&str, &str)]) -> Option<String> {
    let mut output: Option<String> = None;
    for (token, value) in ordered {
        let current = output.as_deref().unwrap_or(input);
        if current.contains(token) {
            output = Some(current.replace(token, value));
        }
    }
    output
}

/// Literal value substitution over every string leaf. Keys are untouched.
pub fn substitute_literals(fragment: &mut Value, map: &SubstitutionMap) -> usize {
    if map.is_empty() {
        return 0;
    }
    let ordered = map.ordered_tokens();
    map_strings(fragment, &mut |current| substitute_str(current, &ordered))
}

/// Keep only process environment variables that are themselves tokens
/// (`PHX_MACRO_FOO=bar`), in a stable order.
pub fn env_tokens<I>(vars: I, prefix: &str) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut tokens: Vec<(String, String)> = vars
        .into_iter()
        .filter(|(name, _)| name.starts_with(prefix) && name.len() > prefix.len())
        .collect();
    tokens.sort();
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_normalization() {
        assert_eq!(token_for("PHX_MACRO_", "a/b/c/some-key"), "PHX_MACRO_SOME_KEY");
        assert_eq!(token_for("PHX_MACRO_", "/shop/db.port"), "PHX_MACRO_DB_PORT");
        assert_eq!(token_for("PHX_MACRO_", "flat"), "PHX_MACRO_FLAT");
    }

    #[test]
    fn longest_token_wins() {
        let mut map = SubstitutionMap::new();
        map.insert("FOO", "1");
        map.insert("FOOBAR", "2");

        let mut doc = json!("FOOBAR_BAZ");
        substitute_literals(&mut doc, &map);
        assert_eq!(doc, json!("2_BAZ"));
    }

    #[test]
    fn values_are_chained_through_later_tokens() {
        let ordered = [("FOOBAR", "xFOO"), ("FOO", "1")];
        assert_eq!(substitute_str("FOOBAR", &ordered), Some("x1".to_string()));
        assert_eq!(substitute_str("BAZ", &ordered), None);
    }

    #[test]
    fn equal_length_tokens_keep_insertion_order() {
        let mut map = SubstitutionMap::new();
        map.insert("AB", "x");
        map.insert("BC", "y");
        // "ABC": AB is tried first, leaving "xC" where BC no longer matches
        assert_eq!(substitute_str("ABC", &map.ordered_tokens()), Some("xC".into()));

        let mut reversed = SubstitutionMap::new();
        reversed.insert("BC", "y");
        reversed.insert("AB", "x");
        assert_eq!(
            substitute_str("ABC", &reversed.ordered_tokens()),
            Some("Ay".into())
        );
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut map = SubstitutionMap::new();
        map.insert("AB", "x");
        map.insert("BC", "y");
        map.insert("AB", "z");
        assert_eq!(map.len(), 2);
        assert_eq!(map.ordered_tokens(), vec![("AB", "z"), ("BC", "y")]);
    }

    #[test]
    fn substitution_is_idempotent_once_applied() {
        let mut map = SubstitutionMap::new();
        map.insert("PHX_MACRO_DB_HOST", "db.internal");
        map.insert("PHX_MACRO_DB", "orders");
        map.insert("PHX_MACRO_PROJECT_NAME", "shop");

        let mut doc = json!({
            "Name": "PHX_MACRO_PROJECT_NAME-PHX_MACRO_DB",
            "Hosts": ["PHX_MACRO_DB_HOST", "static"],
        });
        substitute_literals(&mut doc, &map);
        let once = doc.clone();
        assert_eq!(substitute_literals(&mut doc, &map), 0);
        assert_eq!(doc, once);
        assert_eq!(once["Name"], "shop-orders");
        assert_eq!(once["Hosts"][0], "db.internal");
    }

    #[test]
    fn parameters_index_tokens_and_paths() {
        let mut map = SubstitutionMap::new();
        map.insert_parameter(
            "PHX_MACRO_",
            "/shop/",
            StoredParameter::plain("/shop/config/api-url", "https://api"),
        );
        map.insert_parameter(
            "PHX_MACRO_",
            "/shop/",
            StoredParameter::secret("/shop/db-password", "hunter2"),
        );

        assert_eq!(map.get("PHX_MACRO_API_URL"), Some("https://api"));
        assert_eq!(map.lookup_reference("/shop/config/api-url"), Some("https://api"));
        assert_eq!(map.lookup_reference("config/api-url"), Some("https://api"));
        assert_eq!(map.lookup_reference("PHX_MACRO_DB_PASSWORD"), Some("hunter2"));
        assert_eq!(map.lookup_reference("missing"), None);

        assert_eq!(map.secret_count(), 1);
        let redacted = map.redacted();
        assert!(redacted.contains(&("PHX_MACRO_DB_PASSWORD", "****")));
        assert!(redacted.contains(&("PHX_MACRO_API_URL", "https://api")));
    }

    #[test]
    fn trailing_slash_names_are_skipped() {
        let mut map = SubstitutionMap::new();
        map.insert_parameter("PHX_MACRO_", "/shop/", StoredParameter::plain("/shop/dir/", "x"));
        assert!(map.is_empty());
    }

    #[test]
    fn env_tokens_filters_by_prefix() {
        let vars = vec![
            ("PHX_MACRO_B".to_string(), "2".to_string()),
            ("PATH".to_string(), "/bin".to_string()),
            ("PHX_MACRO_".to_string(), "bare".to_string()),
            ("PHX_MACRO_A".to_string(), "1".to_string()),
        ];
        assert_eq!(
            env_tokens(vars, "PHX_MACRO_"),
            vec![
                ("PHX_MACRO_A".to_string(), "1".to_string()),
                ("PHX_MACRO_B".to_string(), "2".to_string()),
            ]
        );
    }
}
