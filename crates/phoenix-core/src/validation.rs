// Orphan detection
//
// The check is textual: the fragment is serialized and searched for the
// sentinel prefix. A literal string that merely contains the sentinel is
// reported exactly like a token nobody resolved.

use serde_json::Value;

/// Distinct tokens starting with `sentinel`, in order of first appearance.
/// A token extends over the ASCII alphanumerics and underscores after the
/// sentinel.
pub fn find_orphans(fragment: &Value, sentinel: &str) -> Result<Vec<String>, serde_json::Error> {
    let rendered = serde_json::to_string(fragment)?;
    let mut orphans: Vec<String> = Vec::new();
    if sentinel.is_empty() {
        return Ok(orphans);
    }

    for (start, _) in rendered.match_indices(sentinel) {
        let tail = &rendered[start + sentinel.len()..];
        let tail_len = tail
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(tail.len());
        let token = &rendered[start..start + sentinel.len() + tail_len];
        if !orphans.iter().any(|seen| seen == token) {
            orphans.push(token.to_string());
        }
    }
    Ok(orphans)
}

/// Human-readable failure reason returned to CloudFormation.
pub fn orphan_report(orphans: &[String]) -> String {
    format!(
        "Unresolved macro token(s) in template: {}",
        orphans.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reports_each_token_once() {
        let doc = json!({
            "A": "PHX_MACRO_UNSET",
            "B": ["x-PHX_MACRO_DB_HOST-y", "PHX_MACRO_UNSET"],
        });
        assert_eq!(
            find_orphans(&doc, "PHX_MACRO_").unwrap(),
            vec!["PHX_MACRO_UNSET".to_string(), "PHX_MACRO_DB_HOST".to_string()]
        );
    }

    #[test]
    fn keys_are_checked_too() {
        let doc = json!({"PHX_MACRO_KEY": "value"});
        assert_eq!(find_orphans(&doc, "PHX_MACRO_").unwrap(), vec!["PHX_MACRO_KEY"]);
    }

    #[test]
    fn clean_fragment_has_no_orphans() {
        let doc = json!({"Resources": {"Bucket": {"Type": "AWS::S3::Bucket"}}});
        assert!(find_orphans(&doc, "PHX_MACRO_").unwrap().is_empty());
    }

    #[test]
    fn literal_text_containing_the_sentinel_is_indistinguishable() {
        // Known limitation: documentation strings mentioning the marker fail
        // validation the same way an unresolved token does.
        let doc = json!({"Description": "Tokens look like PHX_MACRO_<NAME>"});
        assert_eq!(find_orphans(&doc, "PHX_MACRO_").unwrap(), vec!["PHX_MACRO_"]);
    }

    #[test]
    fn report_lists_tokens() {
        let report = orphan_report(&["PHX_MACRO_A".to_string(), "PHX_MACRO_B".to_string()]);
        assert!(report.ends_with("PHX_MACRO_A, PHX_MACRO_B"));
    }
}
