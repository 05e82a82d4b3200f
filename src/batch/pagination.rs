use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use url::Url;

use super::{Method, SubRequest};

/// Leading `/v<major>.<minor>/` version segment of an absolute graph URL.
static VERSION_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/v[\d.]+/").unwrap());

/// Scan a successful result for next-page cursors and push a continuation
/// sub-request into `out` for each one found.
///
/// The cursor for a list of records lives one structural level above the
/// records themselves, so callers pass the accumulation path minus its final
/// segment. With the path exhausted, the leaf check runs on each element of a
/// list node or on the node directly; otherwise lists are recursed into with
/// the same remaining path and objects are descended through the next
/// segment, falling back to the node itself when the key is absent. Scalars
/// end the scan on that branch.
pub fn collect_continuations(result: &Value, path: &[String], out: &mut Vec<SubRequest>) {
    if path.is_empty() {
        match result {
            Value::Array(items) => {
                for item in items {
                    check_pagination(item, out);
                }
            }
            _ => check_pagination(result, out),
        }
        return;
    }

    match result {
        Value::Array(items) => {
            for item in items {
                collect_continuations(item, path, out);
            }
        }
        Value::Object(map) => {
            let next = map.get(&path[0]).unwrap_or(result);
            collect_continuations(next, &path[1..], out);
        }
        _ => {}
    }
}

/// Turn a node's `paging.next` absolute URL into a relative continuation
/// request: drop the host and version prefix, drop the `access_token` query
/// parameter, keep the rest of the query string.
fn check_pagination(node: &Value, out: &mut Vec<SubRequest>) {
    let next = node
        .get("paging")
        .and_then(|paging| paging.get("next"))
        .and_then(Value::as_str);
    let Some(next) = next else {
        return;
    };
    let Ok(parsed) = Url::parse(next) else {
        return;
    };

    let path = VERSION_PREFIX.replace(parsed.path(), "").into_owned();

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in parsed.query_pairs() {
        if key != "access_token" {
            query.append_pair(&key, &value);
        }
    }

    out.push(SubRequest::new(
        Method::Get,
        format!("{}?{}", path, query.finish()),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scan(result: &Value, path: &[&str]) -> Vec<SubRequest> {
        let path: Vec<String> = path.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        collect_continuations(result, &path, &mut out);
        out
    }

    #[test]
    fn strips_host_version_prefix_and_access_token() {
        let result = json!({
            "paging": {"next": "https://host/v22.0/123/insights?since=1&access_token=SECRET"}
        });
        let out = scan(&result, &[]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].method, Method::Get);
        assert_eq!(out[0].relative_url, "123/insights?since=1");
    }

    #[test]
    fn scans_each_element_of_a_list_at_path_end() {
        let result = json!([
            {"paging": {"next": "https://host/v22.0/1/ads?after=a&access_token=S"}},
            {"other": true},
            {"paging": {"next": "https://host/v22.0/2/ads?after=b&access_token=S"}}
        ]);
        let out = scan(&result, &[]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].relative_url, "1/ads?after=a");
        assert_eq!(out[1].relative_url, "2/ads?after=b");
    }

    #[test]
    fn descends_path_segments_through_objects() {
        let result = json!({
            "campaigns": {
                "data": [{"id": "1"}],
                "paging": {"next": "https://host/v22.0/act_1/campaigns?after=x&access_token=S"}
            }
        });
        // Accumulation path is ["campaigns", "data"]; the scan runs one level up.
        let out = scan(&result, &["campaigns"]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].relative_url, "act_1/campaigns?after=x");
    }

    #[test]
    fn absent_key_falls_back_to_the_node_itself() {
        let result = json!({
            "paging": {"next": "https://host/v22.0/9/insights?after=y&access_token=S"}
        });
        let out = scan(&result, &["insights"]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].relative_url, "9/insights?after=y");
    }

    #[test]
    fn lists_recurse_with_the_same_remaining_path() {
        let result = json!([
            {"insights": {"paging": {"next": "https://host/v22.0/7/insights?after=z&access_token=S"}}}
        ]);
        let out = scan(&result, &["insights"]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].relative_url, "7/insights?after=z");
    }

    #[test]
    fn scalar_nodes_yield_nothing() {
        assert!(scan(&json!("leaf"), &[]).is_empty());
        assert!(scan(&json!(42), &["data"]).is_empty());
    }

    #[test]
    fn missing_paging_yields_nothing() {
        assert!(scan(&json!({"data": [1, 2, 3]}), &[]).is_empty());
    }

    #[test]
    fn unversioned_next_url_keeps_its_path() {
        let result = json!({"paging": {"next": "https://host/123/insights?since=1&access_token=S"}});
        let out = scan(&result, &[]);
        assert_eq!(out[0].relative_url, "/123/insights?since=1");
    }
}
