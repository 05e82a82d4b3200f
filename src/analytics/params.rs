use serde_json::json;

use crate::context::GraphContext;

/// Assemble `prefix?k=v&…` from ordered params.
///
/// Values are joined verbatim, without percent-encoding: the batch endpoint
/// accepts the JSON-bearing `time_range` and `filtering` values as-is.
pub fn build_relative_url(prefix: &str, params: &[(String, String)]) -> String {
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}?{}", prefix, query)
}

/// Query params shared by every hierarchy fetch: page size and the
/// context's reporting window.
pub fn common_params(context: &GraphContext) -> Vec<(String, String)> {
    let time_range = json!({
        "since": context.date_start(),
        "until": context.date_end(),
    })
    .to_string();

    vec![
        ("limit".to_string(), "200".to_string()),
        ("time_range".to_string(), time_range),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_params_in_order_without_encoding() {
        let params = vec![
            ("limit".to_string(), "200".to_string()),
            (
                "time_range".to_string(),
                r#"{"since":"2026-01-01","until":"2026-01-31"}"#.to_string(),
            ),
        ];
        assert_eq!(
            build_relative_url("act_1", &params),
            r#"act_1?limit=200&time_range={"since":"2026-01-01","until":"2026-01-31"}"#
        );
    }

    #[test]
    fn empty_params_yield_bare_question_mark() {
        assert_eq!(build_relative_url("123/insights", &[]), "123/insights?");
    }

    #[test]
    fn common_params_carry_the_reporting_window() {
        let context = GraphContext::builder()
            .access_token("t")
            .account_id("act_1")
            .date_start("2026-01-01")
            .date_end("2026-01-31")
            .breakdowns(vec![])
            .build()
            .unwrap();
        let params = common_params(&context);
        assert_eq!(params[0], ("limit".to_string(), "200".to_string()));
        assert!(params[1].1.contains(r#""since":"2026-01-01""#));
        assert!(params[1].1.contains(r#""until":"2026-01-31""#));
    }
}
