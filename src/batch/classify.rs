use serde::Deserialize;
use serde_json::Value;

use super::SubRequest;
use crate::error::UnsolvableItem;
use crate::Result;

/// Platform error code for a transient throttling condition. Items failing
/// with this code are retried by splitting, distinct from permanent errors.
pub const RATE_LIMIT_CODE: i64 = 960;

/// One positional result of a physical batch call. The remote endpoint
/// returns these in the same order as the submitted sub-requests.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchItemResult {
    pub code: u16,
    pub body: String,
}

/// Disposition of one batch item after inspecting its status and body.
#[derive(Debug)]
pub enum ItemOutcome {
    /// HTTP 200: parsed body, ready for pagination scan and accumulation.
    Success(Value),
    /// Rate-limited: resubmit the original sub-request in a split batch.
    Retryable(SubRequest),
    /// Any other item-level error: terminal for the batch it came from.
    Unsolvable(UnsolvableItem),
}

/// Classify one item result against its originating sub-request.
pub fn classify(item: &BatchItemResult, original: &SubRequest) -> Result<ItemOutcome> {
    let parsed: Value = serde_json::from_str(&item.body)?;
    if item.code == 200 {
        return Ok(ItemOutcome::Success(parsed));
    }

    let error_code = parsed
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(Value::as_i64);
    if error_code == Some(RATE_LIMIT_CODE) {
        Ok(ItemOutcome::Retryable(original.clone()))
    } else {
        Ok(ItemOutcome::Unsolvable(UnsolvableItem {
            request: original.clone(),
            response: parsed,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Method;

    fn original() -> SubRequest {
        SubRequest::new(Method::Get, "123/insights?limit=200")
    }

    fn item(code: u16, body: &str) -> BatchItemResult {
        BatchItemResult {
            code,
            body: body.to_string(),
        }
    }

    #[test]
    fn two_hundred_parses_into_success() {
        let outcome = classify(&item(200, r#"{"data":[1,2]}"#), &original()).unwrap();
        match outcome {
            ItemOutcome::Success(body) => {
                assert_eq!(body, serde_json::json!({"data": [1, 2]}));
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[test]
    fn rate_limit_code_is_retryable() {
        let body = r#"{"error":{"code":960,"message":"request limit reached"}}"#;
        let outcome = classify(&item(400, body), &original()).unwrap();
        match outcome {
            ItemOutcome::Retryable(request) => assert_eq!(request, original()),
            other => panic!("expected retryable, got {:?}", other),
        }
    }

    #[test]
    fn other_error_codes_are_unsolvable() {
        let body = r#"{"error":{"code":100,"message":"unknown field"}}"#;
        let outcome = classify(&item(400, body), &original()).unwrap();
        match outcome {
            ItemOutcome::Unsolvable(unsolvable) => {
                assert_eq!(unsolvable.request, original());
                assert_eq!(
                    unsolvable.response.pointer("/error/code"),
                    Some(&serde_json::json!(100))
                );
            }
            other => panic!("expected unsolvable, got {:?}", other),
        }
    }

    #[test]
    fn error_body_without_code_is_unsolvable() {
        let outcome = classify(&item(500, r#"{"message":"boom"}"#), &original()).unwrap();
        assert!(matches!(outcome, ItemOutcome::Unsolvable(_)));
    }

    #[test]
    fn malformed_body_propagates_parse_error() {
        assert!(classify(&item(200, "not json"), &original()).is_err());
    }
}
