use std::future::Future;
use std::time::Instant;

use tokio::time::Duration;
use tracing::{error, warn};

use crate::{Error, Result};

/// Configuration for the bounded-time retry loop.
///
/// The delay is fixed; there is no exponential backoff. The platform's own
/// item-level rate-limit signal is the backpressure mechanism, not this loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total wall-clock budget for one logical call, attempts included.
    pub time_budget: Duration,
    /// Pause between consecutive attempts.
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_millis(30_000),
            retry_delay: Duration::from_millis(1_000),
        }
    }
}

/// Execute one outbound call with a bounded-time retry loop.
///
/// The first success returns immediately. A client error (HTTP 4xx) fails at
/// once with the request context attached: retrying the same call cannot
/// succeed. Any other failure sleeps `retry_delay` and retries the produced
/// call verbatim until the budget is exhausted, then fails with a timeout
/// error carrying the elapsed time. This primitive has no knowledge of batch
/// semantics.
pub async fn persistent_request<F, Fut, T>(produce: F, policy: &RetryPolicy) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let mut last_err: Option<Error> = None;

    while start.elapsed() < policy.time_budget {
        match produce().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let elapsed = start.elapsed();
                let remaining = policy.time_budget.saturating_sub(elapsed);

                if err.is_client_error() {
                    error!(
                        elapsed_ms = elapsed.as_millis() as u64,
                        "request failed due to client error: {err}"
                    );
                    return Err(into_client_error(err, elapsed.as_millis()));
                }

                if remaining.is_zero() {
                    error!(
                        budget_ms = policy.time_budget.as_millis() as u64,
                        "request timed out: {err}"
                    );
                    return Err(into_timeout_error(err, elapsed.as_millis()));
                }

                warn!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    remaining_ms = remaining.as_millis() as u64,
                    retry_delay_ms = policy.retry_delay.as_millis() as u64,
                    "request attempt failed, retrying"
                );
                last_err = Some(err);
                tokio::time::sleep(policy.retry_delay).await;
            }
        }
    }

    match last_err {
        Some(err) => Err(into_timeout_error(err, start.elapsed().as_millis())),
        // Budget exhausted without ever attempting the call.
        None => Err(Error::Timeout {
            url: None,
            method: None,
            elapsed_ms: start.elapsed().as_millis(),
            response: None,
        }),
    }
}

fn into_client_error(err: Error, elapsed_ms: u128) -> Error {
    match err {
        Error::Remote {
            status,
            url,
            method,
            body,
        } => Error::Client {
            status,
            url,
            method,
            elapsed_ms,
            response: parse_snapshot(&body),
        },
        other => other,
    }
}

fn into_timeout_error(err: Error, elapsed_ms: u128) -> Error {
    match err {
        Error::Remote {
            url, method, body, ..
        } => Error::Timeout {
            url: Some(url),
            method: Some(method),
            elapsed_ms,
            response: Some(parse_snapshot(&body)),
        },
        Error::Transport(e) => Error::Timeout {
            url: e.url().map(|u| u.to_string()),
            method: None,
            elapsed_ms,
            response: None,
        },
        other => other,
    }
}

fn parse_snapshot(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_string()))
}
