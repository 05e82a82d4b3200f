use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::batch::{BatchItemResult, SubRequest};
use crate::context::GraphContext;
use crate::transport::retry::{persistent_request, RetryPolicy};
use crate::{Error, Result};

/// Wire envelope for one physical batch call.
#[derive(Debug, Serialize)]
struct BatchEnvelope<'a> {
    batch: &'a [SubRequest],
    access_token: &'a str,
}

/// Seam between the orchestration loop and the network. The executor only
/// ever sees positionally-aligned item results.
#[async_trait]
pub trait BatchTransport: Send + Sync {
    /// Execute one physical batch call. The returned results are aligned
    /// with `batch` by position.
    async fn execute_batch(&self, batch: &[SubRequest]) -> Result<Vec<BatchItemResult>>;
}

/// HTTP transport posting `{batch, access_token}` to the batch endpoint,
/// wrapped in the bounded-time retry loop.
pub struct HttpTransport {
    client: reqwest::Client,
    batch_url: String,
    access_token: String,
    retry: RetryPolicy,
}

impl HttpTransport {
    pub fn new(context: &GraphContext) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(Error::Transport)?;

        Ok(Self {
            client,
            batch_url: context.base_url().to_string(),
            access_token: context.access_token().to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the default retry policy (30 s budget, 1 s delay).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn post_batch_once(&self, batch: &[SubRequest]) -> Result<Vec<BatchItemResult>> {
        let envelope = BatchEnvelope {
            batch,
            access_token: &self.access_token,
        };

        let response = self
            .client
            .post(&self.batch_url)
            .json(&envelope)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote {
                status: status.as_u16(),
                url: self.batch_url.clone(),
                method: "POST".to_string(),
                body,
            });
        }

        response
            .json::<Vec<BatchItemResult>>()
            .await
            .map_err(Error::Transport)
    }
}

#[async_trait]
impl BatchTransport for HttpTransport {
    async fn execute_batch(&self, batch: &[SubRequest]) -> Result<Vec<BatchItemResult>> {
        persistent_request(|| self.post_batch_once(batch), &self.retry).await
    }
}
