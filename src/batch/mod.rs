//! # Batch Orchestration Module
//!
//! This module implements the core of the crate: packing logical
//! sub-requests into fixed-size physical batches, classifying per-item
//! results, discovering pagination continuations, and aggregating extracted
//! data across concurrent rounds.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`BatchQueue`] | Pending sub-requests, re-chunked into batches of 50 |
//! | [`classify`] / [`ItemOutcome`] | Per-item success / retry / unsolvable disposition |
//! | [`collect_continuations`] | Recursive `paging.next` discovery |
//! | [`Aggregate`] / [`accumulate`] | Path-based extraction into a list or keyed map |
//! | [`BatchExecutor`] | Drains rounds, fans batches out, re-queues retries and continuations |
//!
//! ## Flow
//!
//! Seed the queue, then loop: drain every queued batch, execute them
//! concurrently against the batch endpoint, classify each positional item,
//! merge successes into the aggregate, split rate-limited items in two and
//! reprocess, append discovered continuations for the next round. The run
//! finishes when the queue stays empty.

mod accumulate;
mod classify;
mod executor;
mod pagination;
mod queue;

pub use accumulate::{accumulate, Aggregate};
pub use classify::{classify, BatchItemResult, ItemOutcome, RATE_LIMIT_CODE};
pub use executor::{AggregateShape, BatchExecutor};
pub use pagination::collect_continuations;
pub use queue::BatchQueue;

use serde::{Deserialize, Serialize};

/// Maximum number of sub-requests packed into one physical batch call.
pub const MAX_BATCH_SIZE: usize = 50;

/// HTTP method of a sub-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// One logical operation packed into a physical batch call. Immutable once
/// created; the relative URL is resolved against the endpoint base and
/// credential by the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRequest {
    pub method: Method,
    pub relative_url: String,
}

impl SubRequest {
    pub fn new(method: Method, relative_url: impl Into<String>) -> Self {
        Self {
            method,
            relative_url: relative_url.into(),
        }
    }

    /// Resource id of this sub-request: the first `/`-delimited segment of
    /// its relative URL. Used as the key in keyed aggregation.
    pub(crate) fn resource_id(&self) -> &str {
        self.relative_url.split('/').next().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_request_serializes_with_wire_field_names() {
        let request = SubRequest::new(Method::Get, "123/insights?limit=200");
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({"method": "GET", "relative_url": "123/insights?limit=200"})
        );
    }

    #[test]
    fn resource_id_is_first_path_segment() {
        let request = SubRequest::new(Method::Get, "123/insights?since=1");
        assert_eq!(request.resource_id(), "123");
    }
}
